//! Dialect that refuses authors claiming to live somewhere else.
//!
//! A peer answering for an author whose `id` or `host` points at a different
//! server is either misconfigured or spoofing. Such authors are rejected
//! (single fetch) or dropped (lists).

use serde_json::Value;
use socialdist_db::entities::node;
use tracing::warn;
use url::Url;

use super::NodeAdapter;

#[derive(Debug, Clone, Copy, Default)]
pub struct StrictHostAdapter;

/// Host component of a URL-ish string, lower-cased.
fn host_of(value: &str) -> Option<String> {
    Url::parse(value)
        .ok()
        .and_then(|url| url.host_str().map(str::to_ascii_lowercase))
}

impl NodeAdapter for StrictHostAdapter {
    fn name(&self) -> &'static str {
        "strict_host"
    }

    fn shape_author_response(&self, node: &node::Model, body: Value) -> Option<Value> {
        let expected = host_of(&node.host)?;

        let id_host = body.get("id").and_then(Value::as_str).and_then(host_of);
        let declared_host = body.get("host").and_then(Value::as_str).and_then(host_of);

        if id_host.as_deref() == Some(expected.as_str())
            && declared_host.as_deref() == Some(expected.as_str())
        {
            Some(body)
        } else {
            warn!(
                node = %node.host,
                id_host = ?id_host,
                declared_host = ?declared_host,
                "Rejected author whose identity does not match the peer host"
            );
            None
        }
    }
}
