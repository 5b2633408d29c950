//! Dialect for peers still sending snake_case field names.
//!
//! Inbound inbox items and fetched authors are rewritten to the camelCase
//! names the rest of the node expects. Nested `author`, `actor` and `object`
//! objects are rewritten too.

use serde_json::{Map, Value};
use socialdist_db::entities::node;

use super::NodeAdapter;

/// Legacy name to canonical name.
const RENAMES: &[(&str, &str)] = &[
    ("content_type", "contentType"),
    ("display_name", "displayName"),
    ("profile_image", "profileImage"),
    ("github_url", "github"),
];

const NESTED: &[&str] = &["author", "actor", "object"];

#[derive(Debug, Clone, Copy, Default)]
pub struct LegacyFieldsAdapter;

fn rename_fields(map: &mut Map<String, Value>) {
    for (legacy, canonical) in RENAMES {
        if map.contains_key(*canonical) {
            continue;
        }
        if let Some(value) = map.remove(*legacy) {
            map.insert((*canonical).to_string(), value);
        }
    }
}

fn rewrite(mut payload: Value) -> Value {
    if let Value::Object(map) = &mut payload {
        rename_fields(map);
        for key in NESTED {
            if let Some(Value::Object(nested)) = map.get_mut(*key) {
                rename_fields(nested);
            }
        }
    }
    payload
}

impl NodeAdapter for LegacyFieldsAdapter {
    fn name(&self) -> &'static str {
        "legacy_fields"
    }

    fn shape_author_response(&self, _node: &node::Model, body: Value) -> Option<Value> {
        Some(rewrite(body))
    }

    fn post_inbox_item(&self, _node: &node::Model, payload: Value) -> Value {
        rewrite(payload)
    }
}
