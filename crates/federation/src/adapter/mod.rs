//! Per-peer REST dialects.
//!
//! Every registered node names an adapter tag. The adapter builds the URLs
//! for that peer, shapes (filters or rejects) what it sends back, and gets a
//! chance to rewrite items the peer pushes into our inboxes. Peer quirks are
//! handled by adding a variant, never by branching on the peer inside the
//! resolution protocol.

mod default;
mod legacy_fields;
mod no_trailing_slash;
mod registry;
mod strict_host;

pub use default::DefaultAdapter;
pub use legacy_fields::LegacyFieldsAdapter;
pub use no_trailing_slash::NoTrailingSlashAdapter;
pub use registry::AdapterRegistry;
pub use strict_host::StrictHostAdapter;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;
use socialdist_common::canonicalize;
use socialdist_db::entities::node;
use uuid::Uuid;

use crate::transport::{Credentials, PeerRequest, PeerResponse, PeerTransport, TransportError};

/// A peer dialect.
///
/// URL builders and shaping hooks are synchronous and pure. The `fetch_*`
/// and `send_*` operations have default implementations on top of them, so
/// most variants only override a builder or a hook. Adapters never retry.
#[async_trait]
pub trait NodeAdapter: Send + Sync {
    /// Registry tag.
    fn name(&self) -> &'static str;

    /// Whether endpoint URLs end with `/`.
    fn trailing_slash(&self) -> bool {
        true
    }

    /// `{host}/{prefix}/{path}` with the dialect's trailing slash rule.
    fn endpoint(&self, node: &node::Model, path: &str) -> String {
        let host = node.host.trim_end_matches('/');
        let prefix = node.prefix.trim_matches('/');
        let mut url = if prefix.is_empty() {
            format!("{host}/{path}")
        } else {
            format!("{host}/{prefix}/{path}")
        };
        if self.trailing_slash() {
            url.push('/');
        }
        url
    }

    fn authors_url(&self, node: &node::Model) -> String {
        self.endpoint(node, "authors")
    }

    fn author_url(&self, node: &node::Model, author: Uuid) -> String {
        self.endpoint(node, &format!("author/{}", canonicalize(&author.to_string())))
    }

    fn followers_url(&self, node: &node::Model, author: Uuid) -> String {
        self.endpoint(
            node,
            &format!("author/{}/followers", canonicalize(&author.to_string())),
        )
    }

    fn follower_url(&self, node: &node::Model, author: Uuid, follower: Uuid) -> String {
        self.endpoint(
            node,
            &format!(
                "author/{}/followers/{}",
                canonicalize(&author.to_string()),
                canonicalize(&follower.to_string())
            ),
        )
    }

    fn inbox_url(&self, node: &node::Model, author: Uuid) -> String {
        self.endpoint(
            node,
            &format!("author/{}/inbox", canonicalize(&author.to_string())),
        )
    }

    /// Credentials we present to this peer.
    fn credentials(&self, node: &node::Model) -> Credentials {
        Credentials {
            username: node.node_username.clone(),
            password: node.node_password.clone(),
        }
    }

    /// Normalize one author payload. `None` rejects it.
    fn shape_author_response(&self, _node: &node::Model, body: Value) -> Option<Value> {
        Some(body)
    }

    /// Normalize an author list payload into its accepted items.
    ///
    /// Accepts both `{ "items": [...] }` and a bare array.
    fn shape_authors_response(&self, node: &node::Model, body: Value) -> Vec<Value> {
        list_items(body)
            .into_iter()
            .filter_map(|author| self.shape_author_response(node, author))
            .collect()
    }

    /// Rewrite an item this peer pushed into one of our inboxes, before
    /// validation.
    fn post_inbox_item(&self, _node: &node::Model, payload: Value) -> Value {
        payload
    }

    /// Fetch and shape a single author. `Ok(None)` means shaping rejected it.
    async fn fetch_author(
        &self,
        transport: &dyn PeerTransport,
        node: &node::Model,
        author: Uuid,
    ) -> Result<Option<Value>, TransportError> {
        let request = PeerRequest::new(Method::GET, self.author_url(node, author))
            .with_credentials(self.credentials(node));
        let response = transport.send(request).await?;
        Ok(self.shape_author_response(node, response.body))
    }

    /// Fetch and shape every author the peer lists.
    async fn fetch_authors(
        &self,
        transport: &dyn PeerTransport,
        node: &node::Model,
    ) -> Result<Vec<Value>, TransportError> {
        let request = PeerRequest::new(Method::GET, self.authors_url(node))
            .with_credentials(self.credentials(node));
        let response = transport.send(request).await?;
        Ok(self.shape_authors_response(node, response.body))
    }

    /// Fetch the follower list of a remote author.
    async fn fetch_followers(
        &self,
        transport: &dyn PeerTransport,
        node: &node::Model,
        author: Uuid,
    ) -> Result<Vec<Value>, TransportError> {
        let request = PeerRequest::new(Method::GET, self.followers_url(node, author))
            .with_credentials(self.credentials(node));
        let response = transport.send(request).await?;
        Ok(list_items(response.body))
    }

    /// Push an object into a remote author's inbox.
    async fn send_inbox_item(
        &self,
        transport: &dyn PeerTransport,
        node: &node::Model,
        author: Uuid,
        payload: &Value,
    ) -> Result<PeerResponse, TransportError> {
        let request = PeerRequest::new(Method::POST, self.inbox_url(node, author))
            .with_credentials(self.credentials(node))
            .with_body(payload.clone());
        transport.send(request).await
    }

    /// Ask the peer to drop `follower` from `author`'s followers.
    async fn remove_follower(
        &self,
        transport: &dyn PeerTransport,
        node: &node::Model,
        author: Uuid,
        follower: Uuid,
    ) -> Result<PeerResponse, TransportError> {
        let request = PeerRequest::new(Method::DELETE, self.follower_url(node, author, follower))
            .with_credentials(self.credentials(node));
        transport.send(request).await
    }
}

/// The `items` of a list payload, or the payload itself if it is an array.
fn list_items(body: Value) -> Vec<Value> {
    match body {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("items") {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    pub(crate) fn test_node(host: &str, adapter: &str) -> node::Model {
        node::Model {
            id: "n1".to_string(),
            host: host.to_string(),
            display_name: None,
            prefix: "service".to_string(),
            auth_username: "peer".to_string(),
            auth_password: "peer-secret".to_string(),
            node_username: "us".to_string(),
            node_password: "us-secret".to_string(),
            adapter: adapter.to_string(),
            created_at: Utc::now().into(),
        }
    }

    #[test]
    fn test_list_items_shapes() {
        assert_eq!(list_items(json!({ "type": "authors", "items": [1, 2] })).len(), 2);
        assert_eq!(list_items(json!([1])).len(), 1);
        assert!(list_items(json!({ "type": "authors" })).is_empty());
        assert!(list_items(Value::Null).is_empty());
    }

    #[test]
    fn test_endpoint_without_prefix() {
        let mut node = test_node("https://peer.example/", "default");
        node.prefix = String::new();
        assert_eq!(
            DefaultAdapter.endpoint(&node, "authors"),
            "https://peer.example/authors/"
        );
    }
}
