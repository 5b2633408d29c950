//! Remote resolution protocol.
//!
//! Given a UUID, find the peer that hosts it: ask the cached peer first, then
//! every registered peer in registry order, one after another. The first
//! peer that answers is cached. An object nobody answers for is a soft
//! `None`, never an error.
//!
//! Lookups (authors, follower lists) treat any failure of the cached peer as
//! a miss and fall through to the broadcast, evicting the entry when the
//! peer answered 404. Deliveries (inbox pushes, follower removal) surface a
//! failure of the cached peer as [`AppError::Federation`], since the
//! responsible peer is known; a 404 on follower removal counts as done.
//! During a broadcast every failure is a miss.

use std::sync::Arc;

use sea_orm::DatabaseConnection;
use serde_json::Value;
use socialdist_common::{AppError, AppResult, extract_author_uuid, parse_uuid};
use socialdist_db::{entities::node, repositories::NodeRepository};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    adapter::{AdapterRegistry, NodeAdapter},
    cache::RemoteLocationCache,
    transport::{PeerResponse, PeerTransport, TransportError},
};

/// What a lookup asks each peer for.
#[derive(Debug, Clone, Copy)]
enum Lookup {
    Author,
    Followers,
}

/// What a delivery sends to the hosting peer.
#[derive(Debug, Clone, Copy)]
enum Delivery<'a> {
    Inbox(&'a Value),
    RemoveFollower(Uuid),
}

/// Locates and talks to remote objects.
#[derive(Clone)]
pub struct RemoteResolver {
    nodes: NodeRepository,
    cache: RemoteLocationCache,
    registry: Arc<AdapterRegistry>,
    transport: Arc<dyn PeerTransport>,
    enabled: bool,
}

impl RemoteResolver {
    #[must_use]
    pub fn new(
        db: Arc<DatabaseConnection>,
        registry: Arc<AdapterRegistry>,
        transport: Arc<dyn PeerTransport>,
    ) -> Self {
        Self {
            nodes: NodeRepository::new(db.clone()),
            cache: RemoteLocationCache::new(db),
            registry,
            transport,
            enabled: true,
        }
    }

    /// Turn every outbound call into a soft miss.
    #[must_use]
    pub const fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// The location cache this resolver reads and writes.
    #[must_use]
    pub const fn cache(&self) -> &RemoteLocationCache {
        &self.cache
    }

    /// The adapter registry nodes are resolved against.
    #[must_use]
    pub fn registry(&self) -> &AdapterRegistry {
        &self.registry
    }

    fn adapter_for(&self, node: &node::Model) -> Arc<dyn NodeAdapter> {
        self.registry.resolve(&node.adapter)
    }

    /// Fetch a remote author. `None` when no reachable peer has it.
    pub async fn resolve_author(&self, uuid: Uuid) -> AppResult<Option<Value>> {
        self.locate(uuid, Lookup::Author).await
    }

    /// Whether `remote_uuid`'s own follower list contains `local_author`.
    pub async fn approved_follow(&self, remote_uuid: Uuid, local_author: Uuid) -> AppResult<bool> {
        let Some(Value::Array(followers)) = self.locate(remote_uuid, Lookup::Followers).await?
        else {
            return Ok(false);
        };

        let approved = followers.iter().any(|follower| {
            follower
                .get("id")
                .and_then(Value::as_str)
                .and_then(|id| extract_author_uuid(id).or_else(|| parse_uuid(id)))
                == Some(local_author)
        });

        debug!(
            remote = %remote_uuid,
            local = %local_author,
            approved,
            "Checked remote follower list"
        );
        Ok(approved)
    }

    /// Every author a single peer lists, shaped by its adapter.
    pub async fn get_all_authors(&self, node: &node::Model) -> AppResult<Vec<Value>> {
        if !self.enabled {
            return Ok(Vec::new());
        }
        self.adapter_for(node)
            .fetch_authors(self.transport.as_ref(), node)
            .await
            .map_err(AppError::from)
    }

    /// Push an object into a remote author's inbox.
    pub async fn deliver_to_inbox(
        &self,
        target: Uuid,
        payload: &Value,
    ) -> AppResult<Option<PeerResponse>> {
        self.deliver(target, Delivery::Inbox(payload)).await
    }

    /// Deliver a follow request to a remote author's inbox.
    pub async fn send_friend_request(
        &self,
        target: Uuid,
        follow_payload: &Value,
    ) -> AppResult<Option<PeerResponse>> {
        self.deliver_to_inbox(target, follow_payload).await
    }

    /// Ask the peer hosting `remote_author` to drop `local_author` from its
    /// followers.
    pub async fn remove_follower(
        &self,
        local_author: Uuid,
        remote_author: Uuid,
    ) -> AppResult<Option<PeerResponse>> {
        self.deliver(remote_author, Delivery::RemoveFollower(local_author))
            .await
    }

    async fn attempt_lookup(
        &self,
        node: &node::Model,
        uuid: Uuid,
        lookup: Lookup,
    ) -> Result<Option<Value>, TransportError> {
        let adapter = self.adapter_for(node);
        let transport = self.transport.as_ref();
        match lookup {
            Lookup::Author => adapter.fetch_author(transport, node, uuid).await,
            Lookup::Followers => adapter
                .fetch_followers(transport, node, uuid)
                .await
                .map(|items| Some(Value::Array(items))),
        }
    }

    async fn attempt_delivery(
        &self,
        node: &node::Model,
        target: Uuid,
        delivery: Delivery<'_>,
    ) -> Result<PeerResponse, TransportError> {
        let adapter = self.adapter_for(node);
        let transport = self.transport.as_ref();
        match delivery {
            Delivery::Inbox(payload) => {
                adapter
                    .send_inbox_item(transport, node, target, payload)
                    .await
            }
            Delivery::RemoveFollower(follower) => {
                adapter
                    .remove_follower(transport, node, target, follower)
                    .await
            }
        }
    }

    async fn locate(&self, uuid: Uuid, lookup: Lookup) -> AppResult<Option<Value>> {
        if !self.enabled {
            return Ok(None);
        }

        let mut failed_node = None;
        if let Some(node) = self.cache.lookup(uuid).await? {
            match self.attempt_lookup(&node, uuid, lookup).await {
                // A rejected payload from the known host is final.
                Ok(shaped) => return Ok(shaped),
                Err(err) if err.is_not_found() => {
                    warn!(uuid = %uuid, node = %node.host, "Cached peer no longer has object");
                    self.cache.evict(uuid).await?;
                    failed_node = Some(node.id);
                }
                Err(err) => {
                    warn!(uuid = %uuid, node = %node.host, error = %err, "Cached peer failed");
                    failed_node = Some(node.id);
                }
            }
        }

        for node in self.nodes.list_all().await? {
            if failed_node.as_deref() == Some(node.id.as_str()) {
                continue;
            }
            match self.attempt_lookup(&node, uuid, lookup).await {
                Ok(Some(found)) => {
                    self.cache.record(uuid, &node).await?;
                    return Ok(Some(found));
                }
                Ok(None) => {
                    debug!(uuid = %uuid, node = %node.host, "Peer response rejected by adapter");
                }
                Err(err) => {
                    debug!(uuid = %uuid, node = %node.host, error = %err, "Peer miss");
                }
            }
        }

        warn!(uuid = %uuid, ?lookup, "Object not found on any reachable peer");
        Ok(None)
    }

    async fn deliver(&self, target: Uuid, delivery: Delivery<'_>) -> AppResult<Option<PeerResponse>> {
        if !self.enabled {
            return Ok(None);
        }

        if let Some(node) = self.cache.lookup(target).await? {
            return match self.attempt_delivery(&node, target, delivery).await {
                Ok(response) => {
                    info!(target = %target, node = %node.host, "Delivered to cached peer");
                    Ok(Some(response))
                }
                // Nothing left to remove on the host.
                Err(TransportError::Status { status: 404, body })
                    if matches!(delivery, Delivery::RemoveFollower(_)) =>
                {
                    info!(target = %target, node = %node.host, "Cached peer has no such follower");
                    Ok(Some(PeerResponse {
                        status: 404,
                        body: serde_json::from_str(&body).unwrap_or(Value::Null),
                    }))
                }
                Err(err) => Err(err.into()),
            };
        }

        for node in self.nodes.list_all().await? {
            match self.attempt_delivery(&node, target, delivery).await {
                Ok(response) => {
                    self.cache.record(target, &node).await?;
                    info!(target = %target, node = %node.host, "Delivered after broadcast");
                    return Ok(Some(response));
                }
                Err(err) => {
                    debug!(target = %target, node = %node.host, error = %err, "Peer refused delivery");
                }
            }
        }

        warn!(target = %target, "No peer accepted delivery");
        Ok(None)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::adapter::tests::test_node;
    use crate::testing::StubTransport;
    use chrono::{Duration, Utc};
    use reqwest::Method;
    use sea_orm::IntoActiveModel;
    use serde_json::json;
    use socialdist_common::canonicalize;
    use socialdist_db::test_utils::TestDatabase;

    const AUTHOR: &str = "1234abcd-0000-4000-8000-0123456789ab";

    fn author_uuid() -> Uuid {
        Uuid::parse_str(AUTHOR).unwrap()
    }

    fn compact(uuid: Uuid) -> String {
        canonicalize(&uuid.to_string())
    }

    fn author_url(host: &str, uuid: Uuid) -> String {
        format!("{host}/service/author/{}/", compact(uuid))
    }

    fn author_body(host: &str, uuid: Uuid) -> Value {
        json!({
            "type": "author",
            "id": format!("{host}/service/author/{}", compact(uuid)),
            "host": format!("{host}/"),
            "displayName": "Remote",
        })
    }

    /// Registers `hosts` in order, one second apart.
    async fn seed_nodes(db: &TestDatabase, hosts: &[(&str, &str)]) -> Vec<node::Model> {
        let repo = NodeRepository::new(db.connection());
        let start = Utc::now();
        let mut nodes = Vec::new();
        for (i, (host, adapter)) in hosts.iter().enumerate() {
            let mut model = test_node(host, adapter);
            model.id = format!("n{i}");
            model.auth_username = format!("peer{i}");
            model.created_at = (start + Duration::seconds(i as i64)).into();
            nodes.push(repo.create(model.into_active_model()).await.unwrap());
        }
        nodes
    }

    fn resolver(db: &TestDatabase, transport: Arc<StubTransport>) -> RemoteResolver {
        RemoteResolver::new(
            db.connection(),
            Arc::new(AdapterRegistry::builtin()),
            transport,
        )
    }

    #[tokio::test]
    async fn test_broadcast_finds_second_peer_and_caches_it() {
        let db = TestDatabase::memory().await.unwrap();
        let nodes = seed_nodes(
            &db,
            &[
                ("https://a.example", "default"),
                ("https://b.example", "default"),
                ("https://c.example", "default"),
            ],
        )
        .await;
        let uuid = author_uuid();
        let transport = Arc::new(
            StubTransport::new()
                .on(Method::GET, author_url("https://a.example", uuid), 404, json!({}))
                .on(
                    Method::GET,
                    author_url("https://b.example", uuid),
                    200,
                    author_body("https://b.example", uuid),
                )
                .on(Method::GET, author_url("https://c.example", uuid), 404, json!({})),
        );
        let resolver = resolver(&db, transport.clone());

        let found = resolver.resolve_author(uuid).await.unwrap().unwrap();

        assert_eq!(found["displayName"], "Remote");
        assert_eq!(resolver.cache().lookup(uuid).await.unwrap().unwrap().id, nodes[1].id);
        // The third peer is never asked.
        assert_eq!(transport.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_cached_peer_is_asked_alone() {
        let db = TestDatabase::memory().await.unwrap();
        let nodes = seed_nodes(
            &db,
            &[("https://a.example", "default"), ("https://b.example", "default")],
        )
        .await;
        let uuid = author_uuid();
        let transport = Arc::new(StubTransport::new().on(
            Method::GET,
            author_url("https://b.example", uuid),
            200,
            author_body("https://b.example", uuid),
        ));
        let resolver = resolver(&db, transport.clone());
        resolver.cache().record(uuid, &nodes[1]).await.unwrap();

        assert!(resolver.resolve_author(uuid).await.unwrap().is_some());
        assert_eq!(
            transport.request_lines(),
            [format!("GET {}", author_url("https://b.example", uuid))]
        );
    }

    #[tokio::test]
    async fn test_stale_cache_entry_is_evicted_and_resolution_recovers() {
        let db = TestDatabase::memory().await.unwrap();
        let nodes = seed_nodes(
            &db,
            &[("https://a.example", "default"), ("https://b.example", "default")],
        )
        .await;
        let uuid = author_uuid();
        let transport = Arc::new(
            StubTransport::new()
                .on(Method::GET, author_url("https://a.example", uuid), 404, json!({}))
                .on(
                    Method::GET,
                    author_url("https://b.example", uuid),
                    200,
                    author_body("https://b.example", uuid),
                ),
        );
        let resolver = resolver(&db, transport);
        resolver.cache().record(uuid, &nodes[0]).await.unwrap();

        let found = resolver.resolve_author(uuid).await.unwrap();

        assert!(found.is_some());
        assert_eq!(resolver.cache().lookup(uuid).await.unwrap().unwrap().id, nodes[1].id);
    }

    #[tokio::test]
    async fn test_gone_everywhere_leaves_cache_empty() {
        let db = TestDatabase::memory().await.unwrap();
        let nodes = seed_nodes(&db, &[("https://a.example", "default")]).await;
        let uuid = author_uuid();
        let transport = Arc::new(StubTransport::new().on(
            Method::GET,
            author_url("https://a.example", uuid),
            404,
            json!({}),
        ));
        let resolver = resolver(&db, transport);
        resolver.cache().record(uuid, &nodes[0]).await.unwrap();

        assert!(resolver.resolve_author(uuid).await.unwrap().is_none());
        assert!(resolver.cache().lookup(uuid).await.unwrap().is_none());
        assert!(resolver.resolve_author(uuid).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_cache_hit_shaping_rejection_is_not_found() {
        let db = TestDatabase::memory().await.unwrap();
        let nodes = seed_nodes(
            &db,
            &[("https://a.example", "strict_host"), ("https://b.example", "default")],
        )
        .await;
        let uuid = author_uuid();
        let transport = Arc::new(
            StubTransport::new()
                .on(
                    Method::GET,
                    author_url("https://a.example", uuid),
                    200,
                    author_body("https://spoofed.example", uuid),
                )
                .on(
                    Method::GET,
                    author_url("https://b.example", uuid),
                    200,
                    author_body("https://b.example", uuid),
                ),
        );
        let resolver = resolver(&db, transport.clone());
        resolver.cache().record(uuid, &nodes[0]).await.unwrap();

        assert!(resolver.resolve_author(uuid).await.unwrap().is_none());
        assert_eq!(transport.requests().len(), 1);
        assert_eq!(resolver.cache().lookup(uuid).await.unwrap().unwrap().id, nodes[0].id);
    }

    #[tokio::test]
    async fn test_approved_follow_compares_uuids_not_strings() {
        let db = TestDatabase::memory().await.unwrap();
        seed_nodes(&db, &[("https://a.example", "default")]).await;
        let remote = author_uuid();
        let local = Uuid::new_v4();
        let followers_url = format!("https://a.example/service/author/{}/followers/", compact(remote));
        let transport = Arc::new(StubTransport::new().on(
            Method::GET,
            followers_url,
            200,
            json!({
                "type": "followers",
                "items": [
                    { "id": format!("https://social.example/service/author/{local}") },
                ]
            }),
        ));
        let resolver = resolver(&db, transport);

        assert!(resolver.approved_follow(remote, local).await.unwrap());
        assert!(!resolver.approved_follow(remote, Uuid::new_v4()).await.unwrap());
    }

    #[tokio::test]
    async fn test_friend_request_broadcast_suppresses_errors() {
        let db = TestDatabase::memory().await.unwrap();
        let nodes = seed_nodes(
            &db,
            &[("https://a.example", "default"), ("https://b.example", "no_trailing_slash")],
        )
        .await;
        let target = author_uuid();
        let transport = Arc::new(
            StubTransport::new()
                .unreachable(
                    Method::POST,
                    format!("https://a.example/service/author/{}/inbox/", compact(target)),
                )
                .on(
                    Method::POST,
                    format!("https://b.example/service/author/{}/inbox", compact(target)),
                    201,
                    Value::Null,
                ),
        );
        let resolver = resolver(&db, transport.clone());

        let response = resolver
            .send_friend_request(target, &json!({ "type": "follow" }))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(response.status, 201);
        assert_eq!(resolver.cache().lookup(target).await.unwrap().unwrap().id, nodes[1].id);
        assert_eq!(transport.requests()[1].body, Some(json!({ "type": "follow" })));
    }

    #[tokio::test]
    async fn test_friend_request_to_cached_peer_fails_loudly() {
        let db = TestDatabase::memory().await.unwrap();
        let nodes = seed_nodes(&db, &[("https://a.example", "default")]).await;
        let target = author_uuid();
        let transport = Arc::new(StubTransport::new().on(
            Method::POST,
            format!("https://a.example/service/author/{}/inbox/", compact(target)),
            400,
            json!({ "error": "bad" }),
        ));
        let resolver = resolver(&db, transport);
        resolver.cache().record(target, &nodes[0]).await.unwrap();

        let err = resolver
            .send_friend_request(target, &json!({ "type": "follow" }))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Federation(_)));
    }

    #[tokio::test]
    async fn test_remove_follower_targets_remote_author() {
        let db = TestDatabase::memory().await.unwrap();
        let nodes = seed_nodes(&db, &[("https://a.example", "default")]).await;
        let remote = author_uuid();
        let local = Uuid::new_v4();
        let url = format!(
            "https://a.example/service/author/{}/followers/{}/",
            compact(remote),
            compact(local)
        );
        let transport = Arc::new(StubTransport::new().on(Method::DELETE, url.clone(), 204, Value::Null));
        let resolver = resolver(&db, transport.clone());
        resolver.cache().record(remote, &nodes[0]).await.unwrap();

        resolver.remove_follower(local, remote).await.unwrap();

        assert_eq!(transport.request_lines(), [format!("DELETE {url}")]);
        assert_eq!(
            transport.requests()[0].credentials.as_ref().unwrap().username,
            "us"
        );
    }

    #[tokio::test]
    async fn test_remove_follower_unknown_to_cached_peer_is_done() {
        let db = TestDatabase::memory().await.unwrap();
        let nodes = seed_nodes(&db, &[("https://a.example", "default")]).await;
        let remote = author_uuid();
        let local = Uuid::new_v4();
        let url = format!(
            "https://a.example/service/author/{}/followers/{}/",
            compact(remote),
            compact(local)
        );
        let transport = Arc::new(
            StubTransport::new()
                .on(Method::DELETE, url, 404, json!({ "error": "not a follower" }))
                .on(
                    Method::POST,
                    format!("https://a.example/service/author/{}/inbox/", compact(remote)),
                    404,
                    Value::Null,
                ),
        );
        let resolver = resolver(&db, transport);
        resolver.cache().record(remote, &nodes[0]).await.unwrap();

        let response = resolver.remove_follower(local, remote).await.unwrap().unwrap();
        assert_eq!(response.status, 404);

        // Inbox pushes to the same peer still fail loudly on 404.
        let err = resolver
            .send_friend_request(remote, &json!({ "type": "follow" }))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Federation(_)));
    }

    #[tokio::test]
    async fn test_disabled_federation_makes_no_calls() {
        let db = TestDatabase::memory().await.unwrap();
        seed_nodes(&db, &[("https://a.example", "default")]).await;
        let transport = Arc::new(StubTransport::new());
        let resolver = resolver(&db, transport.clone()).with_enabled(false);

        assert!(resolver.resolve_author(author_uuid()).await.unwrap().is_none());
        assert!(transport.requests().is_empty());
    }
}
