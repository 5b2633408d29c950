//! Peer registration.

use std::sync::Arc;

use chrono::Utc;
use sea_orm::Set;
use serde::Deserialize;
use socialdist_common::{AppError, AppResult, IdGenerator};
use socialdist_db::{entities::node, repositories::NodeRepository};
use socialdist_federation::AdapterRegistry;
use tracing::info;
use validator::Validate;

/// Input for registering a federation peer.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterNodeInput {
    /// Base URL, e.g. `https://peer.example`.
    #[validate(url)]
    pub host: String,

    #[serde(default)]
    pub display_name: Option<String>,

    /// Path segment in front of the peer's API, e.g. `service`.
    #[serde(default)]
    pub prefix: String,

    /// What the peer presents to us.
    #[validate(length(min = 1, max = 150))]
    pub auth_username: String,
    #[validate(length(min = 1, max = 150))]
    pub auth_password: String,

    /// What we present to the peer.
    #[validate(length(min = 1, max = 150))]
    pub node_username: String,
    #[validate(length(min = 1, max = 150))]
    pub node_password: String,

    /// Adapter tag from the registry.
    #[serde(default = "default_adapter")]
    pub adapter: String,
}

fn default_adapter() -> String {
    "default".to_string()
}

/// Node service for business logic.
#[derive(Clone)]
pub struct NodeService {
    node_repo: NodeRepository,
    registry: Arc<AdapterRegistry>,
    id_gen: IdGenerator,
}

impl NodeService {
    #[must_use]
    pub const fn new(node_repo: NodeRepository, registry: Arc<AdapterRegistry>) -> Self {
        Self {
            node_repo,
            registry,
            id_gen: IdGenerator::new(),
        }
    }

    /// Register a peer. The adapter tag must name a built-in adapter.
    pub async fn register(&self, input: RegisterNodeInput) -> AppResult<node::Model> {
        input.validate()?;

        if !self.registry.contains(&input.adapter) {
            let known: Vec<_> = self.registry.tags().collect();
            return Err(AppError::invalid_field(
                "adapter",
                format!("unknown adapter `{}`; expected one of {known:?}", input.adapter),
            ));
        }

        let host = input.host.trim_end_matches('/').to_string();
        if self.node_repo.find_by_host(&host).await?.is_some() {
            return Err(AppError::Conflict(format!("node {host} is already registered")));
        }
        if self
            .node_repo
            .find_by_auth_username(&input.auth_username)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(format!(
                "credential `{}` is already in use",
                input.auth_username
            )));
        }

        let model = node::ActiveModel {
            id: Set(self.id_gen.generate()),
            host: Set(host),
            display_name: Set(input.display_name),
            prefix: Set(input.prefix.trim_matches('/').to_string()),
            auth_username: Set(input.auth_username),
            auth_password: Set(input.auth_password),
            node_username: Set(input.node_username),
            node_password: Set(input.node_password),
            adapter: Set(input.adapter),
            created_at: Set(Utc::now().into()),
        };

        let node = self.node_repo.create(model).await?;
        info!(node = %node.host, adapter = %node.adapter, "Registered peer");
        Ok(node)
    }

    /// Every peer, in the order broadcasts visit them.
    pub async fn list(&self) -> AppResult<Vec<node::Model>> {
        self.node_repo.list_all().await
    }

    pub async fn find(&self, id: &str) -> AppResult<Option<node::Model>> {
        self.node_repo.find_by_id(id).await
    }

    pub async fn delete(&self, id: &str) -> AppResult<()> {
        if self.node_repo.delete(id).await? {
            info!(node = %id, "Removed peer");
            Ok(())
        } else {
            Err(AppError::NotFound(format!("node {id}")))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn input(adapter: &str) -> RegisterNodeInput {
        RegisterNodeInput {
            host: "https://peer.example/".to_string(),
            display_name: None,
            prefix: "/service/".to_string(),
            auth_username: "peer".to_string(),
            auth_password: "pw".to_string(),
            node_username: "us".to_string(),
            node_password: "pw2".to_string(),
            adapter: adapter.to_string(),
        }
    }

    #[tokio::test]
    async fn test_unknown_adapter_is_rejected_before_any_query() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let service = NodeService::new(
            NodeRepository::new(Arc::new(db)),
            Arc::new(AdapterRegistry::builtin()),
        );

        let result = service.register(input("gopher")).await;
        assert!(matches!(
            result,
            Err(AppError::InvalidField { ref field, .. }) if field == "adapter"
        ));
    }

    #[tokio::test]
    async fn test_duplicate_host_is_conflict() {
        let existing = node::Model {
            id: "n1".to_string(),
            host: "https://peer.example".to_string(),
            display_name: None,
            prefix: "service".to_string(),
            auth_username: "other".to_string(),
            auth_password: "x".to_string(),
            node_username: "us".to_string(),
            node_password: "y".to_string(),
            adapter: "default".to_string(),
            created_at: Utc::now().into(),
        };
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[existing]])
            .into_connection();
        let service = NodeService::new(
            NodeRepository::new(Arc::new(db)),
            Arc::new(AdapterRegistry::builtin()),
        );

        let result = service.register(input("strict_host")).await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }
}
