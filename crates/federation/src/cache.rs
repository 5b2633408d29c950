//! Remote location cache.
//!
//! Remembers which peer answered for a UUID so later lookups can ask that
//! peer directly instead of polling every node. Entries are hints, never
//! authoritative: the resolver evicts an entry when its peer answers 404.

use std::sync::Arc;

use sea_orm::DatabaseConnection;
use socialdist_common::AppResult;
use socialdist_db::{
    entities::node,
    repositories::{NodeRepository, RemoteLocationRepository},
};
use tracing::{debug, info};
use uuid::Uuid;

/// UUID to peer mapping, persisted in the `remote_location` table.
#[derive(Clone)]
pub struct RemoteLocationCache {
    locations: RemoteLocationRepository,
    nodes: NodeRepository,
}

impl RemoteLocationCache {
    #[must_use]
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            locations: RemoteLocationRepository::new(db.clone()),
            nodes: NodeRepository::new(db),
        }
    }

    /// The peer last known to host `uuid`.
    pub async fn lookup(&self, uuid: Uuid) -> AppResult<Option<node::Model>> {
        let Some(entry) = self.locations.find(uuid).await? else {
            debug!(uuid = %uuid, "Location cache miss");
            return Ok(None);
        };

        let node = self.nodes.find_by_id(&entry.node_id).await?;
        if node.is_some() {
            debug!(uuid = %uuid, node_id = %entry.node_id, "Location cache hit");
        }
        Ok(node)
    }

    /// Remember that `node` hosts `uuid`. Last writer wins.
    pub async fn record(&self, uuid: Uuid, node: &node::Model) -> AppResult<()> {
        self.locations.upsert(uuid, &node.id).await?;
        info!(uuid = %uuid, node = %node.host, "Cached remote location");
        Ok(())
    }

    /// Forget where `uuid` lives.
    pub async fn evict(&self, uuid: Uuid) -> AppResult<()> {
        if self.locations.delete(uuid).await? {
            info!(uuid = %uuid, "Evicted remote location");
        }
        Ok(())
    }
}
