//! Remote location cache repository.

use std::sync::Arc;

use crate::entities::{RemoteLocation, remote_location};
use chrono::Utc;
use sea_orm::{DatabaseConnection, EntityTrait, Set, sea_query::OnConflict};
use socialdist_common::{AppError, AppResult};
use uuid::Uuid;

/// Remote location repository for database operations.
#[derive(Clone)]
pub struct RemoteLocationRepository {
    db: Arc<DatabaseConnection>,
}

impl RemoteLocationRepository {
    /// Create a new remote location repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find the cached location of a UUID.
    pub async fn find(&self, uuid: Uuid) -> AppResult<Option<remote_location::Model>> {
        RemoteLocation::find_by_id(uuid)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert or overwrite the location of a UUID. Last writer wins.
    pub async fn upsert(&self, uuid: Uuid, node_id: &str) -> AppResult<()> {
        let model = remote_location::ActiveModel {
            uuid: Set(uuid),
            node_id: Set(node_id.to_string()),
            cached_at: Set(Utc::now().into()),
        };

        RemoteLocation::insert(model)
            .on_conflict(
                OnConflict::column(remote_location::Column::Uuid)
                    .update_columns([
                        remote_location::Column::NodeId,
                        remote_location::Column::CachedAt,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }

    /// Drop the cached location of a UUID.
    pub async fn delete(&self, uuid: Uuid) -> AppResult<bool> {
        let result = RemoteLocation::delete_by_id(uuid)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected > 0)
    }
}
