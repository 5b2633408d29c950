//! Like repository.

use std::sync::Arc;

use crate::entities::{
    Like,
    like::{self, LikeTarget},
};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, sea_query::OnConflict,
};
use socialdist_common::{AppError, AppResult};

/// Like repository for database operations.
#[derive(Clone)]
pub struct LikeRepository {
    db: Arc<DatabaseConnection>,
}

impl LikeRepository {
    /// Create a new like repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Insert a like unless the same author already liked the target.
    pub async fn insert_if_absent(&self, model: like::ActiveModel) -> AppResult<bool> {
        let inserted = Like::insert(model)
            .on_conflict(
                OnConflict::columns([
                    like::Column::AuthorUuid,
                    like::Column::TargetKind,
                    like::Column::TargetUuid,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(inserted > 0)
    }

    /// Likes on a post or comment, oldest first.
    pub async fn find_by_target(
        &self,
        target: LikeTarget,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<like::Model>> {
        Like::find()
            .filter(like::Column::TargetKind.eq(target.kind()))
            .filter(like::Column::TargetUuid.eq(target.uuid()))
            .order_by_asc(like::Column::CreatedAt)
            .order_by_asc(like::Column::Id)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count likes on a post or comment.
    pub async fn count_by_target(&self, target: LikeTarget) -> AppResult<u64> {
        Like::find()
            .filter(like::Column::TargetKind.eq(target.kind()))
            .filter(like::Column::TargetUuid.eq(target.uuid()))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Set};
    use uuid::Uuid;

    #[tokio::test]
    async fn test_duplicate_like_is_not_inserted() {
        let target = LikeTarget::Comment(Uuid::new_v4());
        let model = || like::ActiveModel {
            id: Set("l1".to_string()),
            author_uuid: Set(Uuid::nil()),
            target_kind: Set(target.kind()),
            target_uuid: Set(target.uuid()),
            created_at: Set(chrono::Utc::now().into()),
        };

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 1,
                    },
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 0,
                    },
                ])
                .into_connection(),
        );

        let repo = LikeRepository::new(db);
        assert!(repo.insert_if_absent(model()).await.unwrap());
        assert!(!repo.insert_if_absent(model()).await.unwrap());
    }
}
