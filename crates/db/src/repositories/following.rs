//! Following repository.
//!
//! A row `(author_id = A, following_uuid = C)` records that the local author
//! A follows C.

use std::sync::Arc;

use crate::entities::{Following, following};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, sea_query::OnConflict,
};
use socialdist_common::{AppError, AppResult};
use uuid::Uuid;

/// Following repository for database operations.
#[derive(Clone)]
pub struct FollowingRepository {
    db: Arc<DatabaseConnection>,
}

impl FollowingRepository {
    /// Create a new following repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find the edge "`author_id` follows `following_uuid`".
    pub async fn find_by_pair(
        &self,
        author_id: Uuid,
        following_uuid: Uuid,
    ) -> AppResult<Option<following::Model>> {
        Following::find()
            .filter(following::Column::AuthorId.eq(author_id))
            .filter(following::Column::FollowingUuid.eq(following_uuid))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Check whether `author_id` follows `following_uuid`.
    pub async fn is_following(&self, author_id: Uuid, following_uuid: Uuid) -> AppResult<bool> {
        Ok(self.find_by_pair(author_id, following_uuid).await?.is_some())
    }

    /// Insert an edge unless it already exists.
    ///
    /// Returns `false` when the unique `(author_id, following_uuid)` index
    /// swallowed a duplicate.
    pub async fn insert_if_absent(&self, model: following::ActiveModel) -> AppResult<bool> {
        let inserted = Following::insert(model)
            .on_conflict(
                OnConflict::columns([following::Column::AuthorId, following::Column::FollowingUuid])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(inserted > 0)
    }

    /// Delete an edge. Returns whether a row was removed.
    pub async fn delete_by_pair(&self, author_id: Uuid, following_uuid: Uuid) -> AppResult<bool> {
        let result = Following::delete_many()
            .filter(following::Column::AuthorId.eq(author_id))
            .filter(following::Column::FollowingUuid.eq(following_uuid))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected > 0)
    }

    /// Authors followed by an author (paginated, oldest first).
    pub async fn find_by_author(
        &self,
        author_id: Uuid,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<following::Model>> {
        Following::find()
            .filter(following::Column::AuthorId.eq(author_id))
            .order_by_asc(following::Column::CreatedAt)
            .order_by_asc(following::Column::Id)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count authors followed by an author.
    pub async fn count_by_author(&self, author_id: Uuid) -> AppResult<u64> {
        Following::find()
            .filter(following::Column::AuthorId.eq(author_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Every UUID an author follows.
    pub async fn following_uuids(&self, author_id: Uuid) -> AppResult<Vec<Uuid>> {
        Following::find()
            .select_only()
            .column(following::Column::FollowingUuid)
            .filter(following::Column::AuthorId.eq(author_id))
            .into_tuple()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Local authors that follow `following_uuid`.
    pub async fn authors_following(&self, following_uuid: Uuid) -> AppResult<Vec<Uuid>> {
        Following::find()
            .select_only()
            .column(following::Column::AuthorId)
            .filter(following::Column::FollowingUuid.eq(following_uuid))
            .into_tuple()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Set};

    fn create_test_following(author_id: Uuid, following_uuid: Uuid) -> following::Model {
        following::Model {
            id: "f1".to_string(),
            author_id,
            following_uuid,
            created_at: Utc::now().into(),
        }
    }

    fn active(author_id: Uuid, following_uuid: Uuid) -> following::ActiveModel {
        following::ActiveModel {
            id: Set("f1".to_string()),
            author_id: Set(author_id),
            following_uuid: Set(following_uuid),
            created_at: Set(Utc::now().into()),
        }
    }

    #[tokio::test]
    async fn test_is_following_true() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_following(a, b)]])
                .into_connection(),
        );

        let repo = FollowingRepository::new(db);
        assert!(repo.is_following(a, b).await.unwrap());
    }

    #[tokio::test]
    async fn test_is_following_false() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<following::Model>::new()])
                .into_connection(),
        );

        let repo = FollowingRepository::new(db);
        assert!(!repo.is_following(Uuid::new_v4(), Uuid::new_v4()).await.unwrap());
    }

    #[tokio::test]
    async fn test_insert_if_absent_reports_duplicate() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());

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

        let repo = FollowingRepository::new(db);
        assert!(repo.insert_if_absent(active(a, b)).await.unwrap());
        assert!(!repo.insert_if_absent(active(a, b)).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_by_pair() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let repo = FollowingRepository::new(db);
        assert!(repo.delete_by_pair(Uuid::new_v4(), Uuid::new_v4()).await.unwrap());
    }
}
