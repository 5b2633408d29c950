//! Follower repository.
//!
//! A row `(author_id = A, follower_uuid = B)` records that B follows the
//! local author A.

use std::sync::Arc;

use crate::entities::{Follower, follower};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, sea_query::OnConflict,
};
use socialdist_common::{AppError, AppResult};
use uuid::Uuid;

/// Follower repository for database operations.
#[derive(Clone)]
pub struct FollowerRepository {
    db: Arc<DatabaseConnection>,
}

impl FollowerRepository {
    /// Create a new follower repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find the edge "`follower_uuid` follows `author_id`".
    pub async fn find_by_pair(
        &self,
        author_id: Uuid,
        follower_uuid: Uuid,
    ) -> AppResult<Option<follower::Model>> {
        Follower::find()
            .filter(follower::Column::AuthorId.eq(author_id))
            .filter(follower::Column::FollowerUuid.eq(follower_uuid))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Check whether `follower_uuid` follows `author_id`.
    pub async fn is_follower(&self, author_id: Uuid, follower_uuid: Uuid) -> AppResult<bool> {
        Ok(self.find_by_pair(author_id, follower_uuid).await?.is_some())
    }

    /// Insert an edge unless it already exists.
    ///
    /// Returns `false` when the unique `(author_id, follower_uuid)` index
    /// swallowed a duplicate.
    pub async fn insert_if_absent(&self, model: follower::ActiveModel) -> AppResult<bool> {
        let inserted = Follower::insert(model)
            .on_conflict(
                OnConflict::columns([follower::Column::AuthorId, follower::Column::FollowerUuid])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(inserted > 0)
    }

    /// Delete an edge. Returns whether a row was removed.
    pub async fn delete_by_pair(&self, author_id: Uuid, follower_uuid: Uuid) -> AppResult<bool> {
        let result = Follower::delete_many()
            .filter(follower::Column::AuthorId.eq(author_id))
            .filter(follower::Column::FollowerUuid.eq(follower_uuid))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected > 0)
    }

    /// Followers of an author (paginated, oldest first).
    pub async fn find_by_author(
        &self,
        author_id: Uuid,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<follower::Model>> {
        Follower::find()
            .filter(follower::Column::AuthorId.eq(author_id))
            .order_by_asc(follower::Column::CreatedAt)
            .order_by_asc(follower::Column::Id)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count followers of an author.
    pub async fn count_by_author(&self, author_id: Uuid) -> AppResult<u64> {
        Follower::find()
            .filter(follower::Column::AuthorId.eq(author_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Every follower UUID of an author.
    pub async fn follower_uuids(&self, author_id: Uuid) -> AppResult<Vec<Uuid>> {
        Follower::find()
            .select_only()
            .column(follower::Column::FollowerUuid)
            .filter(follower::Column::AuthorId.eq(author_id))
            .into_tuple()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Local authors that record `follower_uuid` as one of their followers.
    pub async fn authors_followed_by(&self, follower_uuid: Uuid) -> AppResult<Vec<Uuid>> {
        Follower::find()
            .select_only()
            .column(follower::Column::AuthorId)
            .filter(follower::Column::FollowerUuid.eq(follower_uuid))
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

    fn create_test_follower(author_id: Uuid, follower_uuid: Uuid) -> follower::Model {
        follower::Model {
            id: "f1".to_string(),
            author_id,
            follower_uuid,
            created_at: Utc::now().into(),
        }
    }

    fn active(author_id: Uuid, follower_uuid: Uuid) -> follower::ActiveModel {
        follower::ActiveModel {
            id: Set("f1".to_string()),
            author_id: Set(author_id),
            follower_uuid: Set(follower_uuid),
            created_at: Set(Utc::now().into()),
        }
    }

    #[tokio::test]
    async fn test_is_follower_true() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_follower(a, b)]])
                .into_connection(),
        );

        let repo = FollowerRepository::new(db);
        assert!(repo.is_follower(a, b).await.unwrap());
    }

    #[tokio::test]
    async fn test_is_follower_false() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<follower::Model>::new()])
                .into_connection(),
        );

        let repo = FollowerRepository::new(db);
        assert!(!repo.is_follower(Uuid::new_v4(), Uuid::new_v4()).await.unwrap());
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

        let repo = FollowerRepository::new(db);
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

        let repo = FollowerRepository::new(db);
        assert!(repo.delete_by_pair(Uuid::new_v4(), Uuid::new_v4()).await.unwrap());
    }
}
