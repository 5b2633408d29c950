//! Author repository.

use std::sync::Arc;

use crate::entities::{Author, author, user};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, TransactionTrait,
};
use socialdist_common::{AppError, AppResult};
use uuid::Uuid;

/// Author repository for database operations.
#[derive(Clone)]
pub struct AuthorRepository {
    db: Arc<DatabaseConnection>,
}

impl AuthorRepository {
    /// Create a new author repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find an author by UUID.
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<author::Model>> {
        Author::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find an author by UUID, returning an error if not found.
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<author::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::AuthorNotFound(id.to_string()))
    }

    /// Find the author owned by a login account.
    pub async fn find_by_user_id(&self, user_id: &str) -> AppResult<Option<author::Model>> {
        Author::find()
            .filter(author::Column::UserId.eq(user_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find authors by UUIDs. Unknown UUIDs are skipped.
    pub async fn find_by_ids(&self, ids: &[Uuid]) -> AppResult<Vec<author::Model>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        Author::find()
            .filter(author::Column::Id.is_in(ids.to_vec()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List local authors, oldest first.
    pub async fn list(&self, limit: u64, offset: u64) -> AppResult<Vec<author::Model>> {
        Author::find()
            .order_by_asc(author::Column::CreatedAt)
            .order_by_asc(author::Column::Id)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count local authors.
    pub async fn count(&self) -> AppResult<u64> {
        Author::find()
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert a login account and its author in one transaction.
    ///
    /// Either both rows exist afterwards or neither does.
    pub async fn create_with_user(
        &self,
        user: user::ActiveModel,
        author: author::ActiveModel,
    ) -> AppResult<(user::Model, author::Model)> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let user = user
            .insert(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        let author = author
            .insert(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok((user, author))
    }
}
