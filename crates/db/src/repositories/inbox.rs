//! Inbox repository.

use std::sync::Arc;

use crate::entities::{
    InboxItem,
    inbox_item::{self, InboxKind},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect,
};
use socialdist_common::{AppError, AppResult};
use uuid::Uuid;

/// Inbox repository for database operations.
#[derive(Clone)]
pub struct InboxRepository {
    db: Arc<DatabaseConnection>,
}

impl InboxRepository {
    /// Create a new inbox repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Append an item to an inbox.
    pub async fn create(&self, model: inbox_item::ActiveModel) -> AppResult<inbox_item::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Items in an author's inbox, newest first.
    pub async fn find_by_author(
        &self,
        author_id: Uuid,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<inbox_item::Model>> {
        InboxItem::find()
            .filter(inbox_item::Column::AuthorId.eq(author_id))
            .order_by_desc(inbox_item::Column::ReceivedAt)
            .order_by_desc(inbox_item::Column::Id)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Every item of one kind in an author's inbox, newest first.
    pub async fn find_by_author_and_kind(
        &self,
        author_id: Uuid,
        kind: InboxKind,
    ) -> AppResult<Vec<inbox_item::Model>> {
        InboxItem::find()
            .filter(inbox_item::Column::AuthorId.eq(author_id))
            .filter(inbox_item::Column::Kind.eq(kind))
            .order_by_desc(inbox_item::Column::ReceivedAt)
            .order_by_desc(inbox_item::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count items in an author's inbox.
    pub async fn count_by_author(&self, author_id: Uuid) -> AppResult<u64> {
        InboxItem::find()
            .filter(inbox_item::Column::AuthorId.eq(author_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
