//! Post repository.

use std::sync::Arc;

use crate::entities::{
    Comment, Like, Post, comment, like,
    post::{self, Visibility},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
};
use socialdist_common::{AppError, AppResult};
use uuid::Uuid;

/// Post repository for database operations.
#[derive(Clone)]
pub struct PostRepository {
    db: Arc<DatabaseConnection>,
}

impl PostRepository {
    /// Create a new post repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a post by ID.
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<post::Model>> {
        Post::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a post by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<post::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::PostNotFound(id.to_string()))
    }

    /// Create a new post.
    pub async fn create(&self, model: post::ActiveModel) -> AppResult<post::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a post with its comments and every like on either.
    pub async fn delete_cascade(&self, id: Uuid) -> AppResult<()> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let comment_ids: Vec<Uuid> = Comment::find()
            .select_only()
            .column(comment::Column::Id)
            .filter(comment::Column::PostId.eq(id))
            .into_tuple()
            .all(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if !comment_ids.is_empty() {
            Like::delete_many()
                .filter(like::Column::TargetKind.eq(like::TargetKind::Comment))
                .filter(like::Column::TargetUuid.is_in(comment_ids))
                .exec(&txn)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
        }

        Like::delete_many()
            .filter(like::Column::TargetKind.eq(like::TargetKind::Post))
            .filter(like::Column::TargetUuid.eq(id))
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Comment::delete_many()
            .filter(comment::Column::PostId.eq(id))
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Post::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// PUBLIC posts of an author, newest first.
    pub async fn find_public_by_author(
        &self,
        author_id: Uuid,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<post::Model>> {
        Post::find()
            .filter(post::Column::AuthorId.eq(author_id))
            .filter(post::Column::Visibility.eq(Visibility::Public))
            .order_by_desc(post::Column::Published)
            .order_by_asc(post::Column::Id)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count PUBLIC posts of an author.
    pub async fn count_public_by_author(&self, author_id: Uuid) -> AppResult<u64> {
        Post::find()
            .filter(post::Column::AuthorId.eq(author_id))
            .filter(post::Column::Visibility.eq(Visibility::Public))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Posts a viewer may see, newest first.
    ///
    /// The union of every PUBLIC post, FRIENDS posts written by one of
    /// `friend_author_ids`, and PRIVATE posts addressed to `viewer`.
    pub async fn find_visible(
        &self,
        viewer: Uuid,
        friend_author_ids: &[Uuid],
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<post::Model>> {
        let mut condition = Condition::any()
            .add(post::Column::Visibility.eq(Visibility::Public))
            .add(
                Condition::all()
                    .add(post::Column::Visibility.eq(Visibility::Private))
                    .add(post::Column::RecipientId.eq(viewer)),
            );

        if !friend_author_ids.is_empty() {
            condition = condition.add(
                Condition::all()
                    .add(post::Column::Visibility.eq(Visibility::Friends))
                    .add(post::Column::AuthorId.is_in(friend_author_ids.to_vec())),
            );
        }

        Post::find()
            .filter(condition)
            .order_by_desc(post::Column::Published)
            .order_by_asc(post::Column::Id)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
