//! Node (federation peer) repository.

use std::sync::Arc;

use crate::entities::{Node, node};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
};
use socialdist_common::{AppError, AppResult};

/// Node repository for database operations.
#[derive(Clone)]
pub struct NodeRepository {
    db: Arc<DatabaseConnection>,
}

impl NodeRepository {
    /// Create a new node repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a node by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<node::Model>> {
        Node::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a node by its base URL.
    pub async fn find_by_host(&self, host: &str) -> AppResult<Option<node::Model>> {
        Node::find()
            .filter(node::Column::Host.eq(host))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a node by the username it authenticates to us with.
    pub async fn find_by_auth_username(&self, username: &str) -> AppResult<Option<node::Model>> {
        Node::find()
            .filter(node::Column::AuthUsername.eq(username))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// All registered nodes in registry order (registration time, then ID).
    pub async fn list_all(&self) -> AppResult<Vec<node::Model>> {
        Node::find()
            .order_by_asc(node::Column::CreatedAt)
            .order_by_asc(node::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Register a new node.
    pub async fn create(&self, model: node::ActiveModel) -> AppResult<node::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Remove a node. Cached locations pointing at it go with it.
    pub async fn delete(&self, id: &str) -> AppResult<bool> {
        let result = Node::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected > 0)
    }
}
