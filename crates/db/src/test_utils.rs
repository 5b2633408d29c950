//! Test utilities for database operations.
//!
//! [`TestDatabase::memory`] gives every test its own migrated in-memory
//! SQLite database, so scenario tests can run real queries without a server.

use std::sync::Arc;

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use sea_orm_migration::MigratorTrait;

use crate::migrations::Migrator;

/// A migrated, private database for one test.
pub struct TestDatabase {
    /// Database connection.
    pub conn: Arc<DatabaseConnection>,
}

impl TestDatabase {
    /// Open a fresh `sqlite::memory:` database and apply every migration.
    ///
    /// The pool is pinned to a single connection: each SQLite memory
    /// connection is its own database.
    pub async fn memory() -> Result<Self, DbErr> {
        let mut opt = ConnectOptions::new("sqlite::memory:");
        opt.max_connections(1)
            .min_connections(1)
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;
        Migrator::up(&conn, None).await?;

        Ok(Self {
            conn: Arc::new(conn),
        })
    }

    /// Shared handle for repositories and services.
    #[must_use]
    pub fn connection(&self) -> Arc<DatabaseConnection> {
        self.conn.clone()
    }
}
