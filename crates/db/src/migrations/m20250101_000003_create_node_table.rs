//! Create node table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Node::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Node::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Node::Host).string_len(512).not_null())
                    .col(ColumnDef::new(Node::DisplayName).string_len(256))
                    .col(
                        ColumnDef::new(Node::Prefix)
                            .string_len(128)
                            .not_null()
                            .default("service"),
                    )
                    .col(ColumnDef::new(Node::AuthUsername).string_len(128).not_null())
                    .col(ColumnDef::new(Node::AuthPassword).string_len(256).not_null())
                    .col(ColumnDef::new(Node::NodeUsername).string_len(128).not_null())
                    .col(ColumnDef::new(Node::NodePassword).string_len(256).not_null())
                    .col(
                        ColumnDef::new(Node::Adapter)
                            .string_len(64)
                            .not_null()
                            .default("default"),
                    )
                    .col(
                        ColumnDef::new(Node::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_node_host")
                    .table(Node::Table)
                    .col(Node::Host)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Inbound credentials identify the peer
        manager
            .create_index(
                Index::create()
                    .name("idx_node_auth_username")
                    .table(Node::Table)
                    .col(Node::AuthUsername)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Node::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Node {
    Table,
    Id,
    Host,
    DisplayName,
    Prefix,
    AuthUsername,
    AuthPassword,
    NodeUsername,
    NodePassword,
    Adapter,
    CreatedAt,
}
