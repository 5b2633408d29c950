//! Create remote location cache table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(RemoteLocation::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RemoteLocation::Uuid)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(RemoteLocation::NodeId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(RemoteLocation::CachedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_remote_location_node")
                            .from(RemoteLocation::Table, RemoteLocation::NodeId)
                            .to(Node::Table, Node::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(RemoteLocation::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum RemoteLocation {
    Table,
    Uuid,
    NodeId,
    CachedAt,
}

#[derive(Iden)]
enum Node {
    Table,
    Id,
}
