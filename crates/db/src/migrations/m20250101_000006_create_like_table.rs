//! Create like table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Like::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Like::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Like::AuthorUuid).uuid().not_null())
                    .col(ColumnDef::new(Like::TargetKind).string_len(16).not_null())
                    .col(ColumnDef::new(Like::TargetUuid).uuid().not_null())
                    .col(
                        ColumnDef::new(Like::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: one like per (author, target)
        manager
            .create_index(
                Index::create()
                    .name("idx_like_author_target")
                    .table(Like::Table)
                    .col(Like::AuthorUuid)
                    .col(Like::TargetKind)
                    .col(Like::TargetUuid)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: (target_kind, target_uuid) for listing likes on an object
        manager
            .create_index(
                Index::create()
                    .name("idx_like_target")
                    .table(Like::Table)
                    .col(Like::TargetKind)
                    .col(Like::TargetUuid)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Like::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Like {
    Table,
    Id,
    AuthorUuid,
    TargetKind,
    TargetUuid,
    CreatedAt,
}
