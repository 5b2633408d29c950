//! Create follower table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Follower::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Follower::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Follower::AuthorId).uuid().not_null())
                    .col(ColumnDef::new(Follower::FollowerUuid).uuid().not_null())
                    .col(
                        ColumnDef::new(Follower::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_follower_author")
                            .from(Follower::Table, Follower::AuthorId)
                            .to(Author::Table, Author::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (author_id, follower_uuid) - duplicate edges are no-ops
        manager
            .create_index(
                Index::create()
                    .name("idx_follower_author_follower_uuid")
                    .table(Follower::Table)
                    .col(Follower::AuthorId)
                    .col(Follower::FollowerUuid)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: follower_uuid (reverse lookups)
        manager
            .create_index(
                Index::create()
                    .name("idx_follower_follower_uuid")
                    .table(Follower::Table)
                    .col(Follower::FollowerUuid)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Follower::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Follower {
    Table,
    Id,
    AuthorId,
    FollowerUuid,
    CreatedAt,
}

#[derive(Iden)]
enum Author {
    Table,
    Id,
}
