//! Create following table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Following::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Following::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Following::AuthorId).uuid().not_null())
                    .col(ColumnDef::new(Following::FollowingUuid).uuid().not_null())
                    .col(
                        ColumnDef::new(Following::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_following_author")
                            .from(Following::Table, Following::AuthorId)
                            .to(Author::Table, Author::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (author_id, following_uuid) - duplicate edges are no-ops
        manager
            .create_index(
                Index::create()
                    .name("idx_following_author_following_uuid")
                    .table(Following::Table)
                    .col(Following::AuthorId)
                    .col(Following::FollowingUuid)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: following_uuid (reverse lookups)
        manager
            .create_index(
                Index::create()
                    .name("idx_following_following_uuid")
                    .table(Following::Table)
                    .col(Following::FollowingUuid)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Following::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Following {
    Table,
    Id,
    AuthorId,
    FollowingUuid,
    CreatedAt,
}

#[derive(Iden)]
enum Author {
    Table,
    Id,
}
