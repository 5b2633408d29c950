//! Create author table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Author::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Author::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Author::UserId).string_len(32).not_null())
                    .col(ColumnDef::new(Author::DisplayName).string_len(256).not_null())
                    .col(ColumnDef::new(Author::GithubUrl).string_len(1024))
                    .col(ColumnDef::new(Author::ProfileImage).string_len(1024))
                    .col(
                        ColumnDef::new(Author::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_author_user")
                            .from(Author::Table, Author::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One author per login account
        manager
            .create_index(
                Index::create()
                    .name("idx_author_user_id")
                    .table(Author::Table)
                    .col(Author::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: created_at (for listing)
        manager
            .create_index(
                Index::create()
                    .name("idx_author_created_at")
                    .table(Author::Table)
                    .col(Author::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Author::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Author {
    Table,
    Id,
    UserId,
    DisplayName,
    GithubUrl,
    ProfileImage,
    CreatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
