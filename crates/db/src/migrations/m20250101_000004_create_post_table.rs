//! Create post table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Post::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Post::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Post::AuthorId).uuid().not_null())
                    .col(ColumnDef::new(Post::ContentType).string_len(32).not_null())
                    .col(ColumnDef::new(Post::Title).string_len(512).not_null())
                    .col(ColumnDef::new(Post::Description).text().not_null())
                    .col(ColumnDef::new(Post::Content).text().not_null())
                    .col(ColumnDef::new(Post::Categories).json_binary().not_null())
                    .col(ColumnDef::new(Post::Visibility).string_len(16).not_null())
                    .col(ColumnDef::new(Post::RecipientId).uuid())
                    .col(
                        ColumnDef::new(Post::Unlisted)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Post::Source).string_len(1024))
                    .col(ColumnDef::new(Post::Origin).string_len(1024))
                    .col(
                        ColumnDef::new(Post::Published)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_post_author")
                            .from(Post::Table, Post::AuthorId)
                            .to(Author::Table, Author::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (author_id, published) for per-author listings
        manager
            .create_index(
                Index::create()
                    .name("idx_post_author_published")
                    .table(Post::Table)
                    .col(Post::AuthorId)
                    .col(Post::Published)
                    .to_owned(),
            )
            .await?;

        // Index: (visibility, published) for the stream
        manager
            .create_index(
                Index::create()
                    .name("idx_post_visibility_published")
                    .table(Post::Table)
                    .col(Post::Visibility)
                    .col(Post::Published)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_post_recipient_id")
                    .table(Post::Table)
                    .col(Post::RecipientId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Post::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Post {
    Table,
    Id,
    AuthorId,
    ContentType,
    Title,
    Description,
    Content,
    Categories,
    Visibility,
    RecipientId,
    Unlisted,
    Source,
    Origin,
    Published,
}

#[derive(Iden)]
enum Author {
    Table,
    Id,
}
