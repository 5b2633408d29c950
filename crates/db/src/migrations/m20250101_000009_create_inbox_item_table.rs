//! Create inbox item table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(InboxItem::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(InboxItem::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(InboxItem::AuthorId).uuid().not_null())
                    .col(ColumnDef::new(InboxItem::Kind).string_len(16).not_null())
                    .col(ColumnDef::new(InboxItem::Payload).json_binary().not_null())
                    .col(
                        ColumnDef::new(InboxItem::ReceivedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_inbox_item_author")
                            .from(InboxItem::Table, InboxItem::AuthorId)
                            .to(Author::Table, Author::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (author_id, kind) for friend request derivation
        manager
            .create_index(
                Index::create()
                    .name("idx_inbox_item_author_kind")
                    .table(InboxItem::Table)
                    .col(InboxItem::AuthorId)
                    .col(InboxItem::Kind)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(InboxItem::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum InboxItem {
    Table,
    Id,
    AuthorId,
    Kind,
    Payload,
    ReceivedAt,
}

#[derive(Iden)]
enum Author {
    Table,
    Id,
}
