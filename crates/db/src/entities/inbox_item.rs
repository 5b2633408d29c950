//! Inbox item entity.
//!
//! Append-only record of an object pushed to a local author. The payload is
//! stored exactly as validated and handed back unchanged on read.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Logical type of an inbox item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum InboxKind {
    #[sea_orm(string_value = "post")]
    Post,
    #[sea_orm(string_value = "comment")]
    Comment,
    #[sea_orm(string_value = "like")]
    Like,
    #[sea_orm(string_value = "follow")]
    Follow,
}

impl InboxKind {
    /// Parse a `type` discriminator. Case and surrounding whitespace are ignored.
    #[must_use]
    pub fn from_discriminator(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "post" => Some(Self::Post),
            "comment" => Some(Self::Comment),
            "like" => Some(Self::Like),
            "follow" => Some(Self::Follow),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "inbox_item")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Inbox owner
    #[sea_orm(indexed)]
    pub author_id: Uuid,

    pub kind: InboxKind,

    #[sea_orm(column_type = "JsonBinary")]
    pub payload: Json,

    pub received_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::author::Entity",
        from = "Column::AuthorId",
        to = "super::author::Column::Id",
        on_delete = "Cascade"
    )]
    Author,
}

impl Related<super::author::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Author.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discriminator_is_trimmed_and_lowercased() {
        assert_eq!(InboxKind::from_discriminator(" Follow "), Some(InboxKind::Follow));
        assert_eq!(InboxKind::from_discriminator("POST"), Some(InboxKind::Post));
        assert_eq!(InboxKind::from_discriminator("announce"), None);
    }
}
