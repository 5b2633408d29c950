//! Post entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Encoding of a post or comment body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum ContentType {
    #[sea_orm(string_value = "text/plain")]
    #[serde(rename = "text/plain")]
    Plain,
    #[sea_orm(string_value = "text/markdown")]
    #[serde(rename = "text/markdown")]
    Markdown,
    #[sea_orm(string_value = "application/base64")]
    #[serde(rename = "application/base64")]
    Base64,
    #[sea_orm(string_value = "image/png;base64")]
    #[serde(rename = "image/png;base64")]
    ImagePng,
    #[sea_orm(string_value = "image/jpeg;base64")]
    #[serde(rename = "image/jpeg;base64")]
    ImageJpeg,
}

/// Who may see a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "UPPERCASE")]
pub enum Visibility {
    #[sea_orm(string_value = "PUBLIC")]
    Public,
    #[sea_orm(string_value = "FRIENDS")]
    Friends,
    #[sea_orm(string_value = "PRIVATE")]
    Private,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "post")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Owning local author
    #[sea_orm(indexed)]
    pub author_id: Uuid,

    pub content_type: ContentType,

    pub title: String,

    #[sea_orm(column_type = "Text")]
    pub description: String,

    #[sea_orm(column_type = "Text")]
    pub content: String,

    /// JSON list of non-empty strings
    #[sea_orm(column_type = "JsonBinary")]
    pub categories: Json,

    pub visibility: Visibility,

    /// Addressee of a PRIVATE post
    #[sea_orm(nullable, indexed)]
    pub recipient_id: Option<Uuid>,

    #[sea_orm(default_value = false)]
    pub unlisted: bool,

    /// Where a reshare was taken from
    #[sea_orm(nullable)]
    pub source: Option<String>,

    /// Where a reshare originally came from
    #[sea_orm(nullable)]
    pub origin: Option<String>,

    pub published: DateTimeWithTimeZone,
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
