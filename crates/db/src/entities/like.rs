//! Like entity.
//!
//! A like points at either a post or a comment. The pair
//! (`target_kind`, `target_uuid`) is exposed to callers as [`LikeTarget`].

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Which kind of object a like is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    #[sea_orm(string_value = "post")]
    Post,
    #[sea_orm(string_value = "comment")]
    Comment,
}

/// The liked object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum LikeTarget {
    Post(Uuid),
    Comment(Uuid),
}

impl LikeTarget {
    #[must_use]
    pub const fn kind(&self) -> TargetKind {
        match self {
            Self::Post(_) => TargetKind::Post,
            Self::Comment(_) => TargetKind::Comment,
        }
    }

    #[must_use]
    pub const fn uuid(&self) -> Uuid {
        match self {
            Self::Post(id) | Self::Comment(id) => *id,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "like")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Soft reference; likes arrive from remote authors too
    pub author_uuid: Uuid,

    pub target_kind: TargetKind,

    #[sea_orm(indexed)]
    pub target_uuid: Uuid,

    pub created_at: DateTimeWithTimeZone,
}

impl Model {
    /// The liked object as a tagged value.
    #[must_use]
    pub const fn target(&self) -> LikeTarget {
        match self.target_kind {
            TargetKind::Post => LikeTarget::Post(self.target_uuid),
            TargetKind::Comment => LikeTarget::Comment(self.target_uuid),
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
