//! Author entity (the federated identity of a local user).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "author")]
pub struct Model {
    /// Globally unique identity, shared with peers
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Owning login account
    #[sea_orm(unique)]
    pub user_id: String,

    pub display_name: String,

    #[sea_orm(nullable)]
    pub github_url: Option<String>,

    #[sea_orm(nullable)]
    pub profile_image: Option<String>,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
