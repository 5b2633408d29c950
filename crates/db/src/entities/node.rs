//! Node entity (a registered federation peer).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "node")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Base URL of the peer, e.g. `https://peer.example`
    #[sea_orm(unique)]
    pub host: String,

    #[sea_orm(nullable)]
    pub display_name: Option<String>,

    /// Path segment between the host and the API endpoints
    pub prefix: String,

    /// Credentials the peer presents to us
    #[sea_orm(unique)]
    pub auth_username: String,
    #[serde(skip_serializing)]
    pub auth_password: String,

    /// Credentials we present to the peer
    pub node_username: String,
    #[serde(skip_serializing)]
    pub node_password: String,

    /// Adapter tag, resolved through the adapter registry
    pub adapter: String,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
