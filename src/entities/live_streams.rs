use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "live_streams")]
pub struct Model {
    #[sea_orm(primary_key)]
    #[serde(skip_deserializing)]
    pub id: i64,
    pub connection_id: i64,
    pub stream_id: i64,
    pub name: String,
    pub stream_icon: Option<String>,
    /// Kept as text; upstream servers disagree on string vs number
    pub category_id: Option<String>,
    pub epg_channel_id: Option<String>,
    pub added: Option<String>,
    pub is_adult: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
