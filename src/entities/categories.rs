use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Categories for all three content classes share one table, partitioned by
/// `(connection_id, stream_type)`.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "categories")]
pub struct Model {
    #[sea_orm(primary_key)]
    #[serde(skip_deserializing)]
    pub id: i64,
    pub connection_id: i64,
    pub category_id: String,
    pub category_name: String,
    pub parent_id: Option<i64>,
    /// One of `live`, `vod`, `series`
    pub stream_type: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
