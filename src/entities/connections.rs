use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "xtream_connections")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub server_url: String,
    pub username: String,
    /// Upstream secret; never serialized into responses
    #[serde(skip_serializing)]
    pub password: String,
    pub is_active: bool,
    /// JSON text blob cached from the upstream at authentication time
    #[sea_orm(column_type = "Text", nullable)]
    pub user_info: Option<String>,
    /// JSON text blob cached from the upstream at authentication time
    #[sea_orm(column_type = "Text", nullable)]
    pub server_info: Option<String>,
    pub created_at: DateTimeUtc,
    pub last_used: DateTimeUtc,
    pub last_synced_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialized_row_carries_no_password() {
        let now = chrono::Utc::now();
        let model = Model {
            id: 1,
            server_url: "http://provider.test".into(),
            username: "alice".into(),
            password: "secret".into(),
            is_active: true,
            user_info: None,
            server_info: None,
            created_at: now,
            last_used: now,
            last_synced_at: None,
        };
        let value = serde_json::to_value(&model).unwrap();
        assert!(value.get("password").is_none());
        assert_eq!(value["username"], "alice");
    }
}
