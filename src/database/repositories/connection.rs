//! Repository for stored upstream connections

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use std::sync::Arc;

use crate::entities::{connections, prelude::Connections};
use crate::errors::RepositoryError;
use crate::models::Connection;

/// Repository for `xtream_connections` rows
#[derive(Clone)]
pub struct ConnectionRepository {
    connection: Arc<DatabaseConnection>,
}

impl ConnectionRepository {
    pub fn new(connection: Arc<DatabaseConnection>) -> Self {
        Self { connection }
    }

    /// Find a connection by id
    pub async fn find_by_id(&self, id: i64) -> Result<Option<Connection>, RepositoryError> {
        let model = Connections::find_by_id(id).one(&*self.connection).await?;
        Ok(model.map(model_to_domain))
    }

    /// List all stored connections, newest first
    pub async fn list(&self) -> Result<Vec<Connection>, RepositoryError> {
        let models = Connections::find()
            .order_by_desc(connections::Column::CreatedAt)
            .all(&*self.connection)
            .await?;
        Ok(models.into_iter().map(model_to_domain).collect())
    }

    /// Create or refresh a connection after a successful upstream
    /// authentication. Matched on `(server_url, username)`; the cached
    /// info blobs and `last_used` are refreshed on every call.
    pub async fn upsert_from_auth(
        &self,
        server_url: &str,
        username: &str,
        password: &str,
        user_info: &serde_json::Value,
        server_info: &serde_json::Value,
    ) -> Result<Connection, RepositoryError> {
        let now = Utc::now();
        let user_info_text = serde_json::to_string(user_info)?;
        let server_info_text = serde_json::to_string(server_info)?;

        let existing = Connections::find()
            .filter(connections::Column::ServerUrl.eq(server_url))
            .filter(connections::Column::Username.eq(username))
            .one(&*self.connection)
            .await?;

        let model = match existing {
            Some(model) => {
                let mut active: connections::ActiveModel = model.into();
                active.password = Set(password.to_string());
                active.is_active = Set(true);
                active.user_info = Set(Some(user_info_text));
                active.server_info = Set(Some(server_info_text));
                active.last_used = Set(now);
                active.update(&*self.connection).await?
            }
            None => {
                let active = connections::ActiveModel {
                    server_url: Set(server_url.to_string()),
                    username: Set(username.to_string()),
                    password: Set(password.to_string()),
                    is_active: Set(true),
                    user_info: Set(Some(user_info_text)),
                    server_info: Set(Some(server_info_text)),
                    created_at: Set(now),
                    last_used: Set(now),
                    last_synced_at: Set(None),
                    ..Default::default()
                };
                active.insert(&*self.connection).await?
            }
        };

        Ok(model_to_domain(model))
    }

    /// Record a completed sync for the connection
    pub async fn touch_synced(&self, id: i64) -> Result<(), RepositoryError> {
        let Some(model) = Connections::find_by_id(id).one(&*self.connection).await? else {
            return Err(RepositoryError::RecordNotFound {
                table: "xtream_connections".to_string(),
                field: "id".to_string(),
                value: id.to_string(),
            });
        };

        let now = Utc::now();
        let mut active: connections::ActiveModel = model.into();
        active.last_synced_at = Set(Some(now));
        active.last_used = Set(now);
        active.update(&*self.connection).await?;
        Ok(())
    }
}

fn model_to_domain(model: connections::Model) -> Connection {
    Connection {
        id: model.id,
        server_url: model.server_url,
        username: model.username,
        password: model.password,
        is_active: model.is_active,
        user_info: model.user_info,
        server_info: model.server_info,
        created_at: model.created_at,
        last_used: model.last_used,
        last_synced_at: model.last_synced_at,
    }
}
