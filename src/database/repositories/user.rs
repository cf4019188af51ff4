//! Repository for application user accounts

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::entities::{prelude::Users, users};
use crate::errors::RepositoryError;

/// SeaORM-based repository for user accounts
#[derive(Clone)]
pub struct UserRepository {
    connection: Arc<DatabaseConnection>,
}

impl UserRepository {
    pub fn new(connection: Arc<DatabaseConnection>) -> Self {
        Self { connection }
    }

    /// Create a new user with an already-hashed password
    pub async fn create(
        &self,
        username: &str,
        email: Option<&str>,
        password_hash: &str,
    ) -> Result<users::Model, RepositoryError> {
        let model = users::ActiveModel {
            id: Set(Uuid::new_v4()),
            username: Set(username.to_string()),
            email: Set(email.map(str::to_string)),
            password_hash: Set(password_hash.to_string()),
            created_at: Set(Utc::now()),
        };
        let saved = model.insert(&*self.connection).await?;
        Ok(saved)
    }

    pub async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<users::Model>, RepositoryError> {
        let found = Users::find()
            .filter(users::Column::Username.eq(username))
            .one(&*self.connection)
            .await?;
        Ok(found)
    }
}
