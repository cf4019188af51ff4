//! SeaORM-based database implementation
//!
//! Database-agnostic access with support for SQLite (local/dev, tests) and
//! PostgreSQL (hosted deployments). Persistence here is a plain catalog
//! store: bulk delete-by-key and bulk insert, no cross-call transactions.

use anyhow::Result;
use sea_orm::{ConnectOptions, Database as SeaOrmDatabase, DatabaseBackend, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::DatabaseConfig;

pub mod migrations;
pub mod repositories;

use migrations::Migrator;

/// Database connection manager
#[derive(Clone)]
pub struct Database {
    /// Shared connection handed to repositories
    pub connection: Arc<DatabaseConnection>,
    /// Database backend type for optimization selection
    pub backend: DatabaseBackend,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseType {
    SQLite,
    PostgreSQL,
}

impl DatabaseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DatabaseType::SQLite => "SQLite",
            DatabaseType::PostgreSQL => "PostgreSQL",
        }
    }
}

impl Database {
    /// Create a new database connection and apply backend-specific settings
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        let database_type = Self::detect_database_type(&config.url)?;
        let backend = match database_type {
            DatabaseType::SQLite => DatabaseBackend::Sqlite,
            DatabaseType::PostgreSQL => DatabaseBackend::Postgres,
        };

        info!("Connecting to {} database", database_type.as_str());

        // For SQLite, enable auto-creation of a missing database file
        let connection_url = match database_type {
            DatabaseType::SQLite => Self::ensure_sqlite_auto_creation(&config.url),
            DatabaseType::PostgreSQL => config.url.clone(),
        };

        let mut connect_options = ConnectOptions::new(&connection_url);
        connect_options
            .max_connections(config.max_connections.unwrap_or(10))
            .min_connections(1)
            .connect_timeout(Duration::from_secs(5))
            .acquire_timeout(Duration::from_secs(3))
            .idle_timeout(Duration::from_secs(600))
            .sqlx_logging(false);

        let connection = SeaOrmDatabase::connect(connect_options)
            .await
            .map_err(|e| {
                anyhow::anyhow!("Failed to connect to database at '{}': {}", config.url, e)
            })?;

        debug!("Database connection established successfully");

        Ok(Self {
            connection: Arc::new(connection),
            backend,
        })
    }

    /// Run all pending migrations
    pub async fn migrate(&self) -> Result<()> {
        info!("Running database migrations");
        Migrator::up(&*self.connection, None).await?;
        Ok(())
    }

    /// Shared connection handle for repository construction
    pub fn connection(&self) -> Arc<DatabaseConnection> {
        Arc::clone(&self.connection)
    }

    pub fn backend_name(&self) -> &'static str {
        match self.backend {
            DatabaseBackend::Sqlite => "SQLite",
            _ => "PostgreSQL",
        }
    }

    fn detect_database_type(url: &str) -> Result<DatabaseType> {
        if url.starts_with("sqlite:") {
            Ok(DatabaseType::SQLite)
        } else if url.starts_with("postgres:") || url.starts_with("postgresql:") {
            Ok(DatabaseType::PostgreSQL)
        } else {
            Err(anyhow::anyhow!(
                "Unsupported database URL '{}' (expected sqlite:// or postgres://)",
                url
            ))
        }
    }

    fn ensure_sqlite_auto_creation(url: &str) -> String {
        if url.contains("mode=") || url.contains("::memory:") {
            url.to_string()
        } else if url.contains('?') {
            format!("{url}&mode=rwc")
        } else {
            format!("{url}?mode=rwc")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_backend_from_url() {
        assert_eq!(
            Database::detect_database_type("sqlite://./relay.db").unwrap(),
            DatabaseType::SQLite
        );
        assert_eq!(
            Database::detect_database_type("postgres://localhost/relay").unwrap(),
            DatabaseType::PostgreSQL
        );
        assert!(Database::detect_database_type("mysql://localhost/relay").is_err());
    }

    #[test]
    fn sqlite_urls_gain_create_mode() {
        assert_eq!(
            Database::ensure_sqlite_auto_creation("sqlite://./relay.db"),
            "sqlite://./relay.db?mode=rwc"
        );
        assert_eq!(
            Database::ensure_sqlite_auto_creation("sqlite::memory:"),
            "sqlite::memory:"
        );
    }
}
