// BSD 3-Clause License
// Copyright (c) 2025, ENVGATE
//
//! Database connection pool

use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use sqlx::{any::AnyPoolOptions, AnyPool};
use tracing::{debug, info};

use super::settings::DatabaseSettings;
use crate::errors::DatabaseError;

/// Storage collaborator handed the validated database settings
#[async_trait]
pub trait PersistenceClient: Send + Sync {
    async fn connect(&self) -> Result<(), DatabaseError>;
    async fn disconnect(&self);
    /// Run a statement, returning the number of affected rows.
    async fn execute(&self, sql: &str) -> Result<u64, DatabaseError>;
    fn is_connected(&self) -> bool;
}

/// [`PersistenceClient`] over a sqlx `AnyPool`, covering SQLite and PostgreSQL.
pub struct SqlxClient {
    settings: DatabaseSettings,
    pool: RwLock<Option<AnyPool>>,
}

impl SqlxClient {
    pub fn new(settings: DatabaseSettings) -> Self {
        sqlx::any::install_default_drivers();
        Self {
            settings,
            pool: RwLock::new(None),
        }
    }

    pub fn settings(&self) -> &DatabaseSettings {
        &self.settings
    }

    fn pool(&self) -> Result<AnyPool, DatabaseError> {
        self.pool.read().clone().ok_or(DatabaseError::NotConnected)
    }
}

#[async_trait]
impl PersistenceClient for SqlxClient {
    async fn connect(&self) -> Result<(), DatabaseError> {
        if self.is_connected() {
            return Ok(());
        }
        let url = self.settings.driver_url()?;
        info!(provider = %self.settings.provider, "Connecting to database...");
        let pool = AnyPoolOptions::new()
            .max_connections(self.settings.max_connections())
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(600))
            .connect(&url)
            .await?;
        *self.pool.write() = Some(pool);
        info!(provider = %self.settings.provider, "Database connection pool established");
        Ok(())
    }

    async fn disconnect(&self) {
        let pool = self.pool.write().take();
        if let Some(pool) = pool {
            pool.close().await;
            info!("Database connection pool closed");
        }
    }

    async fn execute(&self, sql: &str) -> Result<u64, DatabaseError> {
        let pool = self.pool()?;
        debug!(sql = %sql, "Executing statement");
        let result = sqlx::query(sql).execute(&pool).await?;
        Ok(result.rows_affected())
    }

    fn is_connected(&self) -> bool {
        self.pool.read().as_ref().is_some_and(|p| !p.is_closed())
    }
}
