// BSD 3-Clause License
// Copyright (c) 2025, ENVGATE
//
//! Connection settings derived from the loaded configuration

use serde::Serialize;

use crate::config::{Configuration, Mode, Provider};
use crate::errors::DatabaseError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatabaseSettings {
    pub provider: Provider,
    pub url: String,
    pub connection_limit: Option<u32>,
    pub ssl: Option<bool>,
}

impl DatabaseSettings {
    pub fn from_config(config: &Configuration) -> Self {
        let (connection_limit, ssl) = match (config.database_provider, config.mode) {
            (Provider::Postgresql, Mode::Production) => (Some(10), Some(true)),
            (Provider::Postgresql, _) => (Some(5), None),
            (Provider::Sqlite, _) => (None, None),
        };
        Self {
            provider: config.database_provider,
            url: config.database_url.clone(),
            connection_limit,
            ssl,
        }
    }

    /// Pool size: SQLite gets a single connection so in-memory databases are
    /// shared across queries.
    pub fn max_connections(&self) -> u32 {
        match self.provider {
            Provider::Sqlite => 1,
            Provider::Postgresql => self.connection_limit.unwrap_or(5),
        }
    }

    /// URL in the form the sqlx drivers accept.
    pub fn driver_url(&self) -> Result<String, DatabaseError> {
        match self.provider {
            Provider::Sqlite => {
                let path = self
                    .url
                    .strip_prefix("file:")
                    .ok_or_else(|| DatabaseError::UnsupportedUrl(self.url.clone()))?;
                if path == ":memory:" {
                    return Ok("sqlite::memory:".to_string());
                }
                let sep = if path.contains('?') { '&' } else { '?' };
                Ok(format!("sqlite:{}{}mode=rwc", path, sep))
            }
            Provider::Postgresql => {
                if !self.provider.accepts_url(&self.url) {
                    return Err(DatabaseError::UnsupportedUrl(self.url.clone()));
                }
                if self.ssl == Some(true) && !self.url.contains("sslmode=") {
                    let sep = if self.url.contains('?') { '&' } else { '?' };
                    Ok(format!("{}{}sslmode=require", self.url, sep))
                } else {
                    Ok(self.url.clone())
                }
            }
        }
    }
}
