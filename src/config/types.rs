// BSD 3-Clause License
// Copyright (c) 2025, ENVGATE
//
//! Configuration type definitions
//! Modes, database providers and the validated configuration record.

use std::net::SocketAddr;
use std::str::FromStr;

use serde::Serialize;
use tracing::warn;

/// Runtime mode of the process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Development,
    Production,
    Test,
}

impl Mode {
    /// Map the runtime marker to a mode. Never fails: anything unrecognized,
    /// including an absent marker, falls back to development with a warning.
    pub fn detect(raw: Option<&str>) -> Mode {
        match raw {
            Some(value) => match value.parse() {
                Ok(mode) => mode,
                Err(_) => {
                    warn!(
                        value = %value,
                        "Unrecognized runtime mode, falling back to development"
                    );
                    Mode::Development
                }
            },
            None => {
                warn!("Runtime mode not set, falling back to development");
                Mode::Development
            }
        }
    }

    pub fn is_production(&self) -> bool {
        *self == Mode::Production
    }

    pub fn is_development(&self) -> bool {
        *self == Mode::Development
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" => Ok(Mode::Development),
            "production" => Ok(Mode::Production),
            "test" => Ok(Mode::Test),
            _ => Err(format!("Unknown mode: {}", s)),
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Development => write!(f, "development"),
            Mode::Production => write!(f, "production"),
            Mode::Test => write!(f, "test"),
        }
    }
}

/// Database backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Embedded, file-backed store
    Sqlite,
    /// Hosted relational server
    Postgresql,
}

impl Provider {
    /// URL prefixes accepted for this provider
    pub fn url_prefixes(&self) -> &'static [&'static str] {
        match self {
            Provider::Sqlite => &["file:"],
            Provider::Postgresql => &["postgresql://", "postgres://"],
        }
    }

    pub fn accepts_url(&self, url: &str) -> bool {
        self.url_prefixes().iter().any(|p| url.starts_with(p))
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sqlite" => Ok(Provider::Sqlite),
            "postgresql" => Ok(Provider::Postgresql),
            _ => Err(format!("Unknown database provider: {}", s)),
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Provider::Sqlite => write!(f, "sqlite"),
            Provider::Postgresql => write!(f, "postgresql"),
        }
    }
}

/// Cloud storage integration, attached in production only
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupabaseConfig {
    pub url: String,
    pub anon_key: String,
    pub service_role_key: Option<String>,
}

/// One OAuth provider with both of its credentials present
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthProviderConfig {
    pub name: &'static str,
    pub client_id: String,
    pub client_secret: String,
}

/// Validated application configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    pub mode: Mode,
    pub database_url: String,
    pub database_provider: Provider,
    pub auth_url: String,
    pub auth_secret: String,
    pub supabase: Option<SupabaseConfig>,
    pub oauth_providers: Vec<OAuthProviderConfig>,
    /// Required names that were absent and filled from development fallbacks
    pub fallbacks: Vec<&'static str>,
}

impl Configuration {
    pub fn oauth_provider(&self, name: &str) -> Option<&OAuthProviderConfig> {
        self.oauth_providers.iter().find(|p| p.name == name)
    }

    pub fn is_degraded(&self) -> bool {
        !self.fallbacks.is_empty()
    }
}

/// HTTP server and logging settings
#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub listen_addr: SocketAddr,
    pub log_level: String,
    pub json_logs: bool,
}
