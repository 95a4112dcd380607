// BSD 3-Clause License
// Copyright (c) 2025, ENVGATE
//! Configuration loading from environment variables

use std::env;
use std::str::FromStr;
use std::sync::{Arc, OnceLock};

use tracing::{debug, info, warn};

use super::env::RawVariables;
use super::error::{ConfigError, ConfigIssue, MissingVariable};
use super::rules::*;
use super::types::*;

/// Build a validated [`Configuration`] from a snapshot of the environment.
///
/// Every check runs before anything is reported, so the returned error lists
/// all problems at once. Missing variables are only fatal while serving in
/// production; otherwise they are logged and filled from
/// [`DEVELOPMENT_FALLBACKS`].
pub fn load(raw: &RawVariables, mode: Mode) -> Result<Configuration, ConfigError> {
    let mut issues = Vec::new();
    let mut fallbacks: Vec<&'static str> = Vec::new();

    let missing = missing_required(raw, mode);
    if !missing.is_empty() {
        if mode.is_production() && !raw.is_build_phase() {
            issues.push(ConfigIssue::MissingVariables {
                names: missing.clone(),
            });
        } else {
            let names: Vec<String> = missing.iter().map(|m| m.to_string()).collect();
            warn!(
                mode = %mode,
                build_phase = raw.is_build_phase(),
                missing = %names.join(", "),
                "Required environment variables missing, continuing with development fallbacks"
            );
            fallbacks = missing
                .iter()
                .map(|m| m.name)
                .filter(|name| fallback_value(raw, name).is_some())
                .collect();
        }
    }

    let value = |name: &'static str| lookup(raw, &fallbacks, name);

    let provider = match value(DATABASE_PROVIDER) {
        Some(v) => match parse_provider(v) {
            Ok(p) => Some(p),
            Err(issue) => {
                issues.push(issue);
                None
            }
        },
        None => None,
    };

    if let (Some(provider), Some(url)) = (provider, value(DATABASE_URL)) {
        if let Err(issue) = check_database_url(provider, url) {
            issues.push(issue);
        }
    }

    issues.extend(check_oauth_pairs(raw));

    if !issues.is_empty() {
        return Err(ConfigError::Invalid { mode, issues });
    }

    let (Some(database_provider), Some(database_url), Some(auth_url), Some(auth_secret)) = (
        provider,
        value(DATABASE_URL),
        value(AUTH_URL),
        value(AUTH_SECRET),
    ) else {
        return Err(ConfigError::Invalid {
            mode,
            issues: vec![ConfigIssue::MissingVariables { names: missing }],
        });
    };

    let supabase = match (mode, raw.get(SUPABASE_URL), raw.get(SUPABASE_ANON_KEY)) {
        (Mode::Production, Some(url), Some(anon_key)) => Some(SupabaseConfig {
            url: url.to_string(),
            anon_key: anon_key.to_string(),
            service_role_key: raw.get(SUPABASE_SERVICE_ROLE_KEY).map(str::to_string),
        }),
        _ => None,
    };

    let oauth_providers = OAUTH_PAIRS
        .iter()
        .filter_map(|pair| match (raw.get(pair.id_var), raw.get(pair.secret_var)) {
            (Some(id), Some(secret)) => Some(OAuthProviderConfig {
                name: pair.provider,
                client_id: id.to_string(),
                client_secret: secret.to_string(),
            }),
            _ => None,
        })
        .collect::<Vec<_>>();

    let config = Configuration {
        mode,
        database_url: database_url.to_string(),
        database_provider,
        auth_url: auth_url.to_string(),
        auth_secret: auth_secret.to_string(),
        supabase,
        oauth_providers,
        fallbacks,
    };

    info!(
        mode = %config.mode,
        provider = %config.database_provider,
        oauth_providers = config.oauth_providers.len(),
        supabase = config.supabase.is_some(),
        "Configuration loaded"
    );
    Ok(config)
}

fn lookup<'a>(
    raw: &'a RawVariables,
    fallbacks: &[&'static str],
    name: &'static str,
) -> Option<&'a str> {
    raw.get(name).or_else(|| {
        if fallbacks.contains(&name) {
            fallback_value(raw, name)
        } else {
            None
        }
    })
}

/// Development substitute for `name` that agrees with whichever half of the
/// provider/URL pair is actually set.
fn fallback_value(raw: &RawVariables, name: &str) -> Option<&'static str> {
    match name {
        DATABASE_PROVIDER => match raw.get(DATABASE_URL) {
            Some(url) if Provider::Postgresql.accepts_url(url) => {
                Some(POSTGRES_DEVELOPMENT_PROVIDER)
            }
            _ => development_fallback(name),
        },
        DATABASE_URL => match raw.get(DATABASE_PROVIDER).map(str::parse::<Provider>) {
            Some(Ok(Provider::Postgresql)) => Some(POSTGRES_DEVELOPMENT_URL),
            _ => development_fallback(name),
        },
        _ => development_fallback(name),
    }
}

/// Required names for `mode` that are absent, each with any known
/// misspelling of it that is present.
pub fn missing_required(raw: &RawVariables, mode: Mode) -> Vec<MissingVariable> {
    required_for(mode)
        .into_iter()
        .filter(|name| !raw.contains(name))
        .map(|name| MissingVariable {
            name,
            found_as: typos_of(name, raw.names())
                .into_iter()
                .map(str::to_string)
                .collect(),
        })
        .collect()
}

pub fn parse_provider(value: &str) -> Result<Provider, ConfigIssue> {
    value.parse().map_err(|_| ConfigIssue::InvalidProvider {
        value: value.to_string(),
    })
}

pub fn check_database_url(provider: Provider, url: &str) -> Result<(), ConfigIssue> {
    if provider.accepts_url(url) {
        return Ok(());
    }
    Err(ConfigIssue::InvalidUrlFormat {
        provider: provider.to_string(),
        value: url.to_string(),
        expected: provider
            .url_prefixes()
            .iter()
            .map(|p| format!("'{}'", p))
            .collect::<Vec<_>>()
            .join(" or "),
    })
}

/// One issue per OAuth provider that has exactly one of its two variables.
pub fn check_oauth_pairs(raw: &RawVariables) -> Vec<ConfigIssue> {
    OAUTH_PAIRS
        .iter()
        .filter_map(|pair| {
            let id_set = raw.contains(pair.id_var);
            let (present, missing) = match (id_set, raw.contains(pair.secret_var)) {
                (true, false) => (pair.id_var, pair.secret_var),
                (false, true) => (pair.secret_var, pair.id_var),
                _ => return None,
            };
            Some(ConfigIssue::IncompleteOAuthPair {
                provider: pair.provider.to_string(),
                present: present.to_string(),
                missing: missing.to_string(),
            })
        })
        .collect()
}

/// One-shot holder for the process configuration. The first successful load
/// wins; later calls return the same instance without touching the
/// environment. Failures are not cached.
#[derive(Debug, Default)]
pub struct ConfigCache {
    cell: OnceLock<Arc<Configuration>>,
}

impl ConfigCache {
    pub const fn new() -> Self {
        Self {
            cell: OnceLock::new(),
        }
    }

    pub fn get(&self) -> Option<Arc<Configuration>> {
        self.cell.get().cloned()
    }

    pub fn get_or_load<F>(&self, load_fn: F) -> Result<Arc<Configuration>, ConfigError>
    where
        F: FnOnce() -> Result<Configuration, ConfigError>,
    {
        if let Some(config) = self.cell.get() {
            debug!("Using cached configuration");
            return Ok(config.clone());
        }
        let config = Arc::new(load_fn()?);
        Ok(self.cell.get_or_init(|| config).clone())
    }
}

impl ServerSettings {
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = env_or("ENVGATE_HOST", "0.0.0.0");
        let port = env_parse("ENVGATE_PORT", 3000u16)?;
        let listen_addr =
            format!("{}:{}", host, port)
                .parse()
                .map_err(|e| ConfigError::InvalidValue {
                    key: "ENVGATE_HOST/PORT".to_string(),
                    value: format!("{}:{}", host, port),
                    reason: format!("Invalid socket address: {}", e),
                })?;

        Ok(ServerSettings {
            host,
            port,
            listen_addr,
            log_level: env_or("ENVGATE_LOG_LEVEL", "info"),
            json_logs: env_parse("ENVGATE_JSON_LOGS", false)?,
        })
    }
}

pub fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

pub fn env_parse<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(value) => value.parse().map_err(|e| ConfigError::ParseError {
            key: key.to_string(),
            message: format!("{}", e),
        }),
        Err(_) => Ok(default),
    }
}
