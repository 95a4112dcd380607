// BSD 3-Clause License
// Copyright (c) 2025, ENVGATE
//
//! ENVGATE Configuration Module
//! Mode detection, the rule table, the configuration loader and the runtime
//! validator. The process-wide configuration is loaded once through
//! [`current`], which runs the startup gate the first time it is touched.

mod env;
mod error;
mod loader;
pub mod rules;
mod types;
mod validation;

use std::sync::{Arc, OnceLock};

use crate::gate::startup::{self, StartupDecision};

pub use env::RawVariables;
pub use error::{ConfigError, ConfigIssue, IssueKind, MissingVariable};
pub use loader::{
    check_database_url, check_oauth_pairs, env_or, env_parse, load, missing_required,
    parse_provider, ConfigCache,
};
pub use types::{
    Configuration, Mode, OAuthProviderConfig, Provider, ServerSettings, SupabaseConfig,
};
pub use validation::{validate, Issue, ValidationCache, ValidationResult};

/// Process-wide caches plus the once-only startup hook and its decision.
#[derive(Debug)]
pub struct ProcessConfig {
    config: ConfigCache,
    validation: ValidationCache,
    startup: OnceLock<Option<StartupDecision>>,
}

impl ProcessConfig {
    pub const fn new() -> Self {
        Self {
            config: ConfigCache::new(),
            validation: ValidationCache::new(),
            startup: OnceLock::new(),
        }
    }

    /// Run `gate` the first time only, then load (or return the cached)
    /// configuration as far as the gate's decision allows.
    pub fn current_with<F>(
        &self,
        raw: &RawVariables,
        gate: F,
    ) -> Result<Arc<Configuration>, ConfigError>
    where
        F: FnOnce(&RawVariables) -> Option<StartupDecision>,
    {
        let decision = self.startup.get_or_init(|| gate(raw));
        self.config
            .get_or_load(|| startup::load_for(raw, detect_mode(raw), decision.as_ref()))
    }

    pub fn validation(&self, raw: &RawVariables) -> Arc<ValidationResult> {
        self.validation.get_or_validate(raw, detect_mode(raw))
    }
}

static PROCESS: ProcessConfig = ProcessConfig::new();

/// Mode of the current process, read from the runtime marker.
pub fn detect_mode(raw: &RawVariables) -> Mode {
    Mode::detect(raw.get(rules::MODE_VAR))
}

/// Process-wide configuration. The first call runs the startup gate and
/// loads the configuration; later calls return the cached instance.
pub fn current() -> Result<Arc<Configuration>, ConfigError> {
    let raw = RawVariables::from_process();
    PROCESS.current_with(&raw, startup::run_at_startup)
}

/// Process-wide validation result, computed once.
pub fn validation(raw: &RawVariables) -> Arc<ValidationResult> {
    PROCESS.validation(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_mode_parsing() {
        assert_eq!("production".parse::<Mode>().unwrap(), Mode::Production);
        assert_eq!("PRODUCTION".parse::<Mode>().unwrap(), Mode::Production);
        assert_eq!("Test".parse::<Mode>().unwrap(), Mode::Test);
        assert!("prod".parse::<Mode>().is_err());
    }

    #[test]
    fn test_detect_is_total() {
        assert_eq!(Mode::detect(Some("Production")), Mode::Production);
        assert_eq!(Mode::detect(Some("development")), Mode::Development);
        assert_eq!(Mode::detect(Some("TEST")), Mode::Test);
        assert_eq!(Mode::detect(Some(" test ")), Mode::Development);
        assert_eq!(Mode::detect(Some("staging")), Mode::Development);
        assert_eq!(Mode::detect(Some("")), Mode::Development);
        assert_eq!(Mode::detect(None), Mode::Development);
    }

    #[test]
    fn test_mode_display() {
        assert_eq!(Mode::Production.to_string(), "production");
        assert_eq!(Mode::Development.to_string(), "development");
        assert_eq!(Provider::Postgresql.to_string(), "postgresql");
    }

    fn dev_vars() -> RawVariables {
        RawVariables::new()
            .with("NODE_ENV", "development")
            .with("DATABASE_PROVIDER", "sqlite")
            .with("DATABASE_URL", "file:./dev.db")
            .with("NEXTAUTH_URL", "http://localhost:3000")
            .with("NEXTAUTH_SECRET", "x")
    }

    fn development_gate(raw: &RawVariables) -> Option<StartupDecision> {
        Some(startup::evaluate(
            &validate(raw, Mode::Development),
            Mode::Development,
        ))
    }

    #[test]
    fn test_startup_runs_once_and_configuration_is_shared() {
        let process = ProcessConfig::new();
        let runs = AtomicU32::new(0);
        let gate = |raw: &RawVariables| {
            runs.fetch_add(1, Ordering::SeqCst);
            development_gate(raw)
        };

        let first = process.current_with(&dev_vars(), gate).unwrap();
        let changed = dev_vars().with("DATABASE_URL", "file:./other.db");
        let second = process.current_with(&changed, gate).unwrap();

        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.database_url, "file:./dev.db");
    }

    #[test]
    fn test_failed_load_retries_without_rerunning_startup() {
        let process = ProcessConfig::new();
        let runs = AtomicU32::new(0);
        let gate = |raw: &RawVariables| {
            runs.fetch_add(1, Ordering::SeqCst);
            development_gate(raw)
        };

        let bad = dev_vars().with("DATABASE_PROVIDER", "mysql");
        assert!(process.current_with(&bad, gate).is_err());
        assert!(process.current_with(&dev_vars(), gate).is_ok());
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_tolerated_startup_yields_configuration() {
        let process = ProcessConfig::new();
        let raw = dev_vars().with("GOOGLE_CLIENT_ID", "id");
        assert!(load(&raw, Mode::Development).is_err());

        let config = process.current_with(&raw, development_gate).unwrap();
        assert!(config.oauth_providers.is_empty());
    }

    #[test]
    fn test_validation_is_memoized() {
        let process = ProcessConfig::new();
        let bad = dev_vars().with("DATABASE_PROVIDER", "mysql");
        let first = process.validation(&bad);
        let second = process.validation(&dev_vars());
        assert!(!first.is_valid);
        assert!(Arc::ptr_eq(&first, &second));

        assert!(Arc::ptr_eq(&validation(&bad), &validation(&dev_vars())));
    }

    #[test]
    fn test_detect_mode_reads_marker() {
        let raw = RawVariables::new().with("NODE_ENV", "test");
        assert_eq!(detect_mode(&raw), Mode::Test);
        assert_eq!(detect_mode(&RawVariables::new()), Mode::Development);
    }
}
