// BSD 3-Clause License
// Copyright (c) 2025, ENVGATE
//
//! Startup gate
//!
//! Validates the environment once before the process starts serving. In
//! development only errors touching the core database/auth variables stop
//! the process; in production and test any error does.

use tracing::{error, info, warn};

use crate::config::{
    self, rules::CRITICAL_KEYWORDS, ConfigError, ConfigIssue, Configuration, IssueKind, Mode,
    RawVariables, ValidationResult,
};
use crate::report::Summary;

/// What the process should do after startup validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartupDecision {
    Proceed,
    /// Development with only non-critical errors
    ProceedWithErrors { non_critical: Vec<String> },
    Abort { errors: Vec<String> },
}

impl StartupDecision {
    pub fn exit_code(&self) -> i32 {
        match self {
            StartupDecision::Abort { .. } => 1,
            _ => 0,
        }
    }
}

pub fn is_critical(message: &str) -> bool {
    CRITICAL_KEYWORDS.iter().any(|k| message.contains(k))
}

/// Decide how to proceed given a validation result.
pub fn evaluate(result: &ValidationResult, mode: Mode) -> StartupDecision {
    if result.is_valid {
        return StartupDecision::Proceed;
    }
    let errors = result.error_messages();
    match mode {
        Mode::Development => {
            let (critical, non_critical): (Vec<String>, Vec<String>) =
                errors.into_iter().partition(|e| is_critical(e));
            if critical.is_empty() {
                StartupDecision::ProceedWithErrors { non_critical }
            } else {
                StartupDecision::Abort { errors: critical }
            }
        }
        Mode::Production | Mode::Test => StartupDecision::Abort { errors },
    }
}

/// Validate and log. Returns `None` when running in the build phase, where
/// the gate does not apply.
pub fn check(raw: &RawVariables) -> Option<StartupDecision> {
    if raw.is_build_phase() {
        info!("Build phase detected, skipping startup validation");
        return None;
    }

    let mode = config::detect_mode(raw);
    let result = config::validation(raw);
    let decision = evaluate(&result, mode);

    match &decision {
        StartupDecision::Proceed => {
            Summary::new(raw, mode, &result).log();
            for warning in &result.warnings {
                warn!(mode = %mode, "{}", warning);
            }
        }
        StartupDecision::ProceedWithErrors { non_critical } => {
            Summary::new(raw, mode, &result).log();
            for message in non_critical {
                warn!(mode = %mode, "Non-critical configuration error: {}", message);
            }
            for warning in &result.warnings {
                warn!(mode = %mode, "{}", warning);
            }
        }
        StartupDecision::Abort { errors } => {
            for message in errors {
                error!(mode = %mode, "Configuration error: {}", message);
            }
            error!(
                mode = %mode,
                errors = errors.len(),
                "Environment validation failed, refusing to start"
            );
        }
    }
    Some(decision)
}

/// Run the gate and terminate the process on a fatal result.
pub fn run_at_startup(raw: &RawVariables) -> Option<StartupDecision> {
    let decision = check(raw)?;
    if let StartupDecision::Abort { .. } = decision {
        std::process::exit(decision.exit_code());
    }
    Some(decision)
}

/// Load the configuration the startup decision allows. When startup went
/// ahead despite non-critical errors, half-configured OAuth providers are
/// dropped and the rest is loaded.
pub fn load_for(
    raw: &RawVariables,
    mode: Mode,
    decision: Option<&StartupDecision>,
) -> Result<Configuration, ConfigError> {
    let err = match config::load(raw, mode) {
        Ok(config) => return Ok(config),
        Err(err) => err,
    };
    let tolerated = matches!(decision, Some(StartupDecision::ProceedWithErrors { .. }))
        && !err.issues().is_empty()
        && err
            .issues()
            .iter()
            .all(|issue| issue.kind() == IssueKind::IncompleteOAuthPair);
    if !tolerated {
        return Err(err);
    }

    let mut reduced = raw.clone();
    for issue in err.issues() {
        if let ConfigIssue::IncompleteOAuthPair {
            provider, present, ..
        } = issue
        {
            warn!(mode = %mode, provider = %provider, "{}; provider disabled", issue);
            reduced.remove(present);
        }
    }
    config::load(&reduced, mode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::validate;

    fn dev_vars() -> RawVariables {
        RawVariables::new()
            .with("NODE_ENV", "development")
            .with("DATABASE_PROVIDER", "sqlite")
            .with("DATABASE_URL", "file:./dev.db")
            .with("NEXTAUTH_URL", "http://localhost:3000")
            .with("NEXTAUTH_SECRET", "x")
    }

    #[test]
    fn test_valid_proceeds() {
        let result = validate(&dev_vars(), Mode::Development);
        assert_eq!(evaluate(&result, Mode::Development), StartupDecision::Proceed);
    }

    #[test]
    fn test_development_tolerates_non_critical_errors() {
        let raw = dev_vars().with("GITHUB_CLIENT_ID", "id");
        let result = validate(&raw, Mode::Development);
        assert!(!result.is_valid);
        match evaluate(&result, Mode::Development) {
            StartupDecision::ProceedWithErrors { non_critical } => {
                assert_eq!(non_critical.len(), 1);
                assert!(non_critical[0].contains("GITHUB_CLIENT_SECRET"));
            }
            other => panic!("unexpected decision {:?}", other),
        }
    }

    #[test]
    fn test_development_aborts_on_critical_errors() {
        let raw = dev_vars()
            .with("GITHUB_CLIENT_ID", "id")
            .with("DATABASE_PROVIDER", "postgresql");
        let result = validate(&raw, Mode::Development);
        let decision = evaluate(&result, Mode::Development);
        assert_eq!(decision.exit_code(), 1);
        match decision {
            StartupDecision::Abort { errors } => {
                assert_eq!(errors.len(), 1);
                assert!(errors[0].contains("DATABASE_URL"));
            }
            other => panic!("unexpected decision {:?}", other),
        }
    }

    #[test]
    fn test_production_and_test_abort_on_any_error() {
        let raw = dev_vars().with("GITHUB_CLIENT_ID", "id");
        for mode in [Mode::Test, Mode::Production] {
            let result = validate(&raw, mode);
            assert!(matches!(
                evaluate(&result, mode),
                StartupDecision::Abort { .. }
            ));
        }
    }

    #[test]
    fn test_build_phase_skips_gate() {
        let raw = RawVariables::new()
            .with("NODE_ENV", "production")
            .with("NEXT_PHASE", "phase-production-build");
        assert_eq!(check(&raw), None);
    }

    #[test]
    fn test_tolerated_startup_always_loads() {
        let environments = [
            dev_vars().with("GOOGLE_CLIENT_ID", "id"),
            dev_vars().with("GITHUB_CLIENT_SECRET", "secret"),
            dev_vars().with("GOOGLE_CLIENTID", "id"),
            dev_vars().with("STRIPE_SECRET", "sk"),
        ];
        for raw in environments {
            let result = validate(&raw, Mode::Development);
            let decision = evaluate(&result, Mode::Development);
            assert_eq!(decision.exit_code(), 0, "{:?}", result.errors);
            let config = load_for(&raw, Mode::Development, Some(&decision));
            assert!(config.is_ok(), "{:?} but load failed: {:?}", decision, config);
        }
    }

    #[test]
    fn test_tolerated_oauth_pair_is_disabled() {
        let raw = dev_vars()
            .with("GOOGLE_CLIENT_ID", "id")
            .with("GITHUB_CLIENT_ID", "gh-id")
            .with("GITHUB_CLIENT_SECRET", "gh-secret");
        let decision = evaluate(&validate(&raw, Mode::Development), Mode::Development);
        assert!(matches!(decision, StartupDecision::ProceedWithErrors { .. }));

        let config = load_for(&raw, Mode::Development, Some(&decision)).unwrap();
        assert!(config.oauth_provider("google").is_none());
        assert!(config.oauth_provider("github").is_some());
    }

    #[test]
    fn test_untolerated_errors_still_fail_to_load() {
        let raw = dev_vars().with("GOOGLE_CLIENT_ID", "id");
        assert!(load_for(&raw, Mode::Development, None).is_err());
        assert!(load_for(&raw, Mode::Development, Some(&StartupDecision::Proceed)).is_err());

        let raw = dev_vars().with("DATABASE_PROVIDER", "mysql");
        let decision = evaluate(&validate(&raw, Mode::Development), Mode::Development);
        assert!(matches!(decision, StartupDecision::Abort { .. }));
        assert!(load_for(&raw, Mode::Development, Some(&decision)).is_err());
    }

    #[test]
    fn test_is_critical() {
        assert!(is_critical("NEXTAUTH_SECRET is required but not set"));
        assert!(!is_critical("Incomplete google OAuth configuration"));
    }
}
