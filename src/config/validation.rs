// BSD 3-Clause License
// Copyright (c) 2025, ENVGATE
//
//! Runtime validation
//! Mode-aware checks that never fail themselves; they collect errors and
//! warnings and leave the severity decision to the caller.

use std::collections::HashSet;
use std::sync::{Arc, OnceLock};

use serde::Serialize;
use tracing::debug;
use url::Url;

use super::env::RawVariables;
use super::error::IssueKind;
use super::loader::{check_database_url, check_oauth_pairs, missing_required, parse_provider};
use super::rules::*;
use super::types::{Mode, Provider};

/// A single finding with its category
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub kind: IssueKind,
    pub message: String,
}

impl std::fmt::Display for Issue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Outcome of one validation pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<Issue>,
    pub warnings: Vec<Issue>,
}

impl ValidationResult {
    fn error(&mut self, kind: IssueKind, message: impl Into<String>) {
        self.errors.push(Issue {
            kind,
            message: message.into(),
        });
    }

    fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(Issue {
            kind: IssueKind::Advisory,
            message: message.into(),
        });
    }

    pub fn error_messages(&self) -> Vec<String> {
        self.errors.iter().map(|i| i.message.clone()).collect()
    }

    pub fn warning_messages(&self) -> Vec<String> {
        self.warnings.iter().map(|i| i.message.clone()).collect()
    }

    pub fn has_error(&self, kind: IssueKind) -> bool {
        self.errors.iter().any(|i| i.kind == kind)
    }
}

/// Run every rule for `mode` against `raw`.
pub fn validate(raw: &RawVariables, mode: Mode) -> ValidationResult {
    let mut result = ValidationResult::default();

    let reported_typos = check_required(raw, mode, &mut result);
    let provider = check_database(raw, &mut result);
    for issue in check_oauth_pairs(raw) {
        result.error(issue.kind(), issue.to_string());
    }
    let auth_url = check_auth_url(raw, &mut result);

    match mode {
        Mode::Development => check_development(raw, provider, &mut result),
        Mode::Production => check_production(raw, provider, auth_url.as_ref(), &mut result),
        Mode::Test => {}
    }

    check_typos(raw, &reported_typos, &mut result);
    check_unknown_secrets(raw, &mut result);

    result.is_valid = result.errors.is_empty();
    debug!(
        mode = %mode,
        errors = result.errors.len(),
        warnings = result.warnings.len(),
        "Environment validation finished"
    );
    result
}

/// Missing required variables. A missing name whose misspelling is present
/// is reported once, as a typo; the misspellings are returned so the typo
/// scan does not repeat them.
fn check_required(
    raw: &RawVariables,
    mode: Mode,
    result: &mut ValidationResult,
) -> HashSet<String> {
    let mut reported = HashSet::new();
    for missing in missing_required(raw, mode) {
        if missing.found_as.is_empty() {
            let scope = if PRODUCTION_REQUIRED.contains(&missing.name) {
                " in production"
            } else {
                ""
            };
            result.error(
                IssueKind::MissingVariable,
                format!("{} is required{} but not set", missing.name, scope),
            );
        } else {
            result.error(
                IssueKind::TypoDetected,
                format!(
                    "{} is not set, but {} is: rename it to {}",
                    missing.name,
                    missing.found_as.join(", "),
                    missing.name
                ),
            );
            reported.extend(missing.found_as);
        }
    }
    reported
}

fn check_database(raw: &RawVariables, result: &mut ValidationResult) -> Option<Provider> {
    let provider = match raw.get(DATABASE_PROVIDER).map(parse_provider) {
        Some(Ok(provider)) => provider,
        Some(Err(issue)) => {
            result.error(issue.kind(), issue.to_string());
            return None;
        }
        None => return None,
    };
    if let Some(url) = raw.get(DATABASE_URL) {
        if let Err(issue) = check_database_url(provider, url) {
            result.error(issue.kind(), issue.to_string());
        }
    }
    Some(provider)
}

fn check_auth_url(raw: &RawVariables, result: &mut ValidationResult) -> Option<Url> {
    let value = raw.get(AUTH_URL)?;
    match Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => Some(url),
        _ => {
            result.error(
                IssueKind::InvalidUrlFormat,
                format!(
                    "{} '{}' is not a valid absolute http(s) URL",
                    AUTH_URL, value
                ),
            );
            None
        }
    }
}

fn check_development(
    raw: &RawVariables,
    provider: Option<Provider>,
    result: &mut ValidationResult,
) {
    if provider == Some(Provider::Postgresql) {
        if let Some(host) = raw.get(DATABASE_URL).and_then(managed_database_host) {
            result.warn(format!(
                "DATABASE_URL points at a managed cloud database ({}) in development; \
                 consider DATABASE_PROVIDER=sqlite with DATABASE_URL=file:./dev.db",
                host
            ));
        }
    }

    if let Some(secret) = raw.get(AUTH_SECRET) {
        if secret.len() > MAX_DEVELOPMENT_SECRET_LEN {
            result.warn(format!(
                "{} looks like a production secret ({} characters); \
                 use a separate, shorter secret for development",
                AUTH_SECRET,
                secret.len()
            ));
        }
    }

    if provider == Some(Provider::Sqlite) {
        let leftovers: Vec<&str> = [SUPABASE_URL, SUPABASE_ANON_KEY, SUPABASE_SERVICE_ROLE_KEY]
            .into_iter()
            .filter(|name| raw.contains(name))
            .collect();
        if !leftovers.is_empty() {
            result.warn(format!(
                "Supabase configuration ({}) is set while DATABASE_PROVIDER=sqlite; \
                 it is probably left over and can be removed",
                leftovers.join(", ")
            ));
        }
    }
}

fn check_production(
    raw: &RawVariables,
    provider: Option<Provider>,
    auth_url: Option<&Url>,
    result: &mut ValidationResult,
) {
    if let Some(url) = raw.get(DATABASE_URL) {
        if url.starts_with("file:") {
            result.error(
                IssueKind::InsecureProductionValue,
                "DATABASE_URL points at a SQLite file (file:), which is not allowed in production; \
                 use DATABASE_PROVIDER=postgresql",
            );
        }
    }

    let loopback = auth_url.is_some_and(is_loopback);
    if let Some(url) = auth_url {
        if loopback {
            result.error(
                IssueKind::InsecureProductionValue,
                format!(
                    "{} uses a loopback host ({}) in production; set it to the public URL",
                    AUTH_URL,
                    url.host_str().unwrap_or_default()
                ),
            );
        }
        if url.scheme() != "https" {
            result.error(
                IssueKind::InsecureProductionValue,
                format!("{} must use https in production", AUTH_URL),
            );
        }
    }

    if let Some(secret) = raw.get(AUTH_SECRET) {
        if secret.len() < MIN_PRODUCTION_SECRET_LEN {
            result.error(
                IssueKind::InsecureProductionValue,
                format!(
                    "{} must be at least {} characters in production (got {})",
                    AUTH_SECRET,
                    MIN_PRODUCTION_SECRET_LEN,
                    secret.len()
                ),
            );
        }
        if PLACEHOLDER_SECRET.is_match(secret) {
            result.error(
                IssueKind::InsecureProductionValue,
                format!(
                    "{} looks like a placeholder or development value; generate a random secret",
                    AUTH_SECRET
                ),
            );
        }
    }

    if loopback {
        let configured: Vec<&str> = OAUTH_PAIRS
            .iter()
            .filter(|p| raw.contains(p.id_var) || raw.contains(p.secret_var))
            .map(|p| p.provider)
            .collect();
        if !configured.is_empty() {
            result.error(
                IssueKind::InsecureProductionValue,
                format!(
                    "OAuth providers ({}) are configured while {} is a loopback address; \
                     callbacks will not reach production",
                    configured.join(", "),
                    AUTH_URL
                ),
            );
        }
    }

    if provider == Some(Provider::Postgresql) {
        if !raw.contains(SUPABASE_SERVICE_ROLE_KEY) {
            result.warn(format!(
                "{} is not set; server-side Supabase administration is unavailable",
                SUPABASE_SERVICE_ROLE_KEY
            ));
        }
        if raw.get(DATABASE_URL).is_some_and(|url| !url.contains("sslmode=")) {
            result.warn(
                "DATABASE_URL has no sslmode parameter; consider sslmode=require in production",
            );
        }
    }
}

fn check_typos(
    raw: &RawVariables,
    already_reported: &HashSet<String>,
    result: &mut ValidationResult,
) {
    for name in raw.names() {
        if already_reported.contains(name) {
            continue;
        }
        let Some(canonical) = KNOWN_TYPOS.get(name) else {
            continue;
        };
        let message = if raw.contains(canonical) {
            format!(
                "{} looks like a misspelling of {} ({} is also set; remove {})",
                name, canonical, canonical, name
            )
        } else {
            format!(
                "{} looks like a misspelling of {}; rename it to {}",
                name, canonical, canonical
            )
        };
        result.error(IssueKind::TypoDetected, message);
    }
}

fn check_unknown_secrets(raw: &RawVariables, result: &mut ValidationResult) {
    for name in raw.names() {
        if !looks_secret(name)
            || KNOWN_SECRET_VARS.contains(&name)
            || KNOWN_TYPOS.contains_key(name)
        {
            continue;
        }
        if name.starts_with("NEXT_PUBLIC_") {
            result.warn(format!(
                "{} looks like a secret but carries the NEXT_PUBLIC_ prefix, \
                 which exposes it to the browser",
                name
            ));
        } else {
            result.warn(format!(
                "{} looks like a secret but is not used by this application; \
                 make sure it is intentional",
                name
            ));
        }
    }
}

fn managed_database_host(url: &str) -> Option<String> {
    let host = Url::parse(url).ok()?.host_str()?.to_string();
    MANAGED_DATABASE_HOSTS
        .iter()
        .any(|managed| host == *managed || host.ends_with(&format!(".{}", managed)))
        .then_some(host)
}

fn is_loopback(url: &Url) -> bool {
    url.host_str()
        .is_some_and(|host| LOOPBACK_HOSTS.contains(&host))
}

/// Memoizes the first validation result for the life of the process,
/// whatever its outcome.
#[derive(Debug, Default)]
pub struct ValidationCache {
    cell: OnceLock<Arc<ValidationResult>>,
}

impl ValidationCache {
    pub const fn new() -> Self {
        Self {
            cell: OnceLock::new(),
        }
    }

    pub fn get_or_validate(&self, raw: &RawVariables, mode: Mode) -> Arc<ValidationResult> {
        self.cell
            .get_or_init(|| Arc::new(validate(raw, mode)))
            .clone()
    }
}
