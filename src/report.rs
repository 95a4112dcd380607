// BSD 3-Clause License
// Copyright (c) 2025, ENVGATE
//
//! Diagnostics reporting
//!
//! Secret masking, the structured startup summary and the colorized report
//! printed by `envgate-check`.

use std::fmt::Write as _;

use console::style;
use serde::Serialize;
use tracing::info;
use url::Url;

use crate::config::rules::*;
use crate::config::{IssueKind, Mode, RawVariables, ValidationResult};

const MASK: &str = "****";

/// Keep a short prefix of a secret and hide the rest.
pub fn mask_secret(value: &str) -> String {
    if value.chars().count() <= 8 {
        return MASK.to_string();
    }
    let prefix: String = value.chars().take(4).collect();
    format!("{}{}", prefix, MASK)
}

/// Hide the password of a connection URL. Values that do not parse as a URL
/// are masked entirely unless they are plain file paths.
pub fn mask_url(value: &str) -> String {
    if value.starts_with("file:") {
        return value.to_string();
    }
    match Url::parse(value) {
        Ok(mut url) => {
            if url.password().is_some() && url.set_password(Some(MASK)).is_err() {
                return MASK.to_string();
            }
            url.to_string()
        }
        Err(_) => MASK.to_string(),
    }
}

/// Masked form of a variable for display; secrets are shortened, URLs lose
/// their credentials.
pub fn display_value(name: &str, value: &str) -> String {
    if looks_secret(name) {
        mask_secret(value)
    } else if name.ends_with("_URL") {
        mask_url(value)
    } else {
        value.to_string()
    }
}

/// Startup summary logged once the environment has been validated
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub mode: Mode,
    pub provider: String,
    pub database_url: String,
    pub auth: String,
    pub integrations: String,
    pub oauth_providers: Vec<&'static str>,
    pub errors: usize,
    pub warnings: usize,
}

impl Summary {
    pub fn new(raw: &RawVariables, mode: Mode, result: &ValidationResult) -> Self {
        let auth = match (raw.get(AUTH_URL), raw.get(AUTH_SECRET)) {
            (Some(url), Some(_)) => format!("configured ({})", url),
            (Some(url), None) => format!("secret missing ({})", url),
            _ => "not configured".to_string(),
        };
        let integrations = match (raw.get(SUPABASE_URL), raw.get(SUPABASE_ANON_KEY)) {
            (Some(url), Some(_)) => format!("supabase ({})", url),
            (Some(_), None) => "supabase (anon key missing)".to_string(),
            _ => "none".to_string(),
        };
        Summary {
            mode,
            provider: raw.get(DATABASE_PROVIDER).unwrap_or("unset").to_string(),
            database_url: raw
                .get(DATABASE_URL)
                .map(mask_url)
                .unwrap_or_else(|| "unset".to_string()),
            auth,
            integrations,
            oauth_providers: OAUTH_PAIRS
                .iter()
                .filter(|p| raw.contains(p.id_var) && raw.contains(p.secret_var))
                .map(|p| p.provider)
                .collect(),
            errors: result.errors.len(),
            warnings: result.warnings.len(),
        }
    }

    pub fn log(&self) {
        info!(
            mode = %self.mode,
            provider = %self.provider,
            database_url = %self.database_url,
            auth = %self.auth,
            integrations = %self.integrations,
            oauth_providers = %self.oauth_providers.join(","),
            warnings = self.warnings,
            "Environment validated"
        );
    }
}

/// Suggested next steps for the kinds of problems found.
pub fn recommendations(mode: Mode, result: &ValidationResult) -> Vec<String> {
    let mut out = Vec::new();
    if result.has_error(IssueKind::MissingVariable) {
        out.push(match mode {
            Mode::Production => concat!(
                "Add the missing variables in the hosting platform's ",
                "environment settings and redeploy"
            )
            .to_string(),
            _ => "Copy .env.example to .env and fill in the missing values".to_string(),
        });
    }
    if result.has_error(IssueKind::TypoDetected) {
        out.push("Rename misspelled variables to their canonical names".to_string());
    }
    if result.has_error(IssueKind::InvalidEnumValue)
        || result.has_error(IssueKind::InvalidUrlFormat)
    {
        out.push(
            concat!(
                "Use DATABASE_PROVIDER=sqlite with a file: URL, ",
                "or DATABASE_PROVIDER=postgresql with a postgresql:// URL"
            )
            .to_string(),
        );
    }
    if result.has_error(IssueKind::IncompleteOAuthPair) {
        out.push(
            "Set both the client id and the client secret of each OAuth provider, or neither"
                .to_string(),
        );
    }
    if result.has_error(IssueKind::InsecureProductionValue) {
        out.push(format!(
            "Generate a production secret with `openssl rand -base64 32` \
             (at least {} characters) and serve over https",
            MIN_PRODUCTION_SECRET_LEN
        ));
    }
    if result.is_valid && !result.warnings.is_empty() {
        out.push("Review the warnings above; they do not block startup".to_string());
    }
    out
}

/// Section-by-section report for the command line.
pub fn render_report(
    raw: &RawVariables,
    mode: Mode,
    result: &ValidationResult,
    color: bool,
) -> String {
    let mut out = String::new();
    let heading = |text: &str| style(text.to_string()).bold().cyan().force_styling(color);

    let _ = writeln!(out, "{}", heading("Environment configuration check"));
    let _ = writeln!(out);

    let _ = writeln!(out, "{}", heading("Environment"));
    let _ = writeln!(out, "  mode: {}", style(mode).bold().force_styling(color));
    if raw.is_build_phase() {
        let _ = writeln!(out, "  build phase: yes (gates are skipped)");
    }
    let _ = writeln!(out);

    let sections: [(&str, &[&str]); 4] = [
        ("Database", &[DATABASE_PROVIDER, DATABASE_URL]),
        ("Authentication", &[AUTH_URL, AUTH_SECRET]),
        (
            "Integrations",
            &[SUPABASE_URL, SUPABASE_ANON_KEY, SUPABASE_SERVICE_ROLE_KEY],
        ),
        (
            "OAuth",
            &[
                "GOOGLE_CLIENT_ID",
                "GOOGLE_CLIENT_SECRET",
                "GITHUB_CLIENT_ID",
                "GITHUB_CLIENT_SECRET",
            ],
        ),
    ];
    for (title, names) in sections {
        let _ = writeln!(out, "{}", heading(title));
        for name in names {
            match raw.get(name) {
                Some(value) => {
                    let _ = writeln!(
                        out,
                        "  {} {}: {}",
                        style("✓").green().force_styling(color),
                        name,
                        display_value(name, value)
                    );
                }
                None => {
                    let _ = writeln!(
                        out,
                        "  {} {}: {}",
                        style("-").dim().force_styling(color),
                        name,
                        style("not set").dim().force_styling(color)
                    );
                }
            }
        }
        let _ = writeln!(out);
    }

    if !result.errors.is_empty() {
        let _ = writeln!(out, "{}", style("Errors").bold().red().force_styling(color));
        for issue in &result.errors {
            let _ = writeln!(out, "  {} {}", style("✗").red().force_styling(color), issue);
        }
        let _ = writeln!(out);
    }

    if !result.warnings.is_empty() {
        let _ = writeln!(out, "{}", style("Warnings").bold().yellow().force_styling(color));
        for issue in &result.warnings {
            let _ = writeln!(out, "  {} {}", style("!").yellow().force_styling(color), issue);
        }
        let _ = writeln!(out);
    }

    let recs = recommendations(mode, result);
    if !recs.is_empty() {
        let _ = writeln!(out, "{}", heading("Recommendations"));
        for rec in recs {
            let _ = writeln!(out, "  • {}", rec);
        }
        let _ = writeln!(out);
    }

    let verdict = if result.is_valid {
        style(format!(
            "PASSED ({} warning(s))",
            result.warnings.len()
        ))
        .green()
        .bold()
        .force_styling(color)
    } else {
        style(format!(
            "FAILED ({} error(s), {} warning(s))",
            result.errors.len(),
            result.warnings.len()
        ))
        .red()
        .bold()
        .force_styling(color)
    };
    let _ = writeln!(out, "Result: {}", verdict);
    out
}
