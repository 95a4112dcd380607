// BSD 3-Clause License
// Copyright (c) 2025, ENVGATE
//! Configuration error types

use std::fmt;

use serde::Serialize;

use super::types::Mode;

/// Error taxonomy shared by the loader and the runtime validator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    MissingVariable,
    InvalidEnumValue,
    InvalidUrlFormat,
    IncompleteOAuthPair,
    InsecureProductionValue,
    TypoDetected,
    /// Warning-only findings
    Advisory,
}

/// A required variable that was not set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingVariable {
    pub name: &'static str,
    /// Known misspellings of `name` present in the environment
    pub found_as: Vec<String>,
}

impl fmt::Display for MissingVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.found_as.is_empty() {
            write!(f, " (found misspelled as {})", self.found_as.join(", "))?;
        }
        Ok(())
    }
}

/// One loader failure; a load collects every issue before reporting
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigIssue {
    #[error("Missing required environment variables:\n{}", bullets(.names))]
    MissingVariables { names: Vec<MissingVariable> },

    #[error("Invalid DATABASE_PROVIDER '{value}': expected 'sqlite' or 'postgresql'")]
    InvalidProvider { value: String },

    #[error("Invalid DATABASE_URL '{value}' for provider {provider}: must start with {expected}")]
    InvalidUrlFormat {
        provider: String,
        value: String,
        expected: String,
    },

    #[error("Incomplete {provider} OAuth configuration: {present} is set but {missing} is missing")]
    IncompleteOAuthPair {
        provider: String,
        present: String,
        missing: String,
    },
}

impl ConfigIssue {
    pub fn kind(&self) -> IssueKind {
        match self {
            ConfigIssue::MissingVariables { .. } => IssueKind::MissingVariable,
            ConfigIssue::InvalidProvider { .. } => IssueKind::InvalidEnumValue,
            ConfigIssue::InvalidUrlFormat { .. } => IssueKind::InvalidUrlFormat,
            ConfigIssue::IncompleteOAuthPair { .. } => IssueKind::IncompleteOAuthPair,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{}", render_invalid(.mode, .issues))]
    Invalid { mode: Mode, issues: Vec<ConfigIssue> },

    #[error("Invalid value for {key}: '{value}' - {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    #[error("Parse error for {key}: {message}")]
    ParseError { key: String, message: String },
}

impl ConfigError {
    pub fn issues(&self) -> &[ConfigIssue] {
        match self {
            ConfigError::Invalid { issues, .. } => issues,
            _ => &[],
        }
    }
}

fn bullets(names: &[MissingVariable]) -> String {
    names
        .iter()
        .map(|n| format!("  - {}", n))
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_invalid(mode: &Mode, issues: &[ConfigIssue]) -> String {
    let mode = *mode;
    let mut out = format!("Environment configuration is invalid ({} mode):\n", mode);
    for issue in issues {
        for (i, line) in issue.to_string().lines().enumerate() {
            if i == 0 {
                out.push_str(&format!("* {}\n", line));
            } else {
                out.push_str(&format!("  {}\n", line));
            }
        }
    }
    out.push('\n');
    out.push_str(remediation_hint(mode));
    out
}

fn remediation_hint(mode: Mode) -> &'static str {
    match mode {
        Mode::Production => {
            "Set the variables in your hosting platform's environment settings. \
             Production requires DATABASE_PROVIDER=postgresql with a postgresql:// URL, \
             an https NEXTAUTH_URL and the Supabase project URL and anon key."
        }
        Mode::Development => {
            "Copy .env.example to .env and fill in the values. \
             For local work DATABASE_PROVIDER=sqlite with DATABASE_URL=file:./dev.db is enough."
        }
        Mode::Test => {
            "Provide the variables in the test environment, e.g. \
             DATABASE_PROVIDER=sqlite and DATABASE_URL=file:./test.db."
        }
    }
}
