// BSD 3-Clause License
// Copyright (c) 2025, ENVGATE
//
//! Declarative rule table
//! Required variables per mode, OAuth pairs, known typos and the heuristics
//! word lists used by the runtime validator.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use super::types::Mode;

pub const MODE_VAR: &str = "NODE_ENV";
pub const DATABASE_PROVIDER: &str = "DATABASE_PROVIDER";
pub const DATABASE_URL: &str = "DATABASE_URL";
pub const AUTH_URL: &str = "NEXTAUTH_URL";
pub const AUTH_SECRET: &str = "NEXTAUTH_SECRET";
pub const SUPABASE_URL: &str = "NEXT_PUBLIC_SUPABASE_URL";
pub const SUPABASE_ANON_KEY: &str = "NEXT_PUBLIC_SUPABASE_ANON_KEY";
pub const SUPABASE_SERVICE_ROLE_KEY: &str = "SUPABASE_SERVICE_ROLE_KEY";

/// Marker that distinguishes compiling the app from serving it
pub const BUILD_PHASE_VAR: &str = "NEXT_PHASE";
pub const BUILD_PHASE_VALUE: &str = "phase-production-build";

/// Secrets shorter than this are rejected in production
pub const MIN_PRODUCTION_SECRET_LEN: usize = 32;
/// Secrets longer than this draw a warning in development
pub const MAX_DEVELOPMENT_SECRET_LEN: usize = 64;

pub const BASE_REQUIRED: &[&str] = &[
    MODE_VAR,
    DATABASE_PROVIDER,
    DATABASE_URL,
    AUTH_URL,
    AUTH_SECRET,
];

pub const PRODUCTION_REQUIRED: &[&str] = &[SUPABASE_URL, SUPABASE_ANON_KEY];

/// Base list plus the mode addendum, in declaration order.
pub fn required_for(mode: Mode) -> Vec<&'static str> {
    let addendum: &[&str] = match mode {
        Mode::Production => PRODUCTION_REQUIRED,
        Mode::Development | Mode::Test => &[],
    };
    BASE_REQUIRED.iter().chain(addendum).copied().collect()
}

/// Substitutes used when required variables are missing outside of
/// production serving.
pub const DEVELOPMENT_FALLBACKS: &[(&str, &str)] = &[
    (DATABASE_PROVIDER, "sqlite"),
    (DATABASE_URL, "file:./dev.db"),
    (AUTH_URL, "http://localhost:3000"),
    (AUTH_SECRET, "development-secret-change-me"),
];

/// Substitutes used instead of the SQLite pair when the other half of the
/// database settings already names PostgreSQL.
pub const POSTGRES_DEVELOPMENT_PROVIDER: &str = "postgresql";
pub const POSTGRES_DEVELOPMENT_URL: &str = "postgresql://localhost:5432/postgres";

pub fn development_fallback(name: &str) -> Option<&'static str> {
    DEVELOPMENT_FALLBACKS
        .iter()
        .find(|(key, _)| *key == name)
        .map(|(_, value)| *value)
}

/// Mutually dependent client id / client secret names
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OAuthPair {
    pub provider: &'static str,
    pub id_var: &'static str,
    pub secret_var: &'static str,
}

pub const OAUTH_PAIRS: &[OAuthPair] = &[
    OAuthPair {
        provider: "google",
        id_var: "GOOGLE_CLIENT_ID",
        secret_var: "GOOGLE_CLIENT_SECRET",
    },
    OAuthPair {
        provider: "github",
        id_var: "GITHUB_CLIENT_ID",
        secret_var: "GITHUB_CLIENT_SECRET",
    },
];

/// Secret-looking names the application knows about
pub const KNOWN_SECRET_VARS: &[&str] = &[
    AUTH_SECRET,
    SUPABASE_ANON_KEY,
    SUPABASE_SERVICE_ROLE_KEY,
    "GOOGLE_CLIENT_SECRET",
    "GITHUB_CLIENT_SECRET",
    "AZURE_SPEECH_KEY",
];

/// Misspelling -> canonical name
pub static KNOWN_TYPOS: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    let mut map = HashMap::new();
    map.insert("DATABSE_URL", DATABASE_URL);
    map.insert("DATABASE_ULR", DATABASE_URL);
    map.insert("DATABASEURL", DATABASE_URL);
    map.insert("DB_URL", DATABASE_URL);
    map.insert("DATABASE_PROVIDOR", DATABASE_PROVIDER);
    map.insert("DB_PROVIDER", DATABASE_PROVIDER);
    map.insert("NEXT_AUTH_URL", AUTH_URL);
    map.insert("NEXTAUTH_URI", AUTH_URL);
    map.insert("NEXTAUTHURL", AUTH_URL);
    map.insert("NEXT_AUTH_SECRET", AUTH_SECRET);
    map.insert("NEXTAUTH_SECRETS", AUTH_SECRET);
    map.insert("NEXTAUTHSECRET", AUTH_SECRET);
    map.insert("NEXT_PUBLIC_SUPABASE_URI", SUPABASE_URL);
    map.insert("NEXT_PUBLIC_SUPERBASE_URL", SUPABASE_URL);
    map.insert("NEXT_PUBLIC_SUPABASE_KEY", SUPABASE_ANON_KEY);
    map.insert("NEXT_PUBLIC_SUPERBASE_ANON_KEY", SUPABASE_ANON_KEY);
    map.insert("SUPABASE_SERVICE_KEY", SUPABASE_SERVICE_ROLE_KEY);
    map.insert("GOOGLE_CLIENTID", "GOOGLE_CLIENT_ID");
    map.insert("GOOGLE_CLIENT_SECRETS", "GOOGLE_CLIENT_SECRET");
    map.insert("GITHUB_CLIENTID", "GITHUB_CLIENT_ID");
    map.insert("GITHUB_CLIENT_SECRETS", "GITHUB_CLIENT_SECRET");
    map
});

/// Misspellings of `canonical` that are present, sorted.
pub fn typos_of<'a>(canonical: &str, names: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    let mut found: Vec<&str> = names
        .filter(|name| KNOWN_TYPOS.get(name).is_some_and(|c| *c == canonical))
        .collect();
    found.sort_unstable();
    found
}

/// Errors mentioning any of these names are fatal at startup even in development
pub const CRITICAL_KEYWORDS: &[&str] = &[DATABASE_URL, DATABASE_PROVIDER, AUTH_URL, AUTH_SECRET];

pub const LOOPBACK_HOSTS: &[&str] = &["localhost", "127.0.0.1", "0.0.0.0", "::1", "[::1]"];

/// Managed database hosts that suggest a hosted database in local development
pub const MANAGED_DATABASE_HOSTS: &[&str] = &[
    "supabase.co",
    "supabase.com",
    "neon.tech",
    "amazonaws.com",
    "render.com",
    "railway.app",
    "herokuapp.com",
];

/// Words that mark a secret as a placeholder or development value
pub static PLACEHOLDER_SECRET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)(change[-_]?me|placeholder|example|development|your[-_]?secret",
        r"|dev[-_]secret|test[-_]secret|secret123|insecure)"
    ))
    .expect("placeholder pattern is valid")
});

/// Heuristic for variables that probably carry credentials
pub fn looks_secret(name: &str) -> bool {
    let upper = name.to_ascii_uppercase();
    upper.contains("SECRET") || upper.contains("KEY")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_sets() {
        assert_eq!(required_for(Mode::Development), BASE_REQUIRED.to_vec());
        assert_eq!(required_for(Mode::Test), BASE_REQUIRED.to_vec());
        let prod = required_for(Mode::Production);
        assert_eq!(prod.len(), BASE_REQUIRED.len() + 2);
        assert!(prod.contains(&SUPABASE_URL));
        assert!(prod.contains(&SUPABASE_ANON_KEY));
    }

    #[test]
    fn test_every_typo_maps_to_a_known_name() {
        let canonical: Vec<&str> = BASE_REQUIRED
            .iter()
            .chain(PRODUCTION_REQUIRED)
            .copied()
            .chain([SUPABASE_SERVICE_ROLE_KEY])
            .chain(OAUTH_PAIRS.iter().flat_map(|p| [p.id_var, p.secret_var]))
            .collect();
        for (typo, target) in KNOWN_TYPOS.iter() {
            assert!(canonical.contains(target), "{} -> {}", typo, target);
            assert!(!canonical.contains(typo));
        }
    }

    #[test]
    fn test_typos_of() {
        let names = ["DATABSE_URL", "DB_URL", "NEXT_AUTH_URL", "PATH"];
        assert_eq!(
            typos_of(DATABASE_URL, names.iter().copied()),
            vec!["DATABSE_URL", "DB_URL"]
        );
        assert!(typos_of(AUTH_SECRET, names.iter().copied()).is_empty());
    }

    #[test]
    fn test_placeholder_secret_pattern() {
        assert!(PLACEHOLDER_SECRET.is_match("development-secret-change-me"));
        assert!(PLACEHOLDER_SECRET.is_match("YOUR_SECRET_here_0123456789abcdef"));
        assert!(!PLACEHOLDER_SECRET.is_match("k3Jq9vXz2LmN8pQr5sTu7wYa1bCd4eFg6hHi"));
    }

    #[test]
    fn test_looks_secret() {
        assert!(looks_secret("STRIPE_SECRET"));
        assert!(looks_secret("openai_api_key"));
        assert!(!looks_secret("HOME"));
    }
}
