// BSD 3-Clause License
// Copyright (c) 2025, ENVGATE
//
//! Snapshot of the process environment

use std::collections::BTreeMap;
use std::env;

use tracing::{info, warn};

use super::rules::{BUILD_PHASE_VALUE, BUILD_PHASE_VAR};

/// Variable name to value. Empty values are dropped on construction, so
/// "unset" and "set to empty" are indistinguishable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawVariables {
    vars: BTreeMap<String, String>,
}

impl RawVariables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture the current process environment.
    pub fn from_process() -> Self {
        env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect()
    }

    /// Load `.env` (if present) into the process environment, then capture it.
    pub fn from_process_with_dotenv() -> Self {
        if let Err(e) = dotenvy::dotenv() {
            if e.not_found() {
                info!("No .env file found, using environment variables only");
            } else {
                warn!("Error loading .env file: {}", e);
            }
        }
        Self::from_process()
    }

    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: &str, value: &str) {
        if value.is_empty() {
            self.vars.remove(key);
        } else {
            self.vars.insert(key.to_string(), value.to_string());
        }
    }

    pub fn remove(&mut self, key: &str) {
        self.vars.remove(key);
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.vars.contains_key(key)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.vars.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// True while the application is being compiled rather than served.
    pub fn is_build_phase(&self) -> bool {
        self.get(BUILD_PHASE_VAR) == Some(BUILD_PHASE_VALUE)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RawVariables {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut raw = RawVariables::new();
        for (k, v) in iter {
            let (k, v): (String, String) = (k.into(), v.into());
            raw.insert(&k, &v);
        }
        raw
    }
}
