// BSD 3-Clause License
// Copyright (c) 2025, ENVGATE
//
//! Per-request configuration gate
//!
//! Runs ahead of ordinary request handling and redirects to the
//! configuration-error page while the environment is invalid.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tracing::{debug, error, warn};

use crate::config::{self, Mode, RawVariables, ValidationResult};

pub const CONFIG_ERROR_PATH: &str = "/config-error";
pub const GENERIC_PRODUCTION_ERROR: &str = "Configuration error - check server logs";

const STATIC_PREFIXES: &[&str] = &["/_next/", "/static/", "/assets/"];
const STATIC_EXTENSIONS: &[&str] = &[
    "ico", "png", "jpg", "jpeg", "gif", "svg", "webp", "avif", "css", "js", "map", "woff",
    "woff2", "ttf", "txt", "xml", "webmanifest",
];

/// Paths the gate never looks at: static assets, the self-validating API
/// namespace and the error page itself.
pub fn should_bypass(path: &str) -> bool {
    if path == CONFIG_ERROR_PATH || path.starts_with("/config-error/") {
        return true;
    }
    if path == "/api" || path.starts_with("/api/") {
        return true;
    }
    if STATIC_PREFIXES.iter().any(|p| path.starts_with(p)) {
        return true;
    }
    let last = path.rsplit('/').next().unwrap_or_default();
    match last.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => {
            STATIC_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str())
        }
        _ => false,
    }
}

/// Gate state shared by every request
#[derive(Debug)]
pub struct RequestGate {
    mode: Mode,
    build_phase: bool,
    result: Arc<ValidationResult>,
    logged: AtomicBool,
}

impl RequestGate {
    pub fn new(mode: Mode, build_phase: bool, result: Arc<ValidationResult>) -> Self {
        Self {
            mode,
            build_phase,
            result,
            logged: AtomicBool::new(false),
        }
    }

    /// Gate over the process-wide, cached validation result.
    pub fn from_env(raw: &RawVariables) -> Self {
        Self::new(
            config::detect_mode(raw),
            raw.is_build_phase(),
            config::validation(raw),
        )
    }

    /// `None` lets the request through; `Some(location)` redirects.
    pub fn intercept(&self, path: &str) -> Option<String> {
        if self.build_phase || should_bypass(path) {
            return None;
        }

        let first = !self.logged.swap(true, Ordering::Relaxed);

        if self.result.is_valid {
            if first {
                for warning in &self.result.warnings {
                    warn!(mode = %self.mode, "{}", warning);
                }
            }
            return None;
        }

        if first {
            for issue in &self.result.errors {
                error!(mode = %self.mode, "Configuration error: {}", issue);
            }
        }
        debug!(path = %path, "Redirecting request to configuration error page");
        Some(self.redirect_location())
    }

    pub fn redirect_location(&self) -> String {
        let timestamp = chrono::Utc::now().to_rfc3339();
        let query = if self.mode.is_production() {
            let errors = json_list(&[GENERIC_PRODUCTION_ERROR.to_string()]);
            serde_urlencoded::to_string([
                ("errors", errors.as_str()),
                ("production", "true"),
                ("timestamp", timestamp.as_str()),
            ])
        } else {
            let errors = json_list(&self.result.error_messages());
            let warnings = json_list(&self.result.warning_messages());
            serde_urlencoded::to_string([
                ("errors", errors.as_str()),
                ("warnings", warnings.as_str()),
                ("production", "false"),
                ("timestamp", timestamp.as_str()),
            ])
        };
        match query {
            Ok(query) => format!("{}?{}", CONFIG_ERROR_PATH, query),
            Err(e) => {
                warn!("Failed to encode configuration error query: {}", e);
                CONFIG_ERROR_PATH.to_string()
            }
        }
    }
}

fn json_list(items: &[String]) -> String {
    serde_json::to_string(items).unwrap_or_else(|_| "[]".to_string())
}

/// Axum middleware, mounted with `middleware::from_fn_with_state`.
pub async fn config_gate(
    State(gate): State<Arc<RequestGate>>,
    req: Request,
    next: Next,
) -> Response {
    if let Some(location) = gate.intercept(req.uri().path()) {
        return Redirect::temporary(&location).into_response();
    }
    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::validate;
    use axum::{body::Body, http::{Request, StatusCode}, middleware, routing::get, Router};
    use std::collections::HashMap;
    use tower::ServiceExt;

    fn dev_vars() -> RawVariables {
        RawVariables::new()
            .with("NODE_ENV", "development")
            .with("DATABASE_PROVIDER", "sqlite")
            .with("DATABASE_URL", "file:./dev.db")
            .with("NEXTAUTH_URL", "http://localhost:3000")
            .with("NEXTAUTH_SECRET", "x")
    }

    fn gate(raw: &RawVariables, mode: Mode) -> RequestGate {
        RequestGate::new(mode, raw.is_build_phase(), Arc::new(validate(raw, mode)))
    }

    fn query_of(location: &str) -> HashMap<String, String> {
        let (_, query) = location.split_once('?').unwrap();
        serde_urlencoded::from_str(query).unwrap()
    }

    #[test]
    fn test_should_bypass() {
        assert!(should_bypass("/favicon.ico"));
        assert!(should_bypass("/_next/static/chunks/main.js"));
        assert!(should_bypass("/images/logo.PNG"));
        assert!(should_bypass("/api/speech/token"));
        assert!(should_bypass("/config-error"));
        assert!(!should_bypass("/"));
        assert!(!should_bypass("/speech-to-text"));
        assert!(!should_bypass("/apiary"));
        assert!(!should_bypass("/.hidden"));
    }

    #[test]
    fn test_valid_configuration_passes() {
        let gate = gate(&dev_vars(), Mode::Development);
        assert_eq!(gate.intercept("/"), None);
        assert_eq!(gate.intercept("/translate"), None);
    }

    #[test]
    fn test_development_redirect_carries_details() {
        let raw = dev_vars().with("GOOGLE_CLIENT_ID", "id");
        let gate = gate(&raw, Mode::Development);
        let location = gate.intercept("/").unwrap();
        assert!(location.starts_with("/config-error?"));

        let query = query_of(&location);
        let errors: Vec<String> = serde_json::from_str(&query["errors"]).unwrap();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("GOOGLE_CLIENT_SECRET"));
        assert_eq!(query["production"], "false");
        assert!(query.contains_key("warnings"));
        assert!(query.contains_key("timestamp"));
    }

    #[test]
    fn test_production_redirect_withholds_details() {
        let raw = dev_vars().with("NODE_ENV", "production");
        let gate = gate(&raw, Mode::Production);
        let location = gate.intercept("/dashboard").unwrap();
        let query = query_of(&location);
        let errors: Vec<String> = serde_json::from_str(&query["errors"]).unwrap();
        assert_eq!(errors, vec![GENERIC_PRODUCTION_ERROR.to_string()]);
        assert_eq!(query["production"], "true");
        assert!(!query.contains_key("warnings"));
        assert!(!location.contains("NEXTAUTH"));
    }

    #[test]
    fn test_static_assets_never_gated() {
        let raw = dev_vars().with("DATABASE_PROVIDER", "mysql");
        let gate = gate(&raw, Mode::Development);
        assert_eq!(gate.intercept("/favicon.ico"), None);
        assert!(gate.intercept("/").is_some());
    }

    #[test]
    fn test_build_phase_bypasses_everything() {
        let raw = RawVariables::new()
            .with("NODE_ENV", "production")
            .with("NEXT_PHASE", "phase-production-build");
        let gate = gate(&raw, Mode::Production);
        assert_eq!(gate.intercept("/"), None);
    }

    #[tokio::test]
    async fn test_middleware_redirects_and_passes() {
        let raw = dev_vars().with("DATABASE_PROVIDER", "mysql");
        let gate = Arc::new(gate(&raw, Mode::Development));
        let app = Router::new()
            .route("/", get(|| async { "home" }))
            .route("/favicon.ico", get(|| async { "icon" }))
            .layer(middleware::from_fn_with_state(gate, config_gate));

        let response = app
            .clone()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        let location = response.headers()["location"].to_str().unwrap();
        assert!(location.starts_with(CONFIG_ERROR_PATH));

        let response = app
            .oneshot(Request::builder().uri("/favicon.ico").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
