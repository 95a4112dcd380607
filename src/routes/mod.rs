// BSD 3-Clause License
// Copyright (c) 2025, ENVGATE
//
//! HTTP surface: health, auth provider listing and the configuration-error
//! page, all behind the per-request gate.

mod config_error;

use std::sync::Arc;

use axum::{
    extract::State,
    middleware,
    response::{Html, IntoResponse},
    routing::get,
    Json, Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::auth::AuthSettings;
use crate::config::Mode;
use crate::db::PersistenceClient;
use crate::gate::{config_gate, RequestGate, CONFIG_ERROR_PATH};

pub use config_error::{config_error_page, parse_list, render, ConfigErrorQuery};

#[derive(Clone)]
pub struct AppState {
    pub mode: Mode,
    pub auth: AuthSettings,
    pub database: Option<Arc<dyn PersistenceClient>>,
}

pub fn app(state: AppState, gate: Arc<RequestGate>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health_check))
        .route("/api/health", get(health_check))
        .route("/api/auth/providers", get(auth_providers))
        .route(CONFIG_ERROR_PATH, get(config_error_page))
        .layer(middleware::from_fn_with_state(gate, config_gate))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn index() -> impl IntoResponse {
    Html("<h1>ENVGATE</h1><p>Environment validated, service online</p>")
}

async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let database = match &state.database {
        Some(db) if db.is_connected() => "connected",
        Some(_) => "disconnected",
        None => "not configured",
    };
    Json(serde_json::json!({
        "status": "healthy",
        "service": "envgate",
        "version": crate::VERSION,
        "build_time": crate::BUILD_TIME,
        "git_hash": crate::GIT_HASH,
        "environment": state.mode,
        "database": database,
        "timestamp": chrono::Utc::now(),
    }))
}

async fn auth_providers(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "providers": state.auth.providers,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{validate, RawVariables};
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    fn dev_vars() -> RawVariables {
        RawVariables::new()
            .with("NODE_ENV", "development")
            .with("DATABASE_PROVIDER", "sqlite")
            .with("DATABASE_URL", "file:./dev.db")
            .with("NEXTAUTH_URL", "http://localhost:3000")
            .with("NEXTAUTH_SECRET", "x")
    }

    fn test_app(raw: &RawVariables) -> Router {
        let mode = Mode::Development;
        let gate = Arc::new(RequestGate::new(mode, false, Arc::new(validate(raw, mode))));
        let state = AppState {
            mode,
            auth: AuthSettings {
                url: "http://localhost:3000".to_string(),
                secret: "x".to_string(),
                providers: vec!["credentials".to_string()],
            },
            database: None,
        };
        app(state, gate)
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_health_reports_build_metadata() {
        let response = test_app(&dev_vars()).oneshot(get_request("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["environment"], "development");
        assert_eq!(json["database"], "not configured");
        assert_eq!(json["version"], crate::VERSION);
    }

    #[tokio::test]
    async fn test_valid_environment_serves_pages() {
        let response = test_app(&dev_vars()).oneshot(get_request("/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_invalid_environment_redirects_pages_only() {
        let raw = dev_vars().with("DATABASE_PROVIDER", "mysql");
        let app = test_app(&raw);

        let response = app.clone().oneshot(get_request("/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        let location = response.headers()["location"].to_str().unwrap().to_string();

        let response = app.clone().oneshot(get_request("/api/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app.oneshot(get_request(&location)).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let html = String::from_utf8(body.to_vec()).unwrap();
        assert!(html.contains("mysql"));
    }

    #[tokio::test]
    async fn test_auth_providers_listing() {
        let response = test_app(&dev_vars())
            .oneshot(get_request("/api/auth/providers"))
            .await
            .unwrap();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["providers"][0], "credentials");
    }
}
