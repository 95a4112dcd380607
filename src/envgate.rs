// BSD 3-Clause License
// Copyright (c) 2025, ENVGATE
//
//! ENVGATE server: validates the environment, connects storage and serves
//! the gated router.

use std::sync::Arc;

use anyhow::Result;
use tracing::{error, info, warn};

use envgate::auth::AuthSettings;
use envgate::config::{self, RawVariables, ServerSettings};
use envgate::db::{connect_with_retry, DatabaseSettings, PersistenceClient, RetryPolicy, SqlxClient};
use envgate::gate::RequestGate;
use envgate::routes::{self, AppState};
use envgate::telemetry;

#[tokio::main]
async fn main() -> Result<()> {
    let raw = RawVariables::from_process_with_dotenv();
    let mode = config::detect_mode(&raw);

    let settings = ServerSettings::from_env()?;
    telemetry::init(&settings, mode);

    info!("ENVGATE server starting");
    info!(
        version = envgate::VERSION,
        git_hash = envgate::GIT_HASH,
        build_time = envgate::BUILD_TIME,
        mode = %mode,
        "Build info"
    );

    let config = config::current()?;
    if config.is_degraded() {
        warn!(
            fallbacks = %config.fallbacks.join(", "),
            "Running with development fallback values"
        );
    }

    let database: Option<Arc<dyn PersistenceClient>> = if raw.is_build_phase() {
        info!("Build phase detected, not connecting to the database");
        None
    } else {
        let client = Arc::new(SqlxClient::new(DatabaseSettings::from_config(&config)));
        if let Err(e) = connect_with_retry(client.as_ref(), &RetryPolicy::default()).await {
            error!(error = %e, "Database unavailable");
            return Err(e.into());
        }
        Some(client as Arc<dyn PersistenceClient>)
    };

    let state = AppState {
        mode,
        auth: AuthSettings::from_config(&config),
        database: database.clone(),
    };
    let gate = Arc::new(RequestGate::from_env(&raw));
    let app = routes::app(state, gate);

    let listener = tokio::net::TcpListener::bind(settings.listen_addr)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", settings.listen_addr, e))?;
    info!("Server listening on {}", settings.listen_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    if let Some(db) = database {
        db.disconnect().await;
    }
    info!("ENVGATE server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
