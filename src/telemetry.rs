// BSD 3-Clause License
// Copyright (c) 2025, ENVGATE
//
//! Tracing subscriber setup

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::{Mode, ServerSettings};

/// Filter used when `RUST_LOG` is not set.
pub fn default_filter(settings: &ServerSettings) -> String {
    format!(
        "envgate={level},envgate_server={level},tower_http={level}",
        level = settings.log_level
    )
}

/// Install the global subscriber. Production, or `ENVGATE_JSON_LOGS=true`,
/// gets JSON lines; everything else the human-readable format.
pub fn init(settings: &ServerSettings, mode: Mode) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(settings)));

    let registry = tracing_subscriber::registry().with(filter);
    let result = if settings.json_logs || mode.is_production() {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(false)
                    .with_level(true)
                    .with_thread_ids(true)
                    .with_thread_names(true),
            )
            .try_init()
    } else {
        registry.with(fmt::layer().with_target(false)).try_init()
    };

    if let Err(e) = result {
        eprintln!("tracing subscriber already installed: {}", e);
    }
}
