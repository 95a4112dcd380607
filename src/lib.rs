// BSD 3-Clause License
// Copyright (c) 2025, ENVGATE
//
// ENVGATE Library
// Environment validation, startup and request gates, and the server pieces
// shared by the `envgate-server` and `envgate-check` binaries.

pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod gate;
pub mod report;
pub mod routes;
pub mod telemetry;

pub use config::{ConfigError, Configuration, Mode, RawVariables, ValidationResult};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const BUILD_TIME: &str = env!("ENVGATE_BUILD_TIME");
pub const GIT_HASH: &str = env!("ENVGATE_GIT_HASH");
