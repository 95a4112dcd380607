// BSD 3-Clause License
// Copyright (c) 2025, ENVGATE
//
//! Startup and per-request configuration gates

pub mod request;
pub mod startup;

pub use request::{config_gate, should_bypass, RequestGate, CONFIG_ERROR_PATH};
pub use startup::{evaluate, StartupDecision};
