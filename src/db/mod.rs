// BSD 3-Clause License
// Copyright (c) 2025, ENVGATE
//
//! ENVGATE Database-Layer
//! Persistence collaborator configured from the validated environment.

mod pool;
mod retry;
mod settings;

pub use pool::{PersistenceClient, SqlxClient};
pub use retry::{connect_with_retry, RetryPolicy};
pub use settings::DatabaseSettings;
