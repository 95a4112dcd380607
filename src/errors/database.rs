// BSD 3-Clause License
// Copyright (c) 2025, ENVGATE
//! Persistence error types

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Database connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Unsupported database URL '{0}'")]
    UnsupportedUrl(String),

    #[error("Database not connected")]
    NotConnected,

    #[error("Database connection failed after {attempts} attempt(s): {last}")]
    RetriesExhausted { attempts: u32, last: String },
}

impl From<sqlx::Error> for DatabaseError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::Configuration(_)
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed => DatabaseError::ConnectionFailed(e.to_string()),
            other => DatabaseError::QueryFailed(other.to_string()),
        }
    }
}
