// BSD 3-Clause License
// Copyright (c) 2025, ENVGATE
//! Error types shared across the crate

mod database;

pub use database::DatabaseError;
