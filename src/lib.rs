//! Library crate for game-rank, exposing modules for binaries and integration tests.

/// File and environment configuration.
pub mod config;
/// Storage abstraction and backends.
pub mod dao;
/// Request and response shapes plus input validation.
pub mod dto;
/// Service and HTTP error types.
pub mod error;
/// HTTP routes.
pub mod routes;
/// Business logic over the storage layer.
pub mod services;
/// Shared application state.
pub mod state;
/// HTML rendering.
pub mod view;
