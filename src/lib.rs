//! Library crate for pokemory-back, exposing modules for binaries and integration tests.

/// Runtime configuration.
pub mod config;
/// Persistence.
pub mod dao;
/// Wire types.
pub mod dto;
/// Service and HTTP errors.
pub mod error;
/// HTTP routes.
pub mod routes;
/// Business operations.
pub mod services;
/// Shared state and game logic.
pub mod state;
