//! # AppError
//!
//! Centralized error handling for the Threadboard crates.
//! Ports report failures as `anyhow::Error`; the services fold them into
//! the variants below so the HTTP layer can pick a status code.

use thiserror::Error;

/// The primary error type for all tb-core operations.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (e.g., Post, Comment, User)
    #[error("{0} not found with ID {1}")]
    NotFound(String, String),

    /// Rejected input (e.g., page 0, per-page size of 0)
    #[error("validation error: {0}")]
    Validation(String),

    /// The relational store failed or was unreachable. Not retried here.
    #[error("store error: {0}")]
    Store(#[from] anyhow::Error),

    #[error("internal service error: {0}")]
    Internal(String),
}

/// A specialized Result type for Threadboard logic.
pub type Result<T> = std::result::Result<T, AppError>;
