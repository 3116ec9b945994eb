//! Error types for the movie-admin API client.
//!
//! # Design
//! `Http` displays as the bare message the backend sent (or the fallback
//! built from the status line), since that string is what an operator sees.
//! Validation errors are raised before a request is dispatched. Malformed
//! bodies on successful responses are not errors at all; see `normalize`.

use thiserror::Error;

/// Pre-flight checks on movie creation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Title is required")]
    TitleRequired,

    #[error("Release year is required")]
    ReleaseYearRequired,

    #[error("Poster file is required")]
    PosterRequired,

    #[error("Invalid release year: {0}")]
    InvalidReleaseYear(String),
}

/// Errors returned by client operations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server answered with a non-2xx status.
    #[error("{message}")]
    Http { status: u16, message: String },

    /// The request was rejected before any network call.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The round trip itself failed (DNS, connection refused, ...).
    #[error("transport failed: {0}")]
    Transport(String),

    /// The session could not be written to or cleared from its storage.
    #[error("session storage failed: {0}")]
    Storage(#[from] std::io::Error),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// A successful body did not have the shape the operation returns.
    #[error("deserialization failed: {0}")]
    Deserialization(String),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}
