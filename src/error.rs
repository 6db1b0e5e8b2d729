//! Error types for the Mentorbridge engine
//!
//! This module provides structured error handling using thiserror. The
//! taxonomy deliberately separates "the relationship doesn't exist" (404)
//! from "the client has not shared this" (403) so consumers can render
//! "no permission" rather than "doesn't exist".

use crate::types::{DenyReason, RelationshipId, RelationshipStatus};
use thiserror::Error;

/// Main error type for engine operations
#[derive(Error, Debug)]
pub enum EngineError {
    /// No caller identity was supplied
    #[error("Missing or invalid caller identity")]
    Unauthenticated,

    /// Relationship does not exist
    #[error("Relationship not found: {0}")]
    RelationshipNotFound(RelationshipId),

    /// Relationship exists but is not in the Active state
    #[error("Relationship {id} is not active (status: {status})")]
    RelationshipNotActive {
        id: RelationshipId,
        status: RelationshipStatus,
    },

    /// A gated category read was denied; always audit-logged by the gate
    #[error("Access denied: {reason}")]
    PermissionDenied { reason: DenyReason },

    /// Caller is not a party allowed to perform this operation
    #[error("Not authorized: {0}")]
    NotAuthorized(String),

    /// Malformed or semantically invalid input, rejected before any write
    #[error("Validation error: {0}")]
    Validation(String),

    /// Database operation failed
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Invalid identifier format
    #[error("Invalid identifier: {0}")]
    InvalidId(#[from] uuid::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;
