//! SDK error types.
//!
//! Provides error types for parsing and validating record values.

/// SDK errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SdkError {
    /// Unknown route priority.
    #[error("invalid priority: {0}")]
    InvalidPriority(String),

    /// Unknown user role.
    #[error("invalid role: {0}")]
    InvalidRole(String),

    /// Invalid endpoint URL.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
}
