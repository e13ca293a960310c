//! # Error Types
//!
//! Validation errors for the shared value types.

use thiserror::Error;

/// Errors raised while constructing a shared value type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    /// Wallet address was empty after trimming.
    #[error("Wallet address is empty")]
    EmptyAddress,

    /// Wallet address contains whitespace or control characters.
    #[error("Wallet address contains invalid characters: {0:?}")]
    InvalidAddress(String),

    /// Program name was empty after trimming.
    #[error("Program name is empty")]
    EmptyProgramName,

    /// Submission id was empty.
    #[error("Submission id is empty")]
    EmptySubmissionId,
}
