//! # Domain Errors
//!
//! `GovernanceError` is the structured failure returned by every governance
//! and voting operation. `StoreError` belongs to the document-store port and
//! is folded into `TransactionAbort` once it crosses a transaction boundary.

use serde::{Deserialize, Serialize};
use shared_types::{ValueError, WalletAddress};
use std::fmt;
use thiserror::Error;

/// The record family (or role) a `NotFound` refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Program,
    User,
    Submission,
    Reviewer,
    Manager,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Program => "Program",
            EntityKind::User => "User",
            EntityKind::Submission => "Submission",
            EntityKind::Reviewer => "Reviewer",
            EntityKind::Manager => "Manager",
        };
        f.write_str(name)
    }
}

/// Machine-readable error kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    Conflict,
    Unauthorized,
    InvalidState,
    TransactionAbort,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::InvalidState => "invalid_state",
            ErrorKind::TransactionAbort => "transaction_abort",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors returned by governance and voting operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GovernanceError {
    /// Program, user, submission or role holder does not exist.
    #[error("{entity} not found: {key}")]
    NotFound { entity: EntityKind, key: String },

    /// Duplicate role assignment.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Caller is not in the authoritative role set for the action.
    #[error("Unauthorized: {address} is not allowed to {action}")]
    Unauthorized {
        address: WalletAddress,
        action: &'static str,
    },

    /// Vote value/severity not allowed, or submission past its terminal state.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// The atomic operation failed as a whole; nothing was written.
    #[error("Transaction aborted: {reason}")]
    TransactionAbort { reason: String },
}

impl GovernanceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GovernanceError::NotFound { .. } => ErrorKind::NotFound,
            GovernanceError::Conflict(_) => ErrorKind::Conflict,
            GovernanceError::Unauthorized { .. } => ErrorKind::Unauthorized,
            GovernanceError::InvalidState(_) => ErrorKind::InvalidState,
            GovernanceError::TransactionAbort { .. } => ErrorKind::TransactionAbort,
        }
    }

    pub fn not_found(entity: EntityKind, key: impl fmt::Display) -> Self {
        GovernanceError::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    pub fn abort(reason: impl Into<String>) -> Self {
        GovernanceError::TransactionAbort {
            reason: reason.into(),
        }
    }
}

impl From<StoreError> for GovernanceError {
    fn from(err: StoreError) -> Self {
        GovernanceError::abort(err.to_string())
    }
}

impl From<ValueError> for GovernanceError {
    fn from(err: ValueError) -> Self {
        GovernanceError::InvalidState(err.to_string())
    }
}

/// Errors raised by a `DocumentStore` adapter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Optimistic concurrency check failed at commit time.
    #[error("Version conflict on {key}: expected {expected:?}, found {actual:?}")]
    VersionConflict {
        key: String,
        expected: Option<u64>,
        actual: Option<u64>,
    },

    /// Stored document could not be decoded.
    #[error("Corrupt document {key}: {message}")]
    Corrupt { key: String, message: String },

    /// Underlying I/O failed.
    #[error("Storage I/O error: {message}")]
    Io { message: String },

    /// Store is closed or refusing writes.
    #[error("Storage unavailable: {message}")]
    Unavailable { message: String },
}

impl StoreError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::VersionConflict { .. })
    }
}

/// Result type for governance operations
pub type GovernanceResult<T> = Result<T, GovernanceError>;
