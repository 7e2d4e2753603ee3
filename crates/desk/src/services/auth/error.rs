//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;
use crate::error::ErrorKind;

/// Errors that can occur during authentication and operator administration.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Wrong username or password, or the operator is inactive.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Password too short.
    #[error("password must be at least {min} characters")]
    WeakPassword { min: usize },

    /// Username too short.
    #[error("username must be at least {min} characters")]
    InvalidUsername { min: usize },

    /// Display name is blank.
    #[error("display name is required")]
    MissingDisplayName,

    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] workbench_core::EmailError),

    /// Username or email already taken.
    #[error("{0}")]
    OperatorExists(String),

    /// Operator not found.
    #[error("operator not found")]
    OperatorNotFound,

    /// Repository/database error.
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}

impl AuthError {
    /// Classify the failure.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidCredentials => ErrorKind::Unauthenticated,
            Self::WeakPassword { .. }
            | Self::InvalidUsername { .. }
            | Self::MissingDisplayName
            | Self::InvalidEmail(_) => ErrorKind::Validation,
            Self::OperatorExists(_) => ErrorKind::Conflict,
            Self::OperatorNotFound => ErrorKind::NotFound,
            Self::PasswordHash => ErrorKind::Infrastructure,
            Self::Repository(e) => e.kind(),
        }
    }
}
