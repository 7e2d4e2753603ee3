//! Error classification shared by every desk operation.

use thiserror::Error;

use crate::config::ConfigError;
use crate::db::{RepositoryError, SetupError};
use crate::document::DocumentError;
use crate::services::{AuthError, CustomerError, WorkOrderError};

/// What went wrong, independent of which operation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Bad input: blank required field, failed CPF check, malformed value.
    /// Nothing was written.
    Validation,
    /// Uniqueness or reference conflict: duplicate CPF, username or email,
    /// or a delete blocked by work orders. Nothing was written.
    Conflict,
    /// The requested record does not exist.
    NotFound,
    /// Login rejected.
    Unauthenticated,
    /// Store or filesystem failure. Logged and passed up, never retried.
    Infrastructure,
}

impl ErrorKind {
    /// Short lowercase name for logs.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Conflict => "conflict",
            Self::NotFound => "not_found",
            Self::Unauthenticated => "unauthenticated",
            Self::Infrastructure => "infrastructure",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl RepositoryError {
    /// Classify a repository failure.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Database(_) | Self::DataCorruption(_) => ErrorKind::Infrastructure,
            Self::NotFound => ErrorKind::NotFound,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::MissingReference(_) => ErrorKind::Validation,
        }
    }
}

/// Any failure a desk command can report.
#[derive(Debug, Error)]
pub enum DeskError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Setup(#[from] SetupError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Customer(#[from] CustomerError),

    #[error(transparent)]
    WorkOrder(#[from] WorkOrderError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Document(#[from] DocumentError),
}

impl DeskError {
    /// Classify the failure.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) => ErrorKind::Validation,
            Self::Setup(_) => ErrorKind::Infrastructure,
            Self::Repository(e) => e.kind(),
            Self::Customer(e) => e.kind(),
            Self::WorkOrder(e) => e.kind(),
            Self::Auth(e) => e.kind(),
            Self::Document(e) => e.kind(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_kinds() {
        assert_eq!(RepositoryError::NotFound.kind(), ErrorKind::NotFound);
        assert_eq!(
            RepositoryError::Conflict("dup".to_owned()).kind(),
            ErrorKind::Conflict
        );
        assert_eq!(
            RepositoryError::DataCorruption("bad".to_owned()).kind(),
            ErrorKind::Infrastructure
        );
        assert_eq!(
            RepositoryError::MissingReference("work_order_customer_id_fkey".to_owned()).kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            RepositoryError::Database(sqlx::Error::PoolTimedOut).kind(),
            ErrorKind::Infrastructure
        );
    }

    #[test]
    fn test_desk_error_delegates_kind() {
        let err = DeskError::from(CustomerError::HasWorkOrders { count: 2 });
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(err.to_string(), "customer has 2 work orders and cannot be deleted");

        let err = DeskError::from(AuthError::InvalidCredentials);
        assert_eq!(err.kind(), ErrorKind::Unauthenticated);
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(ErrorKind::NotFound.to_string(), "not_found");
    }
}
