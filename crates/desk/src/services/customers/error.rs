//! Customer directory error types.

use thiserror::Error;

use workbench_core::{CpfError, CustomerId, EmailError};

use crate::db::RepositoryError;
use crate::error::ErrorKind;

/// Errors that can occur during customer operations.
#[derive(Debug, Error)]
pub enum CustomerError {
    /// A required field is blank.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// The CPF failed validation.
    #[error("invalid CPF: {0}")]
    InvalidCpf(#[from] CpfError),

    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// The CPF belongs to another customer.
    #[error("CPF {0} is already registered")]
    DuplicateCpf(String),

    /// Work orders still reference the customer.
    #[error("customer has {count} work orders and cannot be deleted")]
    HasWorkOrders { count: i64 },

    /// Customer not found.
    #[error("customer {0} not found")]
    NotFound(CustomerId),

    /// Repository/database error.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl CustomerError {
    /// Classify the failure.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingField(_) | Self::InvalidCpf(_) | Self::InvalidEmail(_) => {
                ErrorKind::Validation
            }
            Self::DuplicateCpf(_) | Self::HasWorkOrders { .. } => ErrorKind::Conflict,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Repository(e) => e.kind(),
        }
    }
}
