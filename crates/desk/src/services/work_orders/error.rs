//! Work-order error types.

use thiserror::Error;

use workbench_core::{CustomerId, OperatorId, PriceError, StatusError};

use crate::db::RepositoryError;
use crate::error::ErrorKind;

/// Errors that can occur during work-order operations.
#[derive(Debug, Error)]
pub enum WorkOrderError {
    /// The reported fault is blank.
    #[error("reported fault is required")]
    BlankFault,

    /// The estimated price is not a non-negative amount.
    #[error("invalid estimated price: {0}")]
    InvalidPrice(#[from] PriceError),

    /// The due date is not in a recognised format.
    #[error("invalid due date `{0}`, expected YYYY-MM-DD or DD/MM/YYYY")]
    InvalidDueDate(String),

    /// The status name is unknown.
    #[error(transparent)]
    InvalidStatus(#[from] StatusError),

    /// The referenced customer doesn't exist.
    #[error("customer {0} does not exist")]
    UnknownCustomer(CustomerId),

    /// The acting operator doesn't exist.
    #[error("operator {0} does not exist")]
    UnknownOperator(OperatorId),

    /// The acting operator is disabled.
    #[error("operator {0} is inactive")]
    InactiveOperator(OperatorId),

    /// The note text is blank.
    #[error("note text is required")]
    BlankNote,

    /// Work order not found.
    #[error("work order {0} not found")]
    NotFound(String),

    /// Repository/database error.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl WorkOrderError {
    /// Classify the failure.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::BlankFault
            | Self::InvalidPrice(_)
            | Self::InvalidDueDate(_)
            | Self::InvalidStatus(_)
            | Self::UnknownCustomer(_)
            | Self::UnknownOperator(_)
            | Self::InactiveOperator(_)
            | Self::BlankNote => ErrorKind::Validation,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Repository(e) => e.kind(),
        }
    }
}
