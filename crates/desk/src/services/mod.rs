//! Record-oriented operations built on the repositories.
//!
//! Each service is a small stateless struct borrowing the pool. Services
//! validate input before touching the store, so validation failures never
//! leave partial writes; every write is one repository call and therefore
//! at most one transaction.

pub mod auth;
pub mod customers;
pub mod work_orders;

pub use auth::{AuthError, AuthService};
pub use customers::{CustomerError, CustomerService};
pub use work_orders::{WorkOrderError, WorkOrderService};

/// Trim a required field, returning `None` when it is blank.
pub(crate) fn required(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_trims_and_rejects_blank() {
        assert_eq!(required("  Maria "), Some("Maria".to_owned()));
        assert_eq!(required(" \t\n"), None);
    }
}
