//! Customer directory service.
//!
//! Create, update, delete and search customers. CPFs are validated and
//! stored in canonical `000.000.000-00` form, and a CPF can belong to only
//! one customer.

mod error;

pub use error::CustomerError;

use sqlx::PgPool;
use tracing::instrument;

use workbench_core::{Cpf, CustomerId, Email};

use super::required;
use crate::db::RepositoryError;
use crate::db::customers::{CustomerDeletion, CustomerRepository};
use crate::models::customer::{
    Customer, CustomerChanges, CustomerInput, CustomerPatch, NewCustomer,
};

/// Customer directory service.
pub struct CustomerService<'a> {
    customers: CustomerRepository<'a>,
}

impl<'a> CustomerService<'a> {
    /// Create a new customer service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            customers: CustomerRepository::new(pool),
        }
    }

    /// Register a new customer.
    ///
    /// # Errors
    ///
    /// Returns `CustomerError::MissingField` if a name or the phone is blank.
    /// Returns `CustomerError::InvalidCpf` or `InvalidEmail` for malformed values.
    /// Returns `CustomerError::DuplicateCpf` if the CPF is already registered.
    #[instrument(skip(self, input))]
    pub async fn create(&self, input: &CustomerInput) -> Result<Customer, CustomerError> {
        let customer = validate_new(input)?;

        let created = self
            .customers
            .create(&customer)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => {
                    CustomerError::DuplicateCpf(customer.cpf.to_string())
                }
                other => CustomerError::Repository(other),
            })?;

        tracing::info!(customer_id = %created.id, "Customer created");
        Ok(created)
    }

    /// Apply a sparse update. Supplying nothing returns the customer unchanged.
    ///
    /// # Errors
    ///
    /// Returns `CustomerError::NotFound` if the customer doesn't exist.
    /// Returns `CustomerError::InvalidCpf` or `InvalidEmail` for malformed values.
    /// Returns `CustomerError::DuplicateCpf` if the CPF belongs to another customer.
    #[instrument(skip(self, patch))]
    pub async fn update(
        &self,
        id: CustomerId,
        patch: &CustomerPatch,
    ) -> Result<Customer, CustomerError> {
        let changes = validate_patch(patch)?;
        if changes.is_empty() {
            tracing::warn!("No customer fields to update");
            return self.get(id).await;
        }

        let updated = self
            .customers
            .update(id, &changes)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => CustomerError::NotFound(id),
                RepositoryError::Conflict(_) => CustomerError::DuplicateCpf(
                    changes.cpf.as_ref().map(ToString::to_string).unwrap_or_default(),
                ),
                other => CustomerError::Repository(other),
            })?;

        tracing::info!(customer_id = %id, "Customer updated");
        Ok(updated)
    }

    /// Delete a customer that has no work orders.
    ///
    /// # Errors
    ///
    /// Returns `CustomerError::HasWorkOrders` with the blocking count if any
    /// work order references the customer.
    /// Returns `CustomerError::NotFound` if the customer doesn't exist.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: CustomerId) -> Result<(), CustomerError> {
        match self.customers.delete(id).await? {
            CustomerDeletion::Deleted => {
                tracing::info!(customer_id = %id, "Customer deleted");
                Ok(())
            }
            CustomerDeletion::NotFound => Err(CustomerError::NotFound(id)),
            CustomerDeletion::Blocked { work_orders } => {
                tracing::warn!(customer_id = %id, work_orders, "Customer delete blocked");
                Err(CustomerError::HasWorkOrders { count: work_orders })
            }
        }
    }

    /// Get a customer by ID.
    ///
    /// # Errors
    ///
    /// Returns `CustomerError::NotFound` if the customer doesn't exist.
    pub async fn get(&self, id: CustomerId) -> Result<Customer, CustomerError> {
        self.customers
            .get_by_id(id)
            .await?
            .ok_or(CustomerError::NotFound(id))
    }

    /// Find a customer by CPF, with or without punctuation.
    ///
    /// # Errors
    ///
    /// Returns `CustomerError::InvalidCpf` if the input is not a valid CPF.
    pub async fn find_by_cpf(&self, cpf: &str) -> Result<Option<Customer>, CustomerError> {
        let cpf = Cpf::parse(cpf)?;
        Ok(self.customers.get_by_cpf(&cpf).await?)
    }

    /// Case-insensitive substring search on given or family name.
    ///
    /// # Errors
    ///
    /// Returns `CustomerError::Repository` if the query fails.
    pub async fn search_by_name(&self, term: &str) -> Result<Vec<Customer>, CustomerError> {
        Ok(self.customers.search_by_name(term.trim()).await?)
    }

    /// Search by CPF when the term is a valid CPF, otherwise by name.
    ///
    /// # Errors
    ///
    /// Returns `CustomerError::Repository` if the query fails.
    #[instrument(skip(self))]
    pub async fn search(&self, term: &str) -> Result<Vec<Customer>, CustomerError> {
        if let Ok(cpf) = Cpf::parse(term) {
            return Ok(self.customers.get_by_cpf(&cpf).await?.into_iter().collect());
        }
        self.search_by_name(term).await
    }

    /// List every customer ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `CustomerError::Repository` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<Customer>, CustomerError> {
        Ok(self.customers.list_all().await?)
    }
}

/// Validate and normalize a new customer.
///
/// # Errors
///
/// Returns the first failing field in form order: given name, family name,
/// CPF, phone, then email.
pub fn validate_new(input: &CustomerInput) -> Result<NewCustomer, CustomerError> {
    let given_name = required(&input.given_name).ok_or(CustomerError::MissingField("given name"))?;
    let family_name =
        required(&input.family_name).ok_or(CustomerError::MissingField("family name"))?;
    let cpf = Cpf::parse(&input.cpf)?;
    let phone = required(&input.phone).ok_or(CustomerError::MissingField("phone"))?;
    let email = input
        .email
        .as_deref()
        .map(Email::parse_optional)
        .transpose()?
        .flatten();

    Ok(NewCustomer {
        given_name,
        family_name,
        cpf,
        phone,
        email,
    })
}

/// Validate a sparse update.
///
/// Blank names and phone are dropped rather than rejected; a blank email
/// becomes an explicit clear.
///
/// # Errors
///
/// Returns `CustomerError::InvalidCpf` or `InvalidEmail` for malformed values.
pub fn validate_patch(patch: &CustomerPatch) -> Result<CustomerChanges, CustomerError> {
    let cpf = patch.cpf.as_deref().map(Cpf::parse).transpose()?;
    let email = patch
        .email
        .as_deref()
        .map(Email::parse_optional)
        .transpose()?;

    Ok(CustomerChanges {
        given_name: patch.given_name.as_deref().and_then(required),
        family_name: patch.family_name.as_deref().and_then(required),
        cpf,
        phone: patch.phone.as_deref().and_then(required),
        email,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use workbench_core::CpfError;

    use super::*;
    use crate::error::ErrorKind;

    fn input() -> CustomerInput {
        CustomerInput {
            given_name: " Maria ".to_owned(),
            family_name: "Souza".to_owned(),
            cpf: "52998224725".to_owned(),
            phone: "(11) 98765-4321".to_owned(),
            email: Some("maria@email.com".to_owned()),
        }
    }

    #[test]
    fn test_validate_new_normalizes() {
        let customer = validate_new(&input()).unwrap();
        assert_eq!(customer.given_name, "Maria");
        assert_eq!(customer.cpf.as_str(), "529.982.247-25");
        assert_eq!(customer.email.unwrap().as_str(), "maria@email.com");
    }

    #[test]
    fn test_validate_new_blank_email_is_none() {
        let customer = validate_new(&CustomerInput {
            email: Some("  ".to_owned()),
            ..input()
        })
        .unwrap();
        assert!(customer.email.is_none());
    }

    #[test]
    fn test_validate_new_rejects_repeated_digit_cpf() {
        let err = validate_new(&CustomerInput {
            cpf: "111.111.111-11".to_owned(),
            ..input()
        })
        .unwrap_err();

        assert!(matches!(err, CustomerError::InvalidCpf(CpfError::RepeatedDigits)));
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_validate_new_requires_fields() {
        let err = validate_new(&CustomerInput {
            family_name: "   ".to_owned(),
            ..input()
        })
        .unwrap_err();
        assert!(matches!(err, CustomerError::MissingField("family name")));

        let err = validate_new(&CustomerInput {
            phone: String::new(),
            ..input()
        })
        .unwrap_err();
        assert!(matches!(err, CustomerError::MissingField("phone")));
    }

    #[test]
    fn test_validate_new_rejects_bad_email() {
        let err = validate_new(&CustomerInput {
            email: Some("maria.email.com".to_owned()),
            ..input()
        })
        .unwrap_err();
        assert!(matches!(err, CustomerError::InvalidEmail(_)));
    }

    #[test]
    fn test_validate_patch_drops_blank_names() {
        let changes = validate_patch(&CustomerPatch {
            given_name: Some("  ".to_owned()),
            phone: Some("(11) 3333-4444".to_owned()),
            ..CustomerPatch::default()
        })
        .unwrap();

        assert!(changes.given_name.is_none());
        assert_eq!(changes.phone.as_deref(), Some("(11) 3333-4444"));
        assert!(changes.email.is_none());
    }

    #[test]
    fn test_validate_patch_blank_email_clears() {
        let changes = validate_patch(&CustomerPatch {
            email: Some(String::new()),
            ..CustomerPatch::default()
        })
        .unwrap();
        assert_eq!(changes.email, Some(None));
    }

    #[test]
    fn test_validate_patch_checks_cpf() {
        let err = validate_patch(&CustomerPatch {
            cpf: Some("123.456.789-00".to_owned()),
            ..CustomerPatch::default()
        })
        .unwrap_err();
        assert!(matches!(err, CustomerError::InvalidCpf(CpfError::CheckDigitMismatch)));
    }

    #[test]
    fn test_empty_patch_is_empty() {
        assert!(validate_patch(&CustomerPatch::default()).unwrap().is_empty());
    }

    #[test]
    fn test_delete_blocked_message_states_count() {
        let err = CustomerError::HasWorkOrders { count: 3 };
        assert!(err.to_string().contains('3'));
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[test]
    fn test_repository_error_reads_once() {
        let err = CustomerError::from(RepositoryError::Database(sqlx::Error::PoolTimedOut));
        assert_eq!(
            err.to_string(),
            RepositoryError::Database(sqlx::Error::PoolTimedOut).to_string()
        );
        assert_eq!(err.kind(), ErrorKind::Infrastructure);
    }
}
