//! Customer repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use workbench_core::{Cpf, CustomerId, Email};

use super::{RepositoryError, map_unique_violation};
use crate::models::customer::{Customer, CustomerChanges, NewCustomer};

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for `PostgreSQL` customer queries.
#[derive(Debug, sqlx::FromRow)]
struct CustomerRow {
    id: i32,
    given_name: String,
    family_name: String,
    cpf: String,
    phone: String,
    email: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CustomerRow> for Customer {
    type Error = RepositoryError;

    fn try_from(row: CustomerRow) -> Result<Self, Self::Error> {
        let cpf = Cpf::parse(&row.cpf).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid CPF in database: {e}"))
        })?;
        let email = row
            .email
            .as_deref()
            .map(Email::parse)
            .transpose()
            .map_err(|e| {
                RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
            })?;

        Ok(Self {
            id: CustomerId::new(row.id),
            given_name: row.given_name,
            family_name: row.family_name,
            cpf,
            phone: row.phone,
            email,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Result of a delete attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CustomerDeletion {
    /// The customer row was removed.
    Deleted,
    /// No customer has that ID.
    NotFound,
    /// Work orders still reference the customer.
    Blocked { work_orders: i64 },
}

/// Escape `%`, `_` and `\` so user text matches literally inside `ILIKE`.
fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

fn cpf_conflict(cpf: &Cpf) -> RepositoryError {
    RepositoryError::Conflict(format!("CPF {cpf} is already registered"))
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for customer database operations.
pub struct CustomerRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CustomerRepository<'a> {
    /// Create a new customer repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new customer.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the CPF already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, customer: &NewCustomer) -> Result<Customer, RepositoryError> {
        let row = sqlx::query_as::<_, CustomerRow>(
            r"
            INSERT INTO workshop.customer (given_name, family_name, cpf, phone, email)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, given_name, family_name, cpf, phone, email, created_at, updated_at
            ",
        )
        .bind(&customer.given_name)
        .bind(&customer.family_name)
        .bind(customer.cpf.as_str())
        .bind(&customer.phone)
        .bind(customer.email.as_ref().map(Email::as_str))
        .fetch_one(self.pool)
        .await
        .map_err(|e| map_unique_violation(e, |_| format!("CPF {} is already registered", customer.cpf)))?;

        row.try_into()
    }

    /// Get a customer by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn get_by_id(&self, id: CustomerId) -> Result<Option<Customer>, RepositoryError> {
        let row = sqlx::query_as::<_, CustomerRow>(
            r"
            SELECT id, given_name, family_name, cpf, phone, email, created_at, updated_at
            FROM workshop.customer
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Get a customer by exact (canonical) CPF.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn get_by_cpf(&self, cpf: &Cpf) -> Result<Option<Customer>, RepositoryError> {
        let row = sqlx::query_as::<_, CustomerRow>(
            r"
            SELECT id, given_name, family_name, cpf, phone, email, created_at, updated_at
            FROM workshop.customer
            WHERE cpf = $1
            ",
        )
        .bind(cpf.as_str())
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Case-insensitive substring search on given or family name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn search_by_name(&self, term: &str) -> Result<Vec<Customer>, RepositoryError> {
        let rows = sqlx::query_as::<_, CustomerRow>(
            r"
            SELECT id, given_name, family_name, cpf, phone, email, created_at, updated_at
            FROM workshop.customer
            WHERE given_name ILIKE $1 OR family_name ILIKE $1
            ORDER BY given_name, family_name
            ",
        )
        .bind(like_pattern(term))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// List every customer ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn list_all(&self) -> Result<Vec<Customer>, RepositoryError> {
        let rows = sqlx::query_as::<_, CustomerRow>(
            r"
            SELECT id, given_name, family_name, cpf, phone, email, created_at, updated_at
            FROM workshop.customer
            ORDER BY given_name, family_name
            ",
        )
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Apply a sparse update.
    ///
    /// A new CPF owned by a different customer is a conflict; the same
    /// customer resubmitting its own CPF is not.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the customer doesn't exist.
    /// Returns `RepositoryError::Conflict` if the CPF belongs to another customer.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update(
        &self,
        id: CustomerId,
        changes: &CustomerChanges,
    ) -> Result<Customer, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        if let Some(cpf) = &changes.cpf {
            let owner: Option<i32> = sqlx::query_scalar(
                r"
                SELECT id FROM workshop.customer
                WHERE cpf = $1 AND id <> $2
                ",
            )
            .bind(cpf.as_str())
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;

            if owner.is_some() {
                return Err(cpf_conflict(cpf));
            }
        }

        let email = changes.email.as_ref();
        let row = sqlx::query_as::<_, CustomerRow>(
            r"
            UPDATE workshop.customer
            SET given_name  = COALESCE($2, given_name),
                family_name = COALESCE($3, family_name),
                cpf         = COALESCE($4, cpf),
                phone       = COALESCE($5, phone),
                email       = CASE WHEN $6 THEN $7 ELSE email END
            WHERE id = $1
            RETURNING id, given_name, family_name, cpf, phone, email, created_at, updated_at
            ",
        )
        .bind(id)
        .bind(changes.given_name.as_deref())
        .bind(changes.family_name.as_deref())
        .bind(changes.cpf.as_ref().map(Cpf::as_str))
        .bind(changes.phone.as_deref())
        .bind(email.is_some())
        .bind(email.and_then(Option::as_ref).map(Email::as_str))
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_unique_violation(e, |_| "CPF is already registered".to_owned()))?
        .ok_or(RepositoryError::NotFound)?;

        tx.commit().await?;

        row.try_into()
    }

    /// Delete a customer unless work orders still reference it.
    ///
    /// The customer row is locked first so no work order can be opened for it
    /// between the count and the delete.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn delete(&self, id: CustomerId) -> Result<CustomerDeletion, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let locked: Option<i32> = sqlx::query_scalar(
            r"
            SELECT id FROM workshop.customer
            WHERE id = $1
            FOR UPDATE
            ",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        if locked.is_none() {
            return Ok(CustomerDeletion::NotFound);
        }

        let work_orders: i64 = sqlx::query_scalar(
            r"
            SELECT COUNT(*) FROM workshop.work_order
            WHERE customer_id = $1
            ",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        if work_orders > 0 {
            return Ok(CustomerDeletion::Blocked { work_orders });
        }

        sqlx::query("DELETE FROM workshop.customer WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(CustomerDeletion::Deleted)
    }
}
