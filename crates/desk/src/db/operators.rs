//! Operator repository for database operations.
//!
//! Password hashes are only read through [`OperatorRepository::get_credentials`]
//! and [`OperatorRepository::get_password_hash`]; every other query returns
//! [`Operator`] without the hash.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use workbench_core::{Email, OperatorId};

use super::{RepositoryError, map_unique_violation};
use crate::models::operator::{NewOperator, Operator};

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for `PostgreSQL` operator queries.
#[derive(Debug, sqlx::FromRow)]
struct OperatorRow {
    id: i32,
    username: String,
    display_name: String,
    email: String,
    active: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<OperatorRow> for Operator {
    type Error = RepositoryError;

    fn try_from(row: OperatorRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: OperatorId::new(row.id),
            username: row.username,
            display_name: row.display_name,
            email,
            active: row.active,
            created_at: row.created_at,
        })
    }
}

/// Operator row together with its password hash.
#[derive(Debug, sqlx::FromRow)]
struct OperatorCredentialRow {
    #[sqlx(flatten)]
    operator: OperatorRow,
    password_hash: String,
}

/// Describe which unique constraint an insert tripped.
fn describe_conflict(constraint: Option<&str>, operator: &NewOperator) -> String {
    match constraint {
        Some("operator_username_key") => {
            format!("username `{}` is already taken", operator.username)
        }
        Some("operator_email_key") => {
            format!("email {} is already registered", operator.email)
        }
        _ => "operator already exists".to_owned(),
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for operator database operations.
pub struct OperatorRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OperatorRepository<'a> {
    /// Create a new operator repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new operator with an already-hashed password.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the username or email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        operator: &NewOperator,
        password_hash: &str,
    ) -> Result<Operator, RepositoryError> {
        let row = sqlx::query_as::<_, OperatorRow>(
            r"
            INSERT INTO workshop.operator (username, password_hash, display_name, email)
            VALUES ($1, $2, $3, $4)
            RETURNING id, username, display_name, email, active, created_at
            ",
        )
        .bind(&operator.username)
        .bind(password_hash)
        .bind(&operator.display_name)
        .bind(operator.email.as_str())
        .fetch_one(self.pool)
        .await
        .map_err(|e| map_unique_violation(e, |constraint| describe_conflict(constraint, operator)))?;

        row.try_into()
    }

    /// Get an operator by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn get_by_id(&self, id: OperatorId) -> Result<Option<Operator>, RepositoryError> {
        let row = sqlx::query_as::<_, OperatorRow>(
            r"
            SELECT id, username, display_name, email, active, created_at
            FROM workshop.operator
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Get an operator and password hash by username, active or not.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn get_credentials(
        &self,
        username: &str,
    ) -> Result<Option<(Operator, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, OperatorCredentialRow>(
            r"
            SELECT id, username, display_name, email, active, created_at, password_hash
            FROM workshop.operator
            WHERE username = $1
            ",
        )
        .bind(username)
        .fetch_optional(self.pool)
        .await?;

        row.map(|r| -> Result<(Operator, String), RepositoryError> {
            Ok((Operator::try_from(r.operator)?, r.password_hash))
        })
        .transpose()
    }

    /// Get the password hash for an operator.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_password_hash(&self, id: OperatorId) -> Result<Option<String>, RepositoryError> {
        let hash = sqlx::query_scalar(
            r"
            SELECT password_hash FROM workshop.operator
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(hash)
    }

    /// Replace an operator's password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the operator doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn set_password_hash(
        &self,
        id: OperatorId,
        password_hash: &str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE workshop.operator
            SET password_hash = $2
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(password_hash)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Replace the password hash of the operator with this username.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no operator has that username.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn set_password_hash_by_username(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<Operator, RepositoryError> {
        let row = sqlx::query_as::<_, OperatorRow>(
            r"
            UPDATE workshop.operator
            SET password_hash = $2
            WHERE username = $1
            RETURNING id, username, display_name, email, active, created_at
            ",
        )
        .bind(username)
        .bind(password_hash)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }

    /// Enable or disable an operator.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no operator has that username.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn set_active(&self, username: &str, active: bool) -> Result<Operator, RepositoryError> {
        let row = sqlx::query_as::<_, OperatorRow>(
            r"
            UPDATE workshop.operator
            SET active = $2
            WHERE username = $1
            RETURNING id, username, display_name, email, active, created_at
            ",
        )
        .bind(username)
        .bind(active)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }

    /// List all operators ordered by display name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn list_all(&self) -> Result<Vec<Operator>, RepositoryError> {
        let rows = sqlx::query_as::<_, OperatorRow>(
            r"
            SELECT id, username, display_name, email, active, created_at
            FROM workshop.operator
            ORDER BY display_name
            ",
        )
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn operator() -> NewOperator {
        NewOperator {
            username: "balcao".to_owned(),
            display_name: "Balcão".to_owned(),
            email: Email::parse("balcao@loja.com.br").unwrap(),
        }
    }

    #[test]
    fn test_describe_conflict_by_constraint() {
        let op = operator();
        assert_eq!(
            describe_conflict(Some("operator_username_key"), &op),
            "username `balcao` is already taken"
        );
        assert_eq!(
            describe_conflict(Some("operator_email_key"), &op),
            "email balcao@loja.com.br is already registered"
        );
        assert_eq!(describe_conflict(None, &op), "operator already exists");
    }
}
