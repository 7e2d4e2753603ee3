//! Operator authentication service.
//!
//! Username and password login against Argon2id hashes, plus the
//! administrative operations used to manage operator accounts.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sqlx::PgPool;
use tracing::instrument;

use workbench_core::{Email, OperatorId};

use super::required;
use crate::db::RepositoryError;
use crate::db::operators::OperatorRepository;
use crate::models::operator::{NewOperator, Operator, OperatorInput};

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 4;

/// Minimum username length.
pub const MIN_USERNAME_LENGTH: usize = 3;

/// Authentication service.
pub struct AuthService<'a> {
    operators: OperatorRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            operators: OperatorRepository::new(pool),
        }
    }

    /// Log in with username and password.
    ///
    /// Blank input, an unknown username, an inactive operator and a wrong
    /// password all fail the same way.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the login is rejected.
    #[instrument(skip(self, password))]
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<Operator, AuthError> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(AuthError::InvalidCredentials);
        }

        let Some((operator, password_hash)) = self.operators.get_credentials(username).await? else {
            tracing::warn!("Login rejected: unknown username");
            return Err(AuthError::InvalidCredentials);
        };

        if !operator.active {
            tracing::warn!(operator_id = %operator.id, "Login rejected: operator inactive");
            return Err(AuthError::InvalidCredentials);
        }

        if let Err(e) = verify_password(password, &password_hash) {
            tracing::warn!(operator_id = %operator.id, "Login rejected: wrong password");
            return Err(e);
        }

        tracing::info!(operator_id = %operator.id, "Operator logged in");
        Ok(operator)
    }

    /// Change an operator's password after re-checking the current one.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::WeakPassword` if the new password is too short.
    /// Returns `AuthError::InvalidCredentials` if the current password is wrong.
    /// Returns `AuthError::OperatorNotFound` if the operator doesn't exist.
    #[instrument(skip(self, current_password, new_password))]
    pub async fn change_password(
        &self,
        id: OperatorId,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        validate_password(new_password)?;

        let password_hash = self
            .operators
            .get_password_hash(id)
            .await?
            .ok_or(AuthError::OperatorNotFound)?;
        verify_password(current_password, &password_hash)?;

        let new_hash = hash_password(new_password)?;
        self.operators
            .set_password_hash(id, &new_hash)
            .await
            .map_err(not_found_as_operator)?;

        tracing::info!(operator_id = %id, "Password changed");
        Ok(())
    }

    /// Create a new operator account.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a short username or password, a blank
    /// display name or a malformed email.
    /// Returns `AuthError::OperatorExists` if the username or email is taken.
    #[instrument(skip(self, input), fields(username = %input.username.trim()))]
    pub async fn create_operator(&self, input: &OperatorInput) -> Result<Operator, AuthError> {
        let operator = validate_operator(input)?;
        let password_hash = hash_password(&input.password)?;

        let created = self
            .operators
            .create(&operator, &password_hash)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(message) => AuthError::OperatorExists(message),
                other => AuthError::Repository(other),
            })?;

        tracing::info!(operator_id = %created.id, "Operator created");
        Ok(created)
    }

    /// List all operators ordered by display name.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the query fails.
    pub async fn list_operators(&self) -> Result<Vec<Operator>, AuthError> {
        Ok(self.operators.list_all().await?)
    }

    /// Enable or disable an operator. Disabled operators cannot log in.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::OperatorNotFound` if no operator has that username.
    #[instrument(skip(self))]
    pub async fn set_active(&self, username: &str, active: bool) -> Result<Operator, AuthError> {
        let operator = self
            .operators
            .set_active(username.trim(), active)
            .await
            .map_err(not_found_as_operator)?;

        tracing::info!(operator_id = %operator.id, active, "Operator status changed");
        Ok(operator)
    }

    /// Set a new password without the current one (administrator reset).
    ///
    /// # Errors
    ///
    /// Returns `AuthError::WeakPassword` if the new password is too short.
    /// Returns `AuthError::OperatorNotFound` if no operator has that username.
    #[instrument(skip(self, new_password))]
    pub async fn reset_password(
        &self,
        username: &str,
        new_password: &str,
    ) -> Result<Operator, AuthError> {
        validate_password(new_password)?;
        let new_hash = hash_password(new_password)?;

        let operator = self
            .operators
            .set_password_hash_by_username(username.trim(), &new_hash)
            .await
            .map_err(not_found_as_operator)?;

        tracing::warn!(operator_id = %operator.id, "Password reset by administrator");
        Ok(operator)
    }
}

fn not_found_as_operator(e: RepositoryError) -> AuthError {
    match e {
        RepositoryError::NotFound => AuthError::OperatorNotFound,
        other => AuthError::Repository(other),
    }
}

/// Validate a new operator's fields.
///
/// # Errors
///
/// Returns the first failing rule: username length, password length,
/// display name, then email.
pub fn validate_operator(input: &OperatorInput) -> Result<NewOperator, AuthError> {
    let username = input.username.trim();
    if username.chars().count() < MIN_USERNAME_LENGTH {
        return Err(AuthError::InvalidUsername {
            min: MIN_USERNAME_LENGTH,
        });
    }
    validate_password(&input.password)?;
    let display_name = required(&input.display_name).ok_or(AuthError::MissingDisplayName)?;
    let email = Email::parse(&input.email)?;

    Ok(NewOperator {
        username: username.to_owned(),
        display_name,
        email,
    })
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword {
            min: MIN_PASSWORD_LENGTH,
        });
    }
    Ok(())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}
