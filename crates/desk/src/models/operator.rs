//! Operator domain types.
//!
//! Operators are the shop's staff accounts. The stored password hash never
//! leaves the repository layer except for verification.

use chrono::{DateTime, Utc};
use serde::Serialize;

use workbench_core::{Email, OperatorId};

/// An operator account, without its password hash.
#[derive(Debug, Clone, Serialize)]
pub struct Operator {
    pub id: OperatorId,
    pub username: String,
    pub display_name: String,
    pub email: Email,
    /// Inactive operators cannot log in.
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// New operator fields as typed by an administrator.
#[derive(Debug, Clone, Default)]
pub struct OperatorInput {
    pub username: String,
    pub password: String,
    pub display_name: String,
    pub email: String,
}

/// A validated operator ready to insert (the hash is passed separately).
#[derive(Debug, Clone)]
pub struct NewOperator {
    pub username: String,
    pub display_name: String,
    pub email: Email,
}
