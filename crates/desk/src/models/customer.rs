//! Customer domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use workbench_core::{Cpf, CustomerId, Email};

/// A stored customer.
#[derive(Debug, Clone, Serialize)]
pub struct Customer {
    pub id: CustomerId,
    pub given_name: String,
    pub family_name: String,
    /// Canonically formatted CPF (`000.000.000-00`).
    pub cpf: Cpf,
    pub phone: String,
    pub email: Option<Email>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Customer {
    /// Given and family name joined by a space.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.given_name, self.family_name)
    }
}

/// Customer fields as typed at the desk, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CustomerInput {
    pub given_name: String,
    pub family_name: String,
    pub cpf: String,
    pub phone: String,
    pub email: Option<String>,
}

/// A validated customer ready to insert.
#[derive(Debug, Clone)]
pub struct NewCustomer {
    pub given_name: String,
    pub family_name: String,
    pub cpf: Cpf,
    pub phone: String,
    pub email: Option<Email>,
}

/// Sparse customer update as typed at the desk.
///
/// `None` leaves a field untouched. Blank names and phone are ignored; a
/// blank email clears the stored one.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CustomerPatch {
    pub given_name: Option<String>,
    pub family_name: Option<String>,
    pub cpf: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

/// A validated sparse update.
#[allow(clippy::option_option)]
#[derive(Debug, Clone, Default)]
pub struct CustomerChanges {
    pub given_name: Option<String>,
    pub family_name: Option<String>,
    pub cpf: Option<Cpf>,
    pub phone: Option<String>,
    /// `Some(None)` clears the email.
    pub email: Option<Option<Email>>,
}

impl CustomerChanges {
    /// True when the update would not touch any column.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.given_name.is_none()
            && self.family_name.is_none()
            && self.cpf.is_none()
            && self.phone.is_none()
            && self.email.is_none()
    }
}
