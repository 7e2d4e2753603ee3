//! Core types for Workbench.
//!
//! This module provides type-safe wrappers for the repair-shop domain.

pub mod cpf;
pub mod email;
pub mod id;
pub mod notes;
pub mod phone;
pub mod price;
pub mod status;

pub use cpf::{Cpf, CpfError};
pub use email::{Email, EmailError};
pub use id::*;
pub use notes::{NOTE_TIMESTAMP_FORMAT, append_note};
pub use phone::format_phone;
pub use price::{Price, PriceError};
pub use status::*;
