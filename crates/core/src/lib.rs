//! Workbench Core - Shared domain types.
//!
//! This crate provides the types shared by every Workbench component:
//! - `desk` - Record store access, services and document rendering
//! - `cli` - The `wb` command-line front end
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access. The national ID check-digit rules and the work-order lifecycle live
//! here so they can be tested without a database.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, CPF, email, price, phone formatting, work-order
//!   status and append-only notes

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
