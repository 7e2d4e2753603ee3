//! Workbench desk - record store access and services for the repair shop.
//!
//! This crate sits between the domain types in `workbench-core` and the `wb`
//! command line. It owns everything that touches `PostgreSQL` or produces
//! output:
//!
//! - [`config`] - environment-driven configuration
//! - [`db`] - connection pool, migrations and repositories
//! - [`services`] - customer directory, work orders and operator authentication
//! - [`document`] - printable work-order documents
//!
//! Every service call runs in at most one transaction on one pooled
//! connection. Failures carry an [`ErrorKind`] so callers can tell bad input
//! from conflicts and store outages without matching on messages.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod document;
pub mod error;
pub mod models;
pub mod services;

pub use config::{ConfigError, DatabaseConfig, DeskConfig, LogFormat, LoggingConfig};
pub use error::{DeskError, ErrorKind};
