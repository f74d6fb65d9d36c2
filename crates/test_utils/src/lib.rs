//! Test Utilities Crate
//!
//! Shared test infrastructure for the talks catalogue.
//!
//! # Modules
//!
//! - `fixtures`: Well-known speakers and ready-made stores
//! - `builders`: Builders for talk payloads
//! - `database`: A disposable PostgreSQL container with the schema applied
//! - `assertions`: Ordering checks for listings and aggregations
//! - `generators`: Property-based test data generators

pub mod assertions;
pub mod builders;
pub mod database;
pub mod fixtures;
pub mod generators;

pub use assertions::*;
pub use builders::*;
pub use database::*;
pub use fixtures::*;
pub use generators::*;
