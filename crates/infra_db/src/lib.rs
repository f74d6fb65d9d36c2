//! Infrastructure Database Layer
//!
//! The PostgreSQL document store behind the talks catalogue, built on SQLx.
//!
//! # Architecture
//!
//! - [`repositories`] holds the SQL, one table type per table, each bound to
//!   a borrowed connection
//! - [`adapters`] implements the `TalkStore` port on top of it, one
//!   transaction per session
//! - [`pool`], [`config`], [`migrate`] and [`telemetry`] cover startup
//!
//! # Example
//!
//! ```rust,ignore
//! use domain_talks::TalkRepository;
//! use infra_db::{create_pool, run_migrations, DatabaseConfig, PostgresTalkStore};
//!
//! let pool = create_pool(DatabaseConfig::new("postgres://localhost/talks")).await?;
//! run_migrations(&pool).await?;
//! let repo = TalkRepository::new(PostgresTalkStore::new(pool));
//! ```

pub mod adapters;
pub mod config;
pub mod error;
pub mod migrate;
pub mod pool;
pub mod repositories;
pub mod telemetry;

pub use adapters::{PostgresSession, PostgresTalkStore};
pub use config::{LogFormat, TalksConfig, DEFAULT_DATABASE_URL};
pub use error::DatabaseError;
pub use migrate::run_migrations;
pub use pool::{create_pool, DatabaseConfig, DatabasePool};
pub use telemetry::init_tracing;
