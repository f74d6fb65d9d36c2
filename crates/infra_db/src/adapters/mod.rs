//! Domain Adapters
//!
//! Implementations of domain ports over the PostgreSQL table layer.
//!
//! ```rust,ignore
//! use infra_db::adapters::PostgresTalkStore;
//! use domain_talks::TalkRepository;
//!
//! let repo = TalkRepository::new(PostgresTalkStore::new(pool));
//! let talks = repo.get_talk_summaries(1).await?;
//! ```

pub mod talks;

pub use talks::{PostgresSession, PostgresTalkStore};
