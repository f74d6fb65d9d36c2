//! Talks Catalogue Domain
//!
//! This crate holds the talk and speaker documents, the projections built
//! from them, and [`TalkRepository`], the data-access façade that turns
//! catalogue operations into document-store session calls.
//!
//! # Stores
//!
//! The façade is written against the [`TalkStore`] port. Two adapters exist:
//!
//! - **PostgreSQL**: `infra_db::PostgresTalkStore`
//! - **In-memory**: [`InMemoryTalkStore`], for tests and local runs
//!
//! # Concurrency
//!
//! Updates are optimistic. Read a talk with
//! [`TalkRepository::get_talk_for_editing`] to obtain its version token, then
//! hand the token back to [`TalkRepository::update_talk`]. If anyone saved
//! the talk in between, the update fails with [`TalkError::Conflict`].
//!
//! # Examples
//!
//! ```rust
//! use core_kernel::SpeakerId;
//! use domain_talks::{InMemoryTalkStore, NewTalk, Speaker, TalkRepository};
//!
//! # tokio_test_runtime(async {
//! let speaker = Speaker::new(SpeakerId::new(), "Grace Hopper");
//! let store = InMemoryTalkStore::with_speakers(vec![speaker.clone()]).await;
//! let repo = TalkRepository::new(store);
//!
//! let talk = repo
//!     .create_talk(NewTalk::new("Nanoseconds", "A length of wire", speaker.id).with_tags(["history"]))
//!     .await
//!     .unwrap();
//!
//! let detail = repo.get_talk_detail(talk.id).await.unwrap();
//! assert_eq!(detail.speaker.name, "Grace Hopper");
//! # });
//! # fn tokio_test_runtime<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(f)
//! # }
//! ```

pub mod error;
pub mod memory;
pub mod ports;
pub mod projections;
pub mod repository;
pub mod speaker;
pub mod talk;

pub use error::{TalkError, CONFLICT_MESSAGE};
pub use memory::{InMemorySession, InMemoryTalkStore};
pub use ports::{TalkFilter, TalkIndex, TalkQuery, TalkSession, TalkStore};
pub use projections::{SpeakerTalkStats, TagTalkStats, TalkDetail, TalkSummary};
pub use repository::{TalkRepository, SPEAKER_PAGE_SIZE, STATS_RESULT_LIMIT, TALK_PAGE_SIZE};
pub use speaker::Speaker;
pub use talk::{normalize_tags, EditableTalk, NewTalk, StoredTalk, Talk, TalkForEditing, UpdatedTalk};
