//! Talk Store Ports
//!
//! This module defines the document-store session API the façade is written
//! against. A [`TalkStore`] hands out short-lived [`TalkSession`]s; each
//! session is a unit of work that batches reads and writes and is released
//! when it goes out of scope.
//!
//! # Sessions
//!
//! Writes issued through a session become durable only once
//! [`TalkSession::save_changes`] succeeds. Dropping a session without saving
//! discards its writes and returns any connection it held. This holds on
//! every exit path, including an early `?` return or a cancelled future.
//!
//! # Indexes
//!
//! Listing, filtering, search and aggregation go through secondary indexes
//! the store maintains. The façade refers to them by name through
//! [`TalkIndex`]; how an adapter realises each index is its own business.
//!
//! ```rust,ignore
//! let mut session = store.open_session().await?;
//! let page = session
//!     .query_talks(&TalkQuery::new(TalkFilter::ByTag("rust".into()), Page::first(10)))
//!     .await?;
//! ```

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;

use core_kernel::{DomainPort, HealthCheckable, Page, PortError, SpeakerId, TalkId, VersionToken};

use crate::projections::{SpeakerTalkStats, TagTalkStats};
use crate::speaker::Speaker;
use crate::talk::{NewTalk, StoredTalk, Talk};

/// Secondary indexes and aggregations the store maintains, by name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TalkIndex {
    /// Every talk, ordered by id
    All,
    /// Talks keyed by speaker reference
    BySpeaker,
    /// Talks keyed by tag membership
    ByTag,
    /// Full-text index over headline (boosted) and description
    Search,
    /// Talk counts reduced per speaker
    SpeakerStats,
    /// Talk counts reduced per tag
    TagStats,
}

impl TalkIndex {
    /// The index name as registered with the store
    pub fn name(&self) -> &'static str {
        match self {
            TalkIndex::All => "Talks/All",
            TalkIndex::BySpeaker => "Talks/BySpeaker",
            TalkIndex::ByTag => "Talks/ByTag",
            TalkIndex::Search => "Talks/Search",
            TalkIndex::SpeakerStats => "Talks/SpeakerStats",
            TalkIndex::TagStats => "Talks/TagStats",
        }
    }
}

impl fmt::Display for TalkIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What a talk query selects
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TalkFilter {
    All,
    BySpeaker(SpeakerId),
    ByTag(String),
    /// Free text matched against headline and description
    Search(String),
}

/// A paged query against one of the talk indexes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TalkQuery {
    pub filter: TalkFilter,
    pub skip: u64,
    pub take: u64,
}

impl TalkQuery {
    pub fn new(filter: TalkFilter, page: Page) -> Self {
        Self {
            filter,
            skip: page.skip(),
            take: page.take(),
        }
    }

    /// The index that answers this query
    pub fn index(&self) -> TalkIndex {
        match self.filter {
            TalkFilter::All => TalkIndex::All,
            TalkFilter::BySpeaker(_) => TalkIndex::BySpeaker,
            TalkFilter::ByTag(_) => TalkIndex::ByTag,
            TalkFilter::Search(_) => TalkIndex::Search,
        }
    }
}

/// A document store holding talks and speakers
///
/// Implementations must be cheap to share; the façade keeps one behind an
/// `Arc` and opens a fresh session per operation.
#[async_trait]
pub trait TalkStore: DomainPort + HealthCheckable {
    type Session: TalkSession;

    /// Opens a unit of work against the store
    ///
    /// # Errors
    ///
    /// Returns `PortError::Connection` or `PortError::ServiceUnavailable` if
    /// the store cannot be reached
    async fn open_session(&self) -> Result<Self::Session, PortError>;
}

/// A unit of work against a [`TalkStore`]
#[async_trait]
pub trait TalkSession: Send + Sized {
    /// Loads a talk and its current version
    async fn load_talk(&mut self, id: TalkId) -> Result<Option<StoredTalk>, PortError>;

    /// Loads a talk and prefetches its speaker in the same round trip
    ///
    /// The speaker is `None` when the talk references a missing speaker.
    async fn load_talk_including_speaker(
        &mut self,
        id: TalkId,
    ) -> Result<Option<(StoredTalk, Option<Speaker>)>, PortError>;

    /// Loads a batch of speakers by id; missing ids are left out of the map
    async fn load_speakers(
        &mut self,
        ids: &[SpeakerId],
    ) -> Result<HashMap<SpeakerId, Speaker>, PortError>;

    /// Scans speaker documents in id order, up to `limit`
    async fn scan_speakers(&mut self, limit: u64) -> Result<Vec<Speaker>, PortError>;

    /// Runs a paged query against a talk index
    async fn query_talks(&mut self, query: &TalkQuery) -> Result<Vec<Talk>, PortError>;

    /// Reads the per-speaker aggregation, largest counts first
    async fn speaker_talk_stats(&mut self, limit: u64) -> Result<Vec<SpeakerTalkStats>, PortError>;

    /// Reads the per-tag aggregation, largest counts first
    async fn tag_talk_stats(&mut self, limit: u64) -> Result<Vec<TagTalkStats>, PortError>;

    /// Stores a new talk; the store assigns its id and first version
    async fn store_talk(&mut self, new_talk: NewTalk) -> Result<StoredTalk, PortError>;

    /// Replaces a talk if its stored version still equals `expected`
    ///
    /// # Errors
    ///
    /// * `PortError::NotFound` - no talk with `talk.id`
    /// * `PortError::ConcurrencyViolation` - the stored version moved on
    async fn replace_talk(
        &mut self,
        talk: &Talk,
        expected: VersionToken,
    ) -> Result<StoredTalk, PortError>;

    /// Deletes a talk, returning whether one existed
    async fn delete_talk(&mut self, id: TalkId) -> Result<bool, PortError>;

    /// Makes the session's writes durable and ends the session
    async fn save_changes(self) -> Result<(), PortError>;
}
