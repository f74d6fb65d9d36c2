//! Talk repository
//!
//! The façade the rest of the application talks to. Every method opens its
//! own session, issues the loads, queries or writes it needs, and maps the
//! results into projections. The session is released when the method
//! returns, whichever way it returns.
//!
//! # Example
//!
//! ```rust,ignore
//! use domain_talks::{InMemoryTalkStore, NewTalk, TalkRepository};
//!
//! let repo = TalkRepository::new(InMemoryTalkStore::new());
//! let talk = repo.create_talk(NewTalk::new("Pinning", "Why futures move", speaker_id)).await?;
//! let editing = repo.get_talk_for_editing(talk.id).await?;
//! repo.update_talk(talk.id, editing.talk.into(), editing.version).await?;
//! ```

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use core_kernel::{Page, PortError, SpeakerId, TalkId, VersionToken};

use crate::error::TalkError;
use crate::ports::{TalkFilter, TalkQuery, TalkSession, TalkStore};
use crate::projections::{SpeakerTalkStats, TagTalkStats, TalkDetail, TalkSummary};
use crate::speaker::Speaker;
use crate::talk::{normalize_tags, NewTalk, Talk, TalkForEditing, UpdatedTalk};

/// Talks per listing page
pub const TALK_PAGE_SIZE: u32 = 10;

/// Upper bound on the speaker scan
pub const SPEAKER_PAGE_SIZE: u64 = 1024;

/// Upper bound on rows read from an aggregation index
pub const STATS_RESULT_LIMIT: u64 = 1024;

/// Data-access façade over a [`TalkStore`]
///
/// Holds no state besides the shared store handle, so clones can be used
/// from any number of tasks at once. Concurrent edits of the same talk are
/// arbitrated by the store through version tokens.
#[derive(Debug)]
pub struct TalkRepository<S> {
    store: Arc<S>,
}

impl<S> Clone for TalkRepository<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: TalkStore> TalkRepository<S> {
    /// Creates a repository over the given store
    pub fn new(store: S) -> Self {
        Self::from_shared(Arc::new(store))
    }

    /// Creates a repository over a store that is already shared
    pub fn from_shared(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Returns the underlying store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Creates a talk and returns it with its store-assigned id
    ///
    /// Tags are trimmed and empty tags dropped. Nothing else is validated.
    #[instrument(skip(self, new_talk), fields(speaker_id = %new_talk.speaker_id))]
    pub async fn create_talk(&self, mut new_talk: NewTalk) -> Result<Talk, TalkError> {
        new_talk.tags = normalize_tags(new_talk.tags);

        let mut session = self.store.open_session().await?;
        let stored = session.store_talk(new_talk).await?;
        session.save_changes().await?;

        info!(talk_id = %stored.talk.id, "Talk created");
        Ok(stored.talk)
    }

    /// Loads a talk merged with its speaker
    ///
    /// The speaker is prefetched alongside the talk in one round trip.
    ///
    /// # Errors
    ///
    /// * `TalkError::NotFound` - no such talk, or its speaker is missing
    #[instrument(skip(self), fields(talk_id = %id))]
    pub async fn get_talk_detail(&self, id: TalkId) -> Result<TalkDetail, TalkError> {
        let mut session = self.store.open_session().await?;
        let (stored, speaker) = session
            .load_talk_including_speaker(id)
            .await?
            .ok_or_else(|| TalkError::not_found("Talk", id))?;

        let speaker_id = stored.talk.speaker_id;
        let speaker = speaker.ok_or_else(|| TalkError::not_found("Speaker", speaker_id))?;
        Ok(TalkDetail::new(stored.talk, speaker))
    }

    /// Lists speakers in id order, at most [`SPEAKER_PAGE_SIZE`]
    #[instrument(skip(self))]
    pub async fn get_speakers(&self) -> Result<Vec<Speaker>, TalkError> {
        let mut session = self.store.open_session().await?;
        let speakers = session.scan_speakers(SPEAKER_PAGE_SIZE).await?;
        debug!(count = speakers.len(), "Loaded speakers");
        Ok(speakers)
    }

    /// Overwrites a talk's mutable fields if `version` is still current
    ///
    /// Tags are normalised the same way as on create.
    ///
    /// # Errors
    ///
    /// * `TalkError::NotFound` - no such talk
    /// * `TalkError::Conflict` - someone else saved the talk since `version`
    ///   was read; nothing is written
    #[instrument(skip(self, update), fields(talk_id = %id, expected_version = %version))]
    pub async fn update_talk(
        &self,
        id: TalkId,
        mut update: UpdatedTalk,
        version: VersionToken,
    ) -> Result<Talk, TalkError> {
        update.tags = normalize_tags(update.tags);

        let mut session = self.store.open_session().await?;
        let mut talk = session
            .load_talk(id)
            .await?
            .ok_or_else(|| TalkError::not_found("Talk", id))?
            .talk;
        update.apply_to(&mut talk);

        let saved = session
            .replace_talk(&talk, version)
            .await
            .map_err(update_error)?;
        session.save_changes().await.map_err(update_error)?;

        info!(new_version = %saved.version, "Talk updated");
        Ok(saved.talk)
    }

    /// Deletes a talk; returns `false` if there was nothing to delete
    #[instrument(skip(self), fields(talk_id = %id))]
    pub async fn delete_talk(&self, id: TalkId) -> Result<bool, TalkError> {
        let mut session = self.store.open_session().await?;
        let deleted = session.delete_talk(id).await?;
        session.save_changes().await?;

        info!(deleted, "Talk delete processed");
        Ok(deleted)
    }

    /// Reads talk counts per speaker from the aggregation index
    #[instrument(skip(self))]
    pub async fn get_speaker_talk_stats(&self) -> Result<Vec<SpeakerTalkStats>, TalkError> {
        let mut session = self.store.open_session().await?;
        Ok(session.speaker_talk_stats(STATS_RESULT_LIMIT).await?)
    }

    /// Reads talk counts per tag from the aggregation index
    #[instrument(skip(self))]
    pub async fn get_tag_talk_stats(&self) -> Result<Vec<TagTalkStats>, TalkError> {
        let mut session = self.store.open_session().await?;
        Ok(session.tag_talk_stats(STATS_RESULT_LIMIT).await?)
    }

    /// Loads a talk's editable fields and the version token an update needs
    #[instrument(skip(self), fields(talk_id = %id))]
    pub async fn get_talk_for_editing(&self, id: TalkId) -> Result<TalkForEditing, TalkError> {
        let mut session = self.store.open_session().await?;
        let stored = session
            .load_talk(id)
            .await?
            .ok_or_else(|| TalkError::not_found("Talk", id))?;

        Ok(TalkForEditing {
            talk: stored.talk.into(),
            version: stored.version,
        })
    }

    /// Lists talks in id order, one page at a time
    #[instrument(skip(self))]
    pub async fn get_talk_summaries(&self, page: i64) -> Result<Vec<TalkSummary>, TalkError> {
        self.list(TalkFilter::All, page).await
    }

    /// Lists a speaker's talks
    #[instrument(skip(self))]
    pub async fn get_talks_by_speaker(
        &self,
        speaker_id: SpeakerId,
        page: i64,
    ) -> Result<Vec<TalkSummary>, TalkError> {
        self.list(TalkFilter::BySpeaker(speaker_id), page).await
    }

    /// Lists talks carrying a tag
    #[instrument(skip(self))]
    pub async fn get_talks_by_tag(
        &self,
        tag: &str,
        page: i64,
    ) -> Result<Vec<TalkSummary>, TalkError> {
        self.list(TalkFilter::ByTag(tag.trim().to_string()), page).await
    }

    /// Full-text search over headlines and descriptions, best matches first
    ///
    /// Headline matches rank above description matches. Blank text returns
    /// an empty page.
    #[instrument(skip(self))]
    pub async fn search_talks(&self, text: &str, page: i64) -> Result<Vec<TalkSummary>, TalkError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(Vec::new());
        }
        self.list(TalkFilter::Search(text.to_string()), page).await
    }

    async fn list(&self, filter: TalkFilter, page: i64) -> Result<Vec<TalkSummary>, TalkError> {
        let query = TalkQuery::new(filter, Page::new(page, TALK_PAGE_SIZE));

        let mut session = self.store.open_session().await?;
        let talks = session.query_talks(&query).await?;

        // One batched load resolves every speaker on the page
        let speaker_ids: Vec<SpeakerId> = talks
            .iter()
            .map(|talk| talk.speaker_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let speakers = if speaker_ids.is_empty() {
            Default::default()
        } else {
            session.load_speakers(&speaker_ids).await?
        };

        debug!(
            index = %query.index(),
            skip = query.skip,
            returned = talks.len(),
            "Listed talks"
        );
        Ok(TalkSummary::from_talks(talks, &speakers))
    }
}

fn update_error(error: PortError) -> TalkError {
    let error = TalkError::from(error);
    if error.is_conflict() {
        warn!("Talk update rejected: version token is stale");
    }
    error
}
