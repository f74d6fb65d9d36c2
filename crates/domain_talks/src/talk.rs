//! Talk documents and the payloads that create or edit them
//!
//! A talk is owned by the store: its identifier and version token are
//! assigned on write. Callers only ever send the mutable fields, wrapped in
//! [`NewTalk`] or [`UpdatedTalk`].

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use core_kernel::{SpeakerId, TalkId, VersionToken};

/// A conference talk as stored in the catalogue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Talk {
    /// Store-assigned identifier
    pub id: TalkId,
    /// Short title shown in listings
    pub headline: String,
    /// Abstract of the talk
    pub description: String,
    /// The speaker giving the talk
    pub speaker_id: SpeakerId,
    /// The event the talk belongs to, if scheduled
    pub event_id: Option<String>,
    /// Whether the talk is visible to attendees
    pub published: bool,
    /// Tags in lexicographic order
    pub tags: BTreeSet<String>,
}

impl Talk {
    /// Builds the stored form of a new talk once the store has picked its id
    ///
    /// New talks start unpublished.
    pub fn from_new(id: TalkId, new_talk: NewTalk) -> Self {
        Self {
            id,
            headline: new_talk.headline,
            description: new_talk.description,
            speaker_id: new_talk.speaker_id,
            event_id: new_talk.event_id,
            published: false,
            tags: new_talk.tags,
        }
    }

    /// Returns true if the talk carries the given tag
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }
}

/// A talk together with the version token it was read at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredTalk {
    pub talk: Talk,
    pub version: VersionToken,
}

/// Fields supplied when creating a talk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTalk {
    pub headline: String,
    pub description: String,
    pub speaker_id: SpeakerId,
    #[serde(default)]
    pub event_id: Option<String>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
}

impl NewTalk {
    /// Creates a new talk payload without an event or tags
    pub fn new(
        headline: impl Into<String>,
        description: impl Into<String>,
        speaker_id: SpeakerId,
    ) -> Self {
        Self {
            headline: headline.into(),
            description: description.into(),
            speaker_id,
            event_id: None,
            tags: BTreeSet::new(),
        }
    }

    /// Attaches the talk to an event
    pub fn with_event(mut self, event_id: impl Into<String>) -> Self {
        self.event_id = Some(event_id.into());
        self
    }

    /// Sets the talk's tags
    pub fn with_tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        self.tags = normalize_tags(tags);
        self
    }
}

/// Replacement values for a talk's mutable fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdatedTalk {
    pub headline: String,
    pub description: String,
    pub speaker_id: SpeakerId,
    pub published: bool,
    #[serde(default)]
    pub tags: BTreeSet<String>,
}

impl UpdatedTalk {
    /// Overwrites the mutable fields of `talk`
    ///
    /// The identifier and event reference are left untouched.
    pub fn apply_to(self, talk: &mut Talk) {
        talk.headline = self.headline;
        talk.description = self.description;
        talk.speaker_id = self.speaker_id;
        talk.published = self.published;
        talk.tags = normalize_tags(self.tags);
    }
}

impl From<EditableTalk> for UpdatedTalk {
    fn from(editable: EditableTalk) -> Self {
        Self {
            headline: editable.headline,
            description: editable.description,
            speaker_id: editable.speaker_id,
            published: editable.published,
            tags: editable.tags,
        }
    }
}

/// The editable view of a talk, as shown on an edit form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditableTalk {
    pub id: TalkId,
    pub headline: String,
    pub description: String,
    pub speaker_id: SpeakerId,
    pub published: bool,
    pub tags: BTreeSet<String>,
}

impl From<Talk> for EditableTalk {
    fn from(talk: Talk) -> Self {
        Self {
            id: talk.id,
            headline: talk.headline,
            description: talk.description,
            speaker_id: talk.speaker_id,
            published: talk.published,
            tags: talk.tags,
        }
    }
}

/// Editable fields plus the version token a later update must present
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TalkForEditing {
    pub talk: EditableTalk,
    pub version: VersionToken,
}

/// Trims tags and drops empty ones
pub fn normalize_tags<I, T>(tags: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = T>,
    T: AsRef<str>,
{
    tags.into_iter()
        .map(|tag| tag.as_ref().trim().to_string())
        .filter(|tag| !tag.is_empty())
        .collect()
}
