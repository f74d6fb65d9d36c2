//! Test Data Builders
//!
//! Builders with sensible defaults, so a test only spells out the fields
//! it is about.

use std::collections::BTreeSet;

use core_kernel::SpeakerId;
use domain_talks::{normalize_tags, NewTalk, UpdatedTalk};

use crate::fixtures::SpeakerFixtures;

/// Builder for [`NewTalk`] payloads
#[derive(Debug, Clone)]
pub struct NewTalkBuilder {
    headline: String,
    description: String,
    speaker_id: SpeakerId,
    event_id: Option<String>,
    tags: BTreeSet<String>,
}

impl Default for NewTalkBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl NewTalkBuilder {
    /// Creates a builder for an untagged talk by Ada
    pub fn new() -> Self {
        Self {
            headline: "Untitled talk".to_string(),
            description: "To be announced".to_string(),
            speaker_id: SpeakerFixtures::ada().id,
            event_id: None,
            tags: BTreeSet::new(),
        }
    }

    pub fn headline(mut self, headline: impl Into<String>) -> Self {
        self.headline = headline.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn speaker(mut self, speaker_id: SpeakerId) -> Self {
        self.speaker_id = speaker_id;
        self
    }

    pub fn event(mut self, event_id: impl Into<String>) -> Self {
        self.event_id = Some(event_id.into());
        self
    }

    /// Sets the tags as given, without normalising them
    pub fn raw_tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        self.tags = normalize_tags(tags);
        self
    }

    pub fn build(self) -> NewTalk {
        NewTalk {
            headline: self.headline,
            description: self.description,
            speaker_id: self.speaker_id,
            event_id: self.event_id,
            tags: self.tags,
        }
    }
}

/// Builder for [`UpdatedTalk`] payloads
#[derive(Debug, Clone)]
pub struct UpdatedTalkBuilder {
    update: UpdatedTalk,
}

impl UpdatedTalkBuilder {
    /// Starts from the current state of a talk
    pub fn from_current(update: impl Into<UpdatedTalk>) -> Self {
        Self {
            update: update.into(),
        }
    }

    pub fn headline(mut self, headline: impl Into<String>) -> Self {
        self.update.headline = headline.into();
        self
    }

    pub fn published(mut self, published: bool) -> Self {
        self.update.published = published;
        self
    }

    pub fn speaker(mut self, speaker_id: SpeakerId) -> Self {
        self.update.speaker_id = speaker_id;
        self
    }

    pub fn build(self) -> UpdatedTalk {
        self.update
    }
}
