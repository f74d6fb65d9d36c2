//! Read-only projections assembled at query time
//!
//! None of these are persisted. They are built from talks, the speakers they
//! reference, and the aggregation indexes the store maintains.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use core_kernel::{SpeakerId, TalkId};

use crate::speaker::Speaker;
use crate::talk::Talk;

/// One row of a talk listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TalkSummary {
    pub id: TalkId,
    pub headline: String,
    pub speaker_id: SpeakerId,
    /// Empty when the referenced speaker no longer exists
    pub speaker_name: String,
    pub published: bool,
    pub tags: BTreeSet<String>,
}

impl TalkSummary {
    /// Builds summaries for a page of talks from a batch of loaded speakers
    pub fn from_talks(talks: Vec<Talk>, speakers: &HashMap<SpeakerId, Speaker>) -> Vec<Self> {
        talks
            .into_iter()
            .map(|talk| {
                let speaker_name = speakers
                    .get(&talk.speaker_id)
                    .map(|speaker| speaker.name.clone())
                    .unwrap_or_default();
                Self {
                    id: talk.id,
                    headline: talk.headline,
                    speaker_id: talk.speaker_id,
                    speaker_name,
                    published: talk.published,
                    tags: talk.tags,
                }
            })
            .collect()
    }
}

/// A talk merged with its speaker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TalkDetail {
    pub id: TalkId,
    pub headline: String,
    pub description: String,
    pub speaker: Speaker,
    pub event_id: Option<String>,
    pub published: bool,
    pub tags: BTreeSet<String>,
}

impl TalkDetail {
    pub fn new(talk: Talk, speaker: Speaker) -> Self {
        Self {
            id: talk.id,
            headline: talk.headline,
            description: talk.description,
            speaker,
            event_id: talk.event_id,
            published: talk.published,
            tags: talk.tags,
        }
    }
}

/// Number of talks given by a speaker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeakerTalkStats {
    pub speaker_id: SpeakerId,
    pub speaker_name: String,
    pub talk_count: u64,
}

/// Number of talks carrying a tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagTalkStats {
    pub tag: String,
    pub talk_count: u64,
}
