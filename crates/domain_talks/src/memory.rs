//! In-memory talk store
//!
//! Keeps talks and speakers in ordered maps behind a `tokio` lock. Sessions
//! read committed state and buffer their writes until `save_changes`, which
//! re-checks every version token under the write lock before applying
//! anything. Useful for tests and local runs without PostgreSQL.
//!
//! A delete claims its talk until the session ends, the way a row lock
//! would, so two sessions never both report removing the same talk.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use core_kernel::{
    AdapterHealth, DomainPort, HealthCheckResult, HealthCheckable, PortError, SpeakerId, TalkId,
    VersionToken,
};

use crate::ports::{TalkFilter, TalkQuery, TalkSession, TalkStore};
use crate::projections::{SpeakerTalkStats, TagTalkStats};
use crate::speaker::Speaker;
use crate::talk::{NewTalk, StoredTalk, Talk};

const SERVICE_NAME: &str = "in-memory talk store";

/// Headline hits count this many times a description hit when ranking
const HEADLINE_BOOST: u32 = 2;

#[derive(Debug, Default)]
struct MemoryState {
    talks: BTreeMap<TalkId, StoredTalk>,
    speakers: BTreeMap<SpeakerId, Speaker>,
}

/// In-memory implementation of [`TalkStore`]
///
/// Clones share the same underlying data.
#[derive(Debug, Clone)]
pub struct InMemoryTalkStore {
    state: Arc<RwLock<MemoryState>>,
    /// Talks an open session has deleted but not yet saved or dropped
    delete_claims: Arc<Mutex<HashSet<TalkId>>>,
    available: Arc<AtomicBool>,
}

impl Default for InMemoryTalkStore {
    fn default() -> Self {
        Self {
            state: Arc::default(),
            delete_claims: Arc::default(),
            available: Arc::new(AtomicBool::new(true)),
        }
    }
}

impl InMemoryTalkStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populates with speakers
    pub async fn with_speakers(speakers: Vec<Speaker>) -> Self {
        let store = Self::new();
        for speaker in speakers {
            store.insert_speaker(speaker).await;
        }
        store
    }

    /// Adds or replaces a speaker document
    pub async fn insert_speaker(&self, speaker: Speaker) {
        self.state.write().await.speakers.insert(speaker.id, speaker);
    }

    /// Number of committed talks
    pub async fn talk_count(&self) -> usize {
        self.state.read().await.talks.len()
    }

    /// Simulates the store going offline (`false`) or coming back (`true`)
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }
}

impl DomainPort for InMemoryTalkStore {}

#[async_trait]
impl HealthCheckable for InMemoryTalkStore {
    async fn health_check(&self) -> HealthCheckResult {
        let (status, message) = if self.is_available() {
            (AdapterHealth::Healthy, "In-memory store reachable")
        } else {
            (AdapterHealth::Unhealthy, "In-memory store marked unavailable")
        };
        HealthCheckResult {
            adapter_id: "in-memory-talk-store".to_string(),
            status,
            latency_ms: 0,
            message: Some(message.to_string()),
            checked_at: Utc::now(),
        }
    }
}

#[async_trait]
impl TalkStore for InMemoryTalkStore {
    type Session = InMemorySession;

    async fn open_session(&self) -> Result<InMemorySession, PortError> {
        if !self.is_available() {
            return Err(PortError::ServiceUnavailable {
                service: SERVICE_NAME.to_string(),
            });
        }
        Ok(InMemorySession {
            state: Arc::clone(&self.state),
            delete_claims: Arc::clone(&self.delete_claims),
            claimed: Vec::new(),
            pending: Vec::new(),
        })
    }
}

#[derive(Debug)]
enum PendingWrite {
    Insert(StoredTalk),
    Replace {
        stored: StoredTalk,
        expected: VersionToken,
    },
    Delete(TalkId),
}

/// Unit of work over an [`InMemoryTalkStore`]
///
/// Buffered writes are discarded if the session is dropped unsaved. Delete
/// claims are released when the session ends either way.
#[derive(Debug)]
pub struct InMemorySession {
    state: Arc<RwLock<MemoryState>>,
    delete_claims: Arc<Mutex<HashSet<TalkId>>>,
    claimed: Vec<TalkId>,
    pending: Vec<PendingWrite>,
}

impl Drop for InMemorySession {
    fn drop(&mut self) {
        if self.claimed.is_empty() {
            return;
        }
        let mut claims = self
            .delete_claims
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        for id in &self.claimed {
            claims.remove(id);
        }
    }
}

#[async_trait]
impl TalkSession for InMemorySession {
    async fn load_talk(&mut self, id: TalkId) -> Result<Option<StoredTalk>, PortError> {
        Ok(self.state.read().await.talks.get(&id).cloned())
    }

    async fn load_talk_including_speaker(
        &mut self,
        id: TalkId,
    ) -> Result<Option<(StoredTalk, Option<Speaker>)>, PortError> {
        let state = self.state.read().await;
        Ok(state.talks.get(&id).map(|stored| {
            let speaker = state.speakers.get(&stored.talk.speaker_id).cloned();
            (stored.clone(), speaker)
        }))
    }

    async fn load_speakers(
        &mut self,
        ids: &[SpeakerId],
    ) -> Result<HashMap<SpeakerId, Speaker>, PortError> {
        let state = self.state.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| state.speakers.get(id).map(|s| (*id, s.clone())))
            .collect())
    }

    async fn scan_speakers(&mut self, limit: u64) -> Result<Vec<Speaker>, PortError> {
        let state = self.state.read().await;
        Ok(state
            .speakers
            .values()
            .take(to_usize(limit))
            .cloned()
            .collect())
    }

    async fn query_talks(&mut self, query: &TalkQuery) -> Result<Vec<Talk>, PortError> {
        let state = self.state.read().await;
        let talks = state.talks.values().map(|stored| &stored.talk);

        let matched: Vec<&Talk> = match &query.filter {
            TalkFilter::All => talks.collect(),
            TalkFilter::BySpeaker(speaker_id) => {
                talks.filter(|talk| talk.speaker_id == *speaker_id).collect()
            }
            TalkFilter::ByTag(tag) => {
                let tag = tag.trim();
                talks.filter(|talk| talk.has_tag(tag)).collect()
            }
            TalkFilter::Search(text) => {
                let terms = search_terms(text);
                let mut scored: Vec<(u32, &Talk)> = talks
                    .filter_map(|talk| relevance(talk, &terms).map(|score| (score, talk)))
                    .collect();
                // BTreeMap iteration already gives id order; the stable sort keeps it on ties
                scored.sort_by(|a, b| b.0.cmp(&a.0));
                scored.into_iter().map(|(_, talk)| talk).collect()
            }
        };

        Ok(matched
            .into_iter()
            .skip(to_usize(query.skip))
            .take(to_usize(query.take))
            .cloned()
            .collect())
    }

    async fn speaker_talk_stats(&mut self, limit: u64) -> Result<Vec<SpeakerTalkStats>, PortError> {
        let state = self.state.read().await;
        let mut counts: BTreeMap<SpeakerId, u64> = BTreeMap::new();
        for stored in state.talks.values() {
            *counts.entry(stored.talk.speaker_id).or_default() += 1;
        }

        let mut stats: Vec<SpeakerTalkStats> = counts
            .into_iter()
            .map(|(speaker_id, talk_count)| SpeakerTalkStats {
                speaker_id,
                speaker_name: state
                    .speakers
                    .get(&speaker_id)
                    .map(|s| s.name.clone())
                    .unwrap_or_default(),
                talk_count,
            })
            .collect();
        stats.sort_by(|a, b| b.talk_count.cmp(&a.talk_count));
        stats.truncate(to_usize(limit));
        Ok(stats)
    }

    async fn tag_talk_stats(&mut self, limit: u64) -> Result<Vec<TagTalkStats>, PortError> {
        let state = self.state.read().await;
        let mut counts: BTreeMap<&str, u64> = BTreeMap::new();
        for stored in state.talks.values() {
            for tag in &stored.talk.tags {
                *counts.entry(tag.as_str()).or_default() += 1;
            }
        }

        let mut stats: Vec<TagTalkStats> = counts
            .into_iter()
            .map(|(tag, talk_count)| TagTalkStats {
                tag: tag.to_string(),
                talk_count,
            })
            .collect();
        stats.sort_by(|a, b| b.talk_count.cmp(&a.talk_count));
        stats.truncate(to_usize(limit));
        Ok(stats)
    }

    async fn store_talk(&mut self, new_talk: NewTalk) -> Result<StoredTalk, PortError> {
        let stored = StoredTalk {
            talk: Talk::from_new(TalkId::new_v7(), new_talk),
            version: VersionToken::new(),
        };
        self.pending.push(PendingWrite::Insert(stored.clone()));
        Ok(stored)
    }

    async fn replace_talk(
        &mut self,
        talk: &Talk,
        expected: VersionToken,
    ) -> Result<StoredTalk, PortError> {
        {
            let state = self.state.read().await;
            let current = state
                .talks
                .get(&talk.id)
                .ok_or_else(|| PortError::not_found("Talk", talk.id))?;
            if current.version != expected {
                return Err(PortError::concurrency_violation("Talk", talk.id, expected));
            }
        }

        let stored = StoredTalk {
            talk: talk.clone(),
            version: VersionToken::new(),
        };
        self.pending.push(PendingWrite::Replace {
            stored: stored.clone(),
            expected,
        });
        Ok(stored)
    }

    async fn delete_talk(&mut self, id: TalkId) -> Result<bool, PortError> {
        // Holding the read lock keeps a concurrent save from removing the talk
        // between the existence check and the claim
        let state = self.state.read().await;
        let claimed = state.talks.contains_key(&id)
            && self
                .delete_claims
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(id);
        drop(state);

        if claimed {
            self.claimed.push(id);
        }
        self.pending.push(PendingWrite::Delete(id));
        Ok(claimed)
    }

    async fn save_changes(mut self) -> Result<(), PortError> {
        let pending = std::mem::take(&mut self.pending);
        let mut state = self.state.write().await;

        for write in &pending {
            if let PendingWrite::Replace { stored, expected } = write {
                let current = state.talks.get(&stored.talk.id).map(|s| s.version);
                match current {
                    None => return Err(PortError::not_found("Talk", stored.talk.id)),
                    Some(version) if version != *expected => {
                        return Err(PortError::concurrency_violation(
                            "Talk",
                            stored.talk.id,
                            expected,
                        ));
                    }
                    Some(_) => {}
                }
            }
        }

        for write in pending {
            match write {
                PendingWrite::Insert(stored) | PendingWrite::Replace { stored, .. } => {
                    state.talks.insert(stored.talk.id, stored);
                }
                PendingWrite::Delete(id) => {
                    state.talks.remove(&id);
                }
            }
        }
        Ok(())
    }
}

fn to_usize(value: u64) -> usize {
    usize::try_from(value).unwrap_or(usize::MAX)
}

fn search_terms(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Scores a talk against the search terms; `None` unless every term occurs
fn relevance(talk: &Talk, terms: &[String]) -> Option<u32> {
    if terms.is_empty() {
        return None;
    }
    let headline = search_terms(&talk.headline);
    let description = search_terms(&talk.description);
    terms.iter().try_fold(0u32, |score, term| {
        let in_headline = occurrences(&headline, term);
        let in_description = occurrences(&description, term);
        let hits = in_headline
            .saturating_mul(HEADLINE_BOOST)
            .saturating_add(in_description);
        (hits > 0).then_some(score.saturating_add(hits))
    })
}

fn occurrences(words: &[String], term: &str) -> u32 {
    let count = words.iter().filter(|word| *word == term).count();
    u32::try_from(count).unwrap_or(u32::MAX)
}
