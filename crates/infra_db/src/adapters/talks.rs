//! PostgreSQL Talk Store Adapter
//!
//! Implements [`TalkStore`] over a SQLx connection pool. Each session owns
//! one database transaction: reads see the session's own writes, and
//! [`TalkSession::save_changes`] commits. A session dropped without saving
//! rolls its transaction back when the connection returns to the pool.
//!
//! Version tokens live in the `version` column. A replace is a single
//! `UPDATE ... WHERE version = $expected`, so two sessions racing on the
//! same talk cannot both win.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use core_kernel::{
    AdapterHealth, DomainPort, HealthCheckResult, HealthCheckable, PortError, SpeakerId, TalkId,
    VersionToken,
};
use domain_talks::{
    NewTalk, Speaker, SpeakerTalkStats, StoredTalk, TagTalkStats, Talk, TalkFilter, TalkQuery,
    TalkSession, TalkStore,
};

use crate::error::db_to_port_error;
use crate::repositories::{
    SpeakerRow, SpeakerStatsRow, SpeakerTable, TagStatsRow, TalkRow, TalkTable,
};

const ADAPTER_ID: &str = "postgres-talk-store";

/// PostgreSQL-backed implementation of the [`TalkStore`] port
///
/// Cloning is cheap; clones share the pool.
#[derive(Debug, Clone)]
pub struct PostgresTalkStore {
    pool: PgPool,
}

impl PostgresTalkStore {
    /// Creates a new adapter with the given database pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns the underlying pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Inserts or renames speakers
    ///
    /// Speakers are read-only to the catalogue; this is for seeding and
    /// tests.
    pub async fn upsert_speakers(&self, speakers: &[Speaker]) -> Result<(), PortError> {
        let mut tx = self.pool.begin().await.map_err(db_to_port_error)?;
        for speaker in speakers {
            SpeakerTable::new(&mut *tx)
                .upsert(&SpeakerRow {
                    speaker_id: speaker.id.into(),
                    name: speaker.name.clone(),
                })
                .await
                .map_err(db_to_port_error)?;
        }
        tx.commit().await.map_err(db_to_port_error)?;
        debug!(count = speakers.len(), "Speakers upserted");
        Ok(())
    }
}

impl DomainPort for PostgresTalkStore {}

#[async_trait]
impl HealthCheckable for PostgresTalkStore {
    /// Runs `SELECT 1` against the pool
    async fn health_check(&self) -> HealthCheckResult {
        let start = std::time::Instant::now();

        let result = sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await;

        let latency_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(_) => HealthCheckResult {
                adapter_id: ADAPTER_ID.to_string(),
                status: AdapterHealth::Healthy,
                latency_ms,
                message: None,
                checked_at: Utc::now(),
            },
            Err(e) => HealthCheckResult {
                adapter_id: ADAPTER_ID.to_string(),
                status: AdapterHealth::Unhealthy,
                latency_ms,
                message: Some(format!("Database error: {}", e)),
                checked_at: Utc::now(),
            },
        }
    }
}

#[async_trait]
impl TalkStore for PostgresTalkStore {
    type Session = PostgresSession;

    async fn open_session(&self) -> Result<PostgresSession, PortError> {
        let tx = self.pool.begin().await.map_err(|e| {
            warn!(error = %e, "Could not open talk store session");
            db_to_port_error(e)
        })?;
        Ok(PostgresSession { tx })
    }
}

/// A unit of work over one PostgreSQL transaction
pub struct PostgresSession {
    tx: Transaction<'static, Postgres>,
}

impl PostgresSession {
    fn talks(&mut self) -> TalkTable<'_> {
        TalkTable::new(&mut *self.tx)
    }

    fn speakers(&mut self) -> SpeakerTable<'_> {
        SpeakerTable::new(&mut *self.tx)
    }
}

#[async_trait]
impl TalkSession for PostgresSession {
    async fn load_talk(&mut self, id: TalkId) -> Result<Option<StoredTalk>, PortError> {
        let row = self
            .talks()
            .get(id.into())
            .await
            .map_err(db_to_port_error)?;
        Ok(row.map(stored_talk_from_row))
    }

    async fn load_talk_including_speaker(
        &mut self,
        id: TalkId,
    ) -> Result<Option<(StoredTalk, Option<Speaker>)>, PortError> {
        let row = self
            .talks()
            .get_with_speaker(id.into())
            .await
            .map_err(db_to_port_error)?;

        Ok(row.map(|row| {
            let stored = stored_talk_from_row(row.talk);
            let speaker = row
                .speaker_name
                .map(|name| Speaker::new(stored.talk.speaker_id, name));
            (stored, speaker)
        }))
    }

    async fn load_speakers(
        &mut self,
        ids: &[SpeakerId],
    ) -> Result<HashMap<SpeakerId, Speaker>, PortError> {
        let ids: Vec<Uuid> = ids.iter().map(|id| Uuid::from(*id)).collect();
        let rows = self
            .speakers()
            .get_many(&ids)
            .await
            .map_err(db_to_port_error)?;

        Ok(rows
            .into_iter()
            .map(speaker_from_row)
            .map(|speaker| (speaker.id, speaker))
            .collect())
    }

    async fn scan_speakers(&mut self, limit: u64) -> Result<Vec<Speaker>, PortError> {
        let rows = self
            .speakers()
            .scan(to_sql_count(limit))
            .await
            .map_err(db_to_port_error)?;
        Ok(rows.into_iter().map(speaker_from_row).collect())
    }

    #[instrument(skip(self, query), fields(index = %query.index()))]
    async fn query_talks(&mut self, query: &TalkQuery) -> Result<Vec<Talk>, PortError> {
        let limit = to_sql_count(query.take);
        let offset = to_sql_count(query.skip);
        let mut talks = self.talks();

        let rows = match &query.filter {
            TalkFilter::All => talks.list_all(limit, offset).await,
            TalkFilter::BySpeaker(speaker_id) => {
                talks
                    .list_by_speaker((*speaker_id).into(), limit, offset)
                    .await
            }
            TalkFilter::ByTag(tag) => talks.list_by_tag(tag, limit, offset).await,
            TalkFilter::Search(text) => talks.search(text, limit, offset).await,
        }
        .map_err(db_to_port_error)?;

        debug!(returned = rows.len(), "Index query completed");
        Ok(rows
            .into_iter()
            .map(|row| stored_talk_from_row(row).talk)
            .collect())
    }

    async fn speaker_talk_stats(&mut self, limit: u64) -> Result<Vec<SpeakerTalkStats>, PortError> {
        let rows = self
            .talks()
            .speaker_stats(to_sql_count(limit))
            .await
            .map_err(db_to_port_error)?;
        Ok(rows.into_iter().map(speaker_stats_from_row).collect())
    }

    async fn tag_talk_stats(&mut self, limit: u64) -> Result<Vec<TagTalkStats>, PortError> {
        let rows = self
            .talks()
            .tag_stats(to_sql_count(limit))
            .await
            .map_err(db_to_port_error)?;
        Ok(rows.into_iter().map(tag_stats_from_row).collect())
    }

    async fn store_talk(&mut self, new_talk: NewTalk) -> Result<StoredTalk, PortError> {
        let talk = Talk::from_new(TalkId::new_v7(), new_talk);
        let row = row_from_talk(&talk, VersionToken::new());

        let saved = self
            .talks()
            .insert(&row)
            .await
            .map_err(db_to_port_error)?;
        Ok(stored_talk_from_row(saved))
    }

    #[instrument(skip(self, talk), fields(talk_id = %talk.id, expected_version = %expected))]
    async fn replace_talk(
        &mut self,
        talk: &Talk,
        expected: VersionToken,
    ) -> Result<StoredTalk, PortError> {
        let row = row_from_talk(talk, VersionToken::new());

        let updated = self
            .talks()
            .update_if_version(&row, expected.into())
            .await
            .map_err(db_to_port_error)?;
        if let Some(saved) = updated {
            return Ok(stored_talk_from_row(saved));
        }

        // Nothing matched: tell a vanished talk apart from a stale token
        let current = self
            .talks()
            .version_of(talk.id.into())
            .await
            .map_err(db_to_port_error)?;
        match current {
            None => Err(PortError::not_found("Talk", talk.id)),
            Some(_) => Err(PortError::concurrency_violation("Talk", talk.id, expected)),
        }
    }

    async fn delete_talk(&mut self, id: TalkId) -> Result<bool, PortError> {
        self.talks()
            .delete(id.into())
            .await
            .map_err(db_to_port_error)
    }

    async fn save_changes(self) -> Result<(), PortError> {
        self.tx.commit().await.map_err(db_to_port_error)
    }
}

fn to_sql_count(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn from_sql_count(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

fn stored_talk_from_row(row: TalkRow) -> StoredTalk {
    StoredTalk {
        talk: Talk {
            id: TalkId::from_uuid(row.talk_id),
            headline: row.headline,
            description: row.description,
            speaker_id: SpeakerId::from_uuid(row.speaker_id),
            event_id: row.event_id,
            published: row.published,
            tags: row.tags.into_iter().collect(),
        },
        version: VersionToken::from_uuid(row.version),
    }
}

fn row_from_talk(talk: &Talk, version: VersionToken) -> TalkRow {
    TalkRow {
        talk_id: talk.id.into(),
        headline: talk.headline.clone(),
        description: talk.description.clone(),
        speaker_id: talk.speaker_id.into(),
        event_id: talk.event_id.clone(),
        published: talk.published,
        tags: talk.tags.iter().cloned().collect(),
        version: version.into(),
    }
}

fn speaker_from_row(row: SpeakerRow) -> Speaker {
    Speaker::new(SpeakerId::from_uuid(row.speaker_id), row.name)
}

fn speaker_stats_from_row(row: SpeakerStatsRow) -> SpeakerTalkStats {
    SpeakerTalkStats {
        speaker_id: SpeakerId::from_uuid(row.speaker_id),
        speaker_name: row.speaker_name,
        talk_count: from_sql_count(row.talk_count),
    }
}

fn tag_stats_from_row(row: TagStatsRow) -> TagTalkStats {
    TagTalkStats {
        tag: row.tag,
        talk_count: from_sql_count(row.talk_count),
    }
}
