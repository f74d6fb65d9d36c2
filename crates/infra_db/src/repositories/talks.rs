//! Talk table access
//!
//! SQL for the `talks` table and the index views built over it. Every call
//! runs on a borrowed connection so the adapter can keep a whole session on
//! one transaction.

use sqlx::PgConnection;
use uuid::Uuid;

/// Column list shared by every talk read, aliased over `talks t`
macro_rules! talk_columns {
    () => {
        "t.talk_id, t.headline, t.description, t.speaker_id, t.event_id, \
         t.published, t.tags, t.version"
    };
}

/// A row of the `talks` table
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct TalkRow {
    pub talk_id: Uuid,
    pub headline: String,
    pub description: String,
    pub speaker_id: Uuid,
    pub event_id: Option<String>,
    pub published: bool,
    pub tags: Vec<String>,
    pub version: Uuid,
}

/// A talk row left-joined with its speaker's name
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TalkWithSpeakerRow {
    #[sqlx(flatten)]
    pub talk: TalkRow,
    pub speaker_name: Option<String>,
}

/// A row of the `talk_speaker_stats` view
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SpeakerStatsRow {
    pub speaker_id: Uuid,
    pub speaker_name: String,
    pub talk_count: i64,
}

/// A row of the `talk_tag_stats` view
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TagStatsRow {
    pub tag: String,
    pub talk_count: i64,
}

/// Talk queries bound to one connection
pub struct TalkTable<'c> {
    conn: &'c mut PgConnection,
}

impl<'c> TalkTable<'c> {
    pub fn new(conn: &'c mut PgConnection) -> Self {
        Self { conn }
    }

    /// Fetches a talk by id
    pub async fn get(&mut self, talk_id: Uuid) -> Result<Option<TalkRow>, sqlx::Error> {
        sqlx::query_as::<_, TalkRow>(concat!(
            "SELECT ",
            talk_columns!(),
            " FROM talks t WHERE t.talk_id = $1"
        ))
        .bind(talk_id)
        .fetch_optional(&mut *self.conn)
        .await
    }

    /// Fetches a talk and its speaker's name in one round trip
    pub async fn get_with_speaker(
        &mut self,
        talk_id: Uuid,
    ) -> Result<Option<TalkWithSpeakerRow>, sqlx::Error> {
        sqlx::query_as::<_, TalkWithSpeakerRow>(concat!(
            "SELECT ",
            talk_columns!(),
            ", s.name AS speaker_name \
             FROM talks t LEFT JOIN speakers s ON s.speaker_id = t.speaker_id \
             WHERE t.talk_id = $1"
        ))
        .bind(talk_id)
        .fetch_optional(&mut *self.conn)
        .await
    }

    /// Every talk, in id order
    pub async fn list_all(&mut self, limit: i64, offset: i64) -> Result<Vec<TalkRow>, sqlx::Error> {
        sqlx::query_as::<_, TalkRow>(concat!(
            "SELECT ",
            talk_columns!(),
            " FROM talks t ORDER BY t.talk_id LIMIT $1 OFFSET $2"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&mut *self.conn)
        .await
    }

    /// Talks by one speaker, in id order
    pub async fn list_by_speaker(
        &mut self,
        speaker_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<TalkRow>, sqlx::Error> {
        sqlx::query_as::<_, TalkRow>(concat!(
            "SELECT ",
            talk_columns!(),
            " FROM talks t WHERE t.speaker_id = $1 ORDER BY t.talk_id LIMIT $2 OFFSET $3"
        ))
        .bind(speaker_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&mut *self.conn)
        .await
    }

    /// Talks carrying a tag, in id order
    pub async fn list_by_tag(
        &mut self,
        tag: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<TalkRow>, sqlx::Error> {
        sqlx::query_as::<_, TalkRow>(concat!(
            "SELECT ",
            talk_columns!(),
            " FROM talks t WHERE t.tags @> ARRAY[$1]::TEXT[] ORDER BY t.talk_id LIMIT $2 OFFSET $3"
        ))
        .bind(tag)
        .bind(limit)
        .bind(offset)
        .fetch_all(&mut *self.conn)
        .await
    }

    /// Full-text matches, best rank first
    ///
    /// Every word of `text` must match. Headline lexemes carry weight A and
    /// description lexemes weight B, so headline hits rank higher.
    pub async fn search(
        &mut self,
        text: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<TalkRow>, sqlx::Error> {
        sqlx::query_as::<_, TalkRow>(concat!(
            "SELECT ",
            talk_columns!(),
            " FROM talks t, plainto_tsquery('english', $1) AS q \
             WHERE t.search_vector @@ q \
             ORDER BY ts_rank(t.search_vector, q) DESC, t.talk_id \
             LIMIT $2 OFFSET $3"
        ))
        .bind(text)
        .bind(limit)
        .bind(offset)
        .fetch_all(&mut *self.conn)
        .await
    }

    /// Inserts a talk and returns the stored row
    pub async fn insert(&mut self, row: &TalkRow) -> Result<TalkRow, sqlx::Error> {
        sqlx::query_as::<_, TalkRow>(concat!(
            "INSERT INTO talks AS t \
             (talk_id, headline, description, speaker_id, event_id, published, tags, version) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING ",
            talk_columns!()
        ))
        .bind(row.talk_id)
        .bind(&row.headline)
        .bind(&row.description)
        .bind(row.speaker_id)
        .bind(&row.event_id)
        .bind(row.published)
        .bind(&row.tags)
        .bind(row.version)
        .fetch_one(&mut *self.conn)
        .await
    }

    /// Overwrites a talk if its version still equals `expected`
    ///
    /// `row.version` becomes the new version. Returns `None` when no row
    /// matched, either because the talk is gone or the version moved on.
    pub async fn update_if_version(
        &mut self,
        row: &TalkRow,
        expected: Uuid,
    ) -> Result<Option<TalkRow>, sqlx::Error> {
        sqlx::query_as::<_, TalkRow>(concat!(
            "UPDATE talks AS t SET \
             headline = $2, description = $3, speaker_id = $4, event_id = $5, \
             published = $6, tags = $7, version = $8, updated_at = now() \
             WHERE t.talk_id = $1 AND t.version = $9 \
             RETURNING ",
            talk_columns!()
        ))
        .bind(row.talk_id)
        .bind(&row.headline)
        .bind(&row.description)
        .bind(row.speaker_id)
        .bind(&row.event_id)
        .bind(row.published)
        .bind(&row.tags)
        .bind(row.version)
        .bind(expected)
        .fetch_optional(&mut *self.conn)
        .await
    }

    /// Current version of a talk, if it exists
    pub async fn version_of(&mut self, talk_id: Uuid) -> Result<Option<Uuid>, sqlx::Error> {
        sqlx::query_scalar::<_, Uuid>("SELECT version FROM talks WHERE talk_id = $1")
            .bind(talk_id)
            .fetch_optional(&mut *self.conn)
            .await
    }

    /// Deletes a talk, returning whether a row was removed
    pub async fn delete(&mut self, talk_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM talks WHERE talk_id = $1")
            .bind(talk_id)
            .execute(&mut *self.conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Per-speaker talk counts, largest first
    pub async fn speaker_stats(&mut self, limit: i64) -> Result<Vec<SpeakerStatsRow>, sqlx::Error> {
        sqlx::query_as::<_, SpeakerStatsRow>(
            "SELECT speaker_id, speaker_name, talk_count FROM talk_speaker_stats \
             ORDER BY talk_count DESC, speaker_id LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&mut *self.conn)
        .await
    }

    /// Per-tag talk counts, largest first; ties in bytewise tag order
    pub async fn tag_stats(&mut self, limit: i64) -> Result<Vec<TagStatsRow>, sqlx::Error> {
        sqlx::query_as::<_, TagStatsRow>(
            "SELECT tag, talk_count FROM talk_tag_stats \
             ORDER BY talk_count DESC, tag COLLATE \"C\" LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&mut *self.conn)
        .await
    }
}
