//! Speaker table access

use sqlx::PgConnection;
use uuid::Uuid;

/// A row of the `speakers` table
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct SpeakerRow {
    pub speaker_id: Uuid,
    pub name: String,
}

/// Speaker queries bound to one connection
pub struct SpeakerTable<'c> {
    conn: &'c mut PgConnection,
}

impl<'c> SpeakerTable<'c> {
    pub fn new(conn: &'c mut PgConnection) -> Self {
        Self { conn }
    }

    /// Fetches the speakers among `ids` that exist
    pub async fn get_many(&mut self, ids: &[Uuid]) -> Result<Vec<SpeakerRow>, sqlx::Error> {
        sqlx::query_as::<_, SpeakerRow>(
            "SELECT speaker_id, name FROM speakers WHERE speaker_id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(&mut *self.conn)
        .await
    }

    /// Reads speakers in id order
    pub async fn scan(&mut self, limit: i64) -> Result<Vec<SpeakerRow>, sqlx::Error> {
        sqlx::query_as::<_, SpeakerRow>(
            "SELECT speaker_id, name FROM speakers ORDER BY speaker_id LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&mut *self.conn)
        .await
    }

    /// Inserts a speaker or renames an existing one
    pub async fn upsert(&mut self, row: &SpeakerRow) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO speakers (speaker_id, name) VALUES ($1, $2) \
             ON CONFLICT (speaker_id) DO UPDATE SET name = EXCLUDED.name",
        )
        .bind(row.speaker_id)
        .bind(&row.name)
        .execute(&mut *self.conn)
        .await?;
        Ok(())
    }
}
