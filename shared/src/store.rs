//! Postgres-backed storage for mood entries.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{CreateMoodRequest, MoodEntry, UpdateMoodRequest};
use crate::{Error, Result};

const MOOD_COLUMNS: &str = "id, mood, note, color, created_at";

/// Mood row from database
#[derive(Debug, sqlx::FromRow)]
struct MoodRow {
    id: Uuid,
    mood: String,
    note: String,
    color: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<MoodRow> for MoodEntry {
    type Error = Error;

    fn try_from(row: MoodRow) -> Result<Self> {
        let mood = row.mood.parse().map_err(|_| {
            Error::Internal(format!("Stored mood {} has unknown value {}", row.id, row.mood))
        })?;

        Ok(Self {
            id: row.id,
            mood,
            note: row.note,
            color: row.color,
            created_at: row.created_at,
        })
    }
}

/// CRUD access to the `moods` table.
#[derive(Clone)]
pub struct MoodStore {
    pool: PgPool,
}

impl MoodStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// List entries newest-first, optionally only those created at or after `since`.
    pub async fn list(&self, since: Option<DateTime<Utc>>) -> Result<Vec<MoodEntry>> {
        let rows: Vec<MoodRow> = sqlx::query_as(&format!(
            r#"
            SELECT {MOOD_COLUMNS}
            FROM moods
            WHERE ($1::timestamptz IS NULL OR created_at >= $1)
            ORDER BY created_at DESC, id DESC
            "#
        ))
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(MoodEntry::try_from).collect()
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<MoodEntry>> {
        let row: Option<MoodRow> =
            sqlx::query_as(&format!("SELECT {MOOD_COLUMNS} FROM moods WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(MoodEntry::try_from).transpose()
    }

    pub async fn create(&self, request: &CreateMoodRequest) -> Result<MoodEntry> {
        let row: MoodRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO moods (id, mood, note, color)
            VALUES ($1, $2, $3, $4)
            RETURNING {MOOD_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(request.mood.as_str())
        .bind(&request.note)
        .bind(&request.color)
        .fetch_one(&self.pool)
        .await?;

        MoodEntry::try_from(row)
    }

    /// Apply the fields present in `request`; returns `None` when the entry does not exist.
    pub async fn update(&self, id: Uuid, request: &UpdateMoodRequest) -> Result<Option<MoodEntry>> {
        let row: Option<MoodRow> = sqlx::query_as(&format!(
            r#"
            UPDATE moods
            SET mood = COALESCE($2, mood),
                note = COALESCE($3, note),
                color = COALESCE($4, color)
            WHERE id = $1
            RETURNING {MOOD_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(request.mood.map(|m| m.as_str()))
        .bind(&request.note)
        .bind(&request.color)
        .fetch_optional(&self.pool)
        .await?;

        row.map(MoodEntry::try_from).transpose()
    }

    /// Returns `false` when no entry had this id.
    pub async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM moods WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
