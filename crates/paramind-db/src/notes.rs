//! Note repository implementation.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use pgvector::Vector;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use paramind_core::{
    BucketNoteCount, CreateNoteOutcome, CreateNoteRequest, Error, Note, NoteRepository, Result,
    SimilarNote, SourceType,
};

/// PostgreSQL implementation of NoteRepository.
pub struct PgNoteRepository {
    pool: Pool<Postgres>,
}

impl PgNoteRepository {
    /// Create a new PgNoteRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

const NOTE_COLUMNS: &str = "id, user_id, title, content, summary, source_type, source, \
     source_url, caption, bucket_id, ai_suggested_bucket, ai_confidence, is_classified, \
     tags, embedding, content_hash, captured_at, view_count, connection_count, \
     distilled_at, distillation";

fn map_row_to_note(row: sqlx::postgres::PgRow) -> Result<Note> {
    let source_type_str: String = row.try_get("source_type")?;
    let source_type: SourceType = source_type_str.parse()?;

    Ok(Note {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        title: row.try_get("title")?,
        content: row.try_get("content")?,
        summary: row.try_get("summary")?,
        source_type,
        source: row.try_get("source")?,
        source_url: row.try_get("source_url")?,
        caption: row.try_get("caption")?,
        bucket_id: row.try_get("bucket_id")?,
        ai_suggested_bucket: row.try_get("ai_suggested_bucket")?,
        ai_confidence: row.try_get("ai_confidence")?,
        is_classified: row.try_get("is_classified")?,
        tags: row.try_get("tags")?,
        embedding: row.try_get("embedding")?,
        content_hash: row.try_get("content_hash")?,
        captured_at: row.try_get("captured_at")?,
        view_count: row.try_get("view_count")?,
        connection_count: row.try_get("connection_count")?,
        distilled_at: row.try_get("distilled_at")?,
        distillation: row.try_get("distillation")?,
    })
}

#[async_trait]
impl NoteRepository for PgNoteRepository {
    async fn create(&self, req: CreateNoteRequest) -> Result<CreateNoteOutcome> {
        let id = Uuid::now_v7();
        let now = Utc::now();

        // The partial unique index on (user_id, source_url) is the last line
        // of defense against concurrent captures of the same URL. ON CONFLICT
        // DO NOTHING means the loser of the race inserts zero rows and we
        // hand back the winner's note instead.
        let result = sqlx::query(
            "INSERT INTO note (id, user_id, title, content, summary, source_type, source, \
             source_url, caption, tags, embedding, content_hash, ai_suggested_bucket, \
             ai_confidence, is_classified, captured_at, view_count, connection_count) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, false, $15, 0, 0) \
             ON CONFLICT (user_id, source_url) WHERE source_url IS NOT NULL DO NOTHING",
        )
        .bind(id)
        .bind(req.user_id)
        .bind(&req.title)
        .bind(&req.content)
        .bind(&req.summary)
        .bind(req.source_type.as_str())
        .bind(&req.source)
        .bind(&req.source_url)
        .bind(&req.caption)
        .bind(&req.tags)
        .bind(&req.embedding)
        .bind(&req.content_hash)
        .bind(req.ai_suggested_bucket)
        .bind(req.ai_confidence)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            if let Some(url) = &req.source_url {
                if let Some(existing) = self.find_by_source_url(req.user_id, url).await? {
                    return Ok(CreateNoteOutcome {
                        note: existing,
                        already_existed: true,
                    });
                }
            }
            return Err(Error::Internal(
                "Note insert conflicted but no existing row was found".to_string(),
            ));
        }

        let note = self.fetch(id).await?;
        Ok(CreateNoteOutcome {
            note,
            already_existed: false,
        })
    }

    async fn fetch(&self, id: Uuid) -> Result<Note> {
        let row = sqlx::query(&format!("SELECT {} FROM note WHERE id = $1", NOTE_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(Error::NoteNotFound(id))?;

        map_row_to_note(row)
    }

    async fn find_by_source_url(&self, user_id: Uuid, url: &str) -> Result<Option<Note>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM note WHERE user_id = $1 AND source_url = $2",
            NOTE_COLUMNS
        ))
        .bind(user_id)
        .bind(url)
        .fetch_optional(&self.pool)
        .await?;

        row.map(map_row_to_note).transpose()
    }

    async fn find_by_content_hash(
        &self,
        user_id: Uuid,
        hash: &str,
        window_minutes: i64,
    ) -> Result<Option<Note>> {
        let cutoff = Utc::now() - Duration::minutes(window_minutes);

        let row = sqlx::query(&format!(
            "SELECT {} FROM note \
             WHERE user_id = $1 AND content_hash = $2 AND captured_at >= $3 \
             ORDER BY captured_at DESC LIMIT 1",
            NOTE_COLUMNS
        ))
        .bind(user_id)
        .bind(hash)
        .bind(cutoff)
        .fetch_optional(&self.pool)
        .await?;

        row.map(map_row_to_note).transpose()
    }

    async fn assign_bucket(&self, note_id: Uuid, bucket_id: Uuid) -> Result<()> {
        let result = sqlx::query(
            "UPDATE note SET bucket_id = $1, is_classified = true WHERE id = $2",
        )
        .bind(bucket_id)
        .bind(note_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NoteNotFound(note_id));
        }
        Ok(())
    }

    async fn clear_bucket(&self, note_id: Uuid) -> Result<()> {
        let result = sqlx::query(
            "UPDATE note SET bucket_id = NULL, is_classified = false WHERE id = $1",
        )
        .bind(note_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NoteNotFound(note_id));
        }
        Ok(())
    }

    async fn increment_view_count(&self, id: Uuid) -> Result<()> {
        sqlx::query("UPDATE note SET view_count = view_count + 1 WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn inbox_count(&self, user_id: Uuid) -> Result<i64> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS count FROM note WHERE user_id = $1 AND bucket_id IS NULL",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.try_get("count")?)
    }

    async fn count_by_bucket(&self, user_id: Uuid) -> Result<Vec<BucketNoteCount>> {
        let rows = sqlx::query(
            "SELECT bucket_id, COUNT(*) AS count FROM note \
             WHERE user_id = $1 GROUP BY bucket_id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(BucketNoteCount {
                    bucket_id: row.try_get("bucket_id")?,
                    count: row.try_get("count")?,
                })
            })
            .collect()
    }

    async fn find_similar(
        &self,
        user_id: Uuid,
        embedding: &Vector,
        limit: i64,
        exclude_note_id: Uuid,
    ) -> Result<Vec<SimilarNote>> {
        let rows = sqlx::query(
            "SELECT id, title, 1 - (embedding <=> $2) AS score FROM note \
             WHERE user_id = $1 AND id != $3 AND embedding IS NOT NULL \
             ORDER BY embedding <=> $2 LIMIT $4",
        )
        .bind(user_id)
        .bind(embedding)
        .bind(exclude_note_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                let score: f64 = row.try_get("score")?;
                Ok(SimilarNote {
                    note_id: row.try_get("id")?,
                    title: row.try_get("title")?,
                    score: score as f32,
                })
            })
            .collect()
    }
}
