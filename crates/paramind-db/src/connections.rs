//! Note connection repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use paramind_core::{ConnectionRepository, Result};

/// PostgreSQL implementation of ConnectionRepository.
pub struct PgConnectionRepository {
    pool: Pool<Postgres>,
}

impl PgConnectionRepository {
    /// Create a new PgConnectionRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ConnectionRepository for PgConnectionRepository {
    async fn create_reciprocal(
        &self,
        note_a: Uuid,
        note_b: Uuid,
        kind: &str,
        score: f32,
    ) -> Result<()> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        // Both directions plus both counters move in one transaction, so the
        // connection_count denormalization can never drift from the rows.
        sqlx::query(
            "INSERT INTO note_connection (id, from_note_id, to_note_id, kind, score, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (from_note_id, to_note_id) DO NOTHING",
        )
        .bind(Uuid::now_v7())
        .bind(note_a)
        .bind(note_b)
        .bind(kind)
        .bind(score)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO note_connection (id, from_note_id, to_note_id, kind, score, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (from_note_id, to_note_id) DO NOTHING",
        )
        .bind(Uuid::now_v7())
        .bind(note_b)
        .bind(note_a)
        .bind(kind)
        .bind(score)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE note SET connection_count = (SELECT COUNT(*) FROM note_connection \
             WHERE from_note_id = note.id) WHERE id = $1 OR id = $2",
        )
        .bind(note_a)
        .bind(note_b)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn count_for_note(&self, note_id: Uuid) -> Result<i64> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS count FROM note_connection WHERE from_note_id = $1",
        )
        .bind(note_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.try_get("count")?)
    }

    async fn delete_for_note(&self, note_id: Uuid) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let affected: Vec<Uuid> = sqlx::query(
            "SELECT DISTINCT from_note_id AS id FROM note_connection WHERE to_note_id = $1",
        )
        .bind(note_id)
        .fetch_all(&mut *tx)
        .await?
        .into_iter()
        .map(|row| row.try_get("id"))
        .collect::<std::result::Result<_, sqlx::Error>>()?;

        sqlx::query(
            "DELETE FROM note_connection WHERE from_note_id = $1 OR to_note_id = $1",
        )
        .bind(note_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE note SET connection_count = (SELECT COUNT(*) FROM note_connection \
             WHERE from_note_id = note.id) WHERE id = ANY($1) OR id = $2",
        )
        .bind(&affected)
        .bind(note_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }
}
