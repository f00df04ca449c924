//! Review-queue suggestion repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value as JsonValue;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use paramind_core::{Error, Result, Suggestion, SuggestionKind, SuggestionRepository};

/// PostgreSQL implementation of SuggestionRepository.
pub struct PgSuggestionRepository {
    pool: Pool<Postgres>,
}

impl PgSuggestionRepository {
    /// Create a new PgSuggestionRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn map_row_to_suggestion(row: sqlx::postgres::PgRow) -> Result<Suggestion> {
    let kind_str: String = row.try_get("kind")?;
    let kind: SuggestionKind = kind_str.parse()?;

    Ok(Suggestion {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        kind,
        payload: row.try_get("payload")?,
        status: row.try_get("status")?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl SuggestionRepository for PgSuggestionRepository {
    async fn create(
        &self,
        user_id: Uuid,
        kind: SuggestionKind,
        payload: JsonValue,
    ) -> Result<Uuid> {
        let id = Uuid::now_v7();

        sqlx::query(
            "INSERT INTO suggestion (id, user_id, kind, payload, status, created_at) \
             VALUES ($1, $2, $3, $4, 'pending', $5)",
        )
        .bind(id)
        .bind(user_id)
        .bind(kind.as_str())
        .bind(&payload)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(id)
    }

    async fn list_pending(&self, user_id: Uuid) -> Result<Vec<Suggestion>> {
        let rows = sqlx::query(
            "SELECT id, user_id, kind, payload, status, created_at FROM suggestion \
             WHERE user_id = $1 AND status = 'pending' ORDER BY created_at",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(map_row_to_suggestion).collect()
    }

    async fn has_pending(&self, user_id: Uuid, kind: SuggestionKind) -> Result<bool> {
        let row = sqlx::query(
            "SELECT EXISTS(SELECT 1 FROM suggestion \
             WHERE user_id = $1 AND kind = $2 AND status = 'pending') AS present",
        )
        .bind(user_id)
        .bind(kind.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(row.try_get("present")?)
    }

    async fn resolve(&self, id: Uuid, status: &str) -> Result<()> {
        if status != "accepted" && status != "dismissed" {
            return Err(Error::InvalidInput(format!(
                "Invalid suggestion status: {}",
                status
            )));
        }

        let result = sqlx::query(
            "UPDATE suggestion SET status = $1 WHERE id = $2 AND status = 'pending'",
        )
        .bind(status)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("Pending suggestion {}", id)));
        }
        Ok(())
    }
}
