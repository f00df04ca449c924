//! PARA bucket repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use paramind_core::{
    BucketRepository, CreateBucketRequest, Error, ParaBucket, ParaBucketType, Result,
};

/// PostgreSQL implementation of BucketRepository.
pub struct PgBucketRepository {
    pool: Pool<Postgres>,
}

impl PgBucketRepository {
    /// Create a new PgBucketRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn map_row_to_bucket(row: sqlx::postgres::PgRow) -> Result<ParaBucket> {
    let type_str: String = row.try_get("bucket_type")?;
    let bucket_type: ParaBucketType = type_str.parse()?;

    Ok(ParaBucket {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        name: row.try_get("name")?,
        bucket_type,
        parent_id: row.try_get("parent_id")?,
        sort_order: row.try_get("sort_order")?,
        active: row.try_get("active")?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl BucketRepository for PgBucketRepository {
    async fn create(&self, req: CreateBucketRequest) -> Result<Uuid> {
        let id = Uuid::now_v7();
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO para_bucket (id, user_id, name, bucket_type, parent_id, sort_order, \
             active, created_at) VALUES ($1, $2, $3, $4, $5, $6, true, $7)",
        )
        .bind(id)
        .bind(req.user_id)
        .bind(&req.name)
        .bind(req.bucket_type.as_str())
        .bind(req.parent_id)
        .bind(req.sort_order)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(id)
    }

    async fn get(&self, id: Uuid) -> Result<Option<ParaBucket>> {
        let row = sqlx::query(
            "SELECT id, user_id, name, bucket_type, parent_id, sort_order, active, created_at \
             FROM para_bucket WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(map_row_to_bucket).transpose()
    }

    async fn list_active(&self, user_id: Uuid) -> Result<Vec<ParaBucket>> {
        let rows = sqlx::query(
            "SELECT id, user_id, name, bucket_type, parent_id, sort_order, active, created_at \
             FROM para_bucket WHERE user_id = $1 AND active = true \
             ORDER BY sort_order, created_at",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(map_row_to_bucket).collect()
    }

    async fn rename(&self, id: Uuid, name: &str) -> Result<()> {
        let result = sqlx::query("UPDATE para_bucket SET name = $1 WHERE id = $2")
            .bind(name)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::BucketNotFound(id));
        }
        Ok(())
    }

    async fn move_bucket(&self, id: Uuid, new_parent_id: Option<Uuid>) -> Result<()> {
        let result = sqlx::query("UPDATE para_bucket SET parent_id = $1 WHERE id = $2")
            .bind(new_parent_id)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::BucketNotFound(id));
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        // Notes fall back to the inbox, not to the parent bucket, so the
        // user sees them again instead of silently inheriting a location.
        sqlx::query("UPDATE note SET bucket_id = NULL WHERE bucket_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("UPDATE note SET ai_suggested_bucket = NULL WHERE ai_suggested_bucket = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("UPDATE para_bucket SET parent_id = NULL WHERE parent_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM para_bucket WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(Error::BucketNotFound(id));
        }

        tx.commit().await?;
        Ok(())
    }
}
