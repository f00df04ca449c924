//! # paramind-db
//!
//! PostgreSQL database layer for paramind.
//!
//! This crate provides:
//! - Connection pool management
//! - Repository implementations for notes, buckets, suggestions, and
//!   note connections
//! - Vector similarity lookups with pgvector
//!
//! ## Example
//!
//! ```rust,ignore
//! use paramind_db::Database;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/paramind").await?;
//!     let count = db.notes.inbox_count(user_id).await?;
//!     println!("inbox: {}", count);
//!     Ok(())
//! }
//! ```

pub mod buckets;
pub mod connections;
pub mod notes;
pub mod pool;
pub mod suggestions;

// Re-export core types
pub use paramind_core::*;

pub use buckets::PgBucketRepository;
pub use connections::PgConnectionRepository;
pub use notes::PgNoteRepository;
pub use pool::{create_pool, create_pool_with_config, log_pool_metrics, PoolConfig};
pub use suggestions::PgSuggestionRepository;

/// Bundle of all repository implementations sharing one connection pool.
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    /// Note repository for capture, dedup, and similarity lookups.
    pub notes: PgNoteRepository,
    /// PARA bucket repository for the folder hierarchy.
    pub buckets: PgBucketRepository,
    /// Review-queue suggestion repository.
    pub suggestions: PgSuggestionRepository,
    /// Note connection repository.
    pub connections: PgConnectionRepository,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            notes: PgNoteRepository::new(pool.clone()),
            buckets: PgBucketRepository::new(pool.clone()),
            suggestions: PgSuggestionRepository::new(pool.clone()),
            connections: PgConnectionRepository::new(pool.clone()),
            pool,
        }
    }

    /// Connect to the database and create all repositories.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = pool::create_pool(database_url).await?;
        Ok(Self::new(pool))
    }

    /// Connect with custom pool configuration.
    pub async fn connect_with_config(database_url: &str, config: PoolConfig) -> Result<Self> {
        let pool = pool::create_pool_with_config(database_url, config).await?;
        Ok(Self::new(pool))
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self::new(self.pool.clone())
    }
}
