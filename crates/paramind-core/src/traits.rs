//! Core traits for paramind abstractions.
//!
//! These traits define the interfaces that concrete implementations
//! must satisfy, enabling pluggable backends and testability.

use async_trait::async_trait;
use pgvector::Vector;
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::error::Result;
use crate::models::*;

// =============================================================================
// NOTE REPOSITORY
// =============================================================================

/// Direct note count for a bucket (`bucket_id` None = inbox).
#[derive(Debug, Clone)]
pub struct BucketNoteCount {
    pub bucket_id: Option<Uuid>,
    pub count: i64,
}

/// Repository for note persistence and dedup lookups.
#[async_trait]
pub trait NoteRepository: Send + Sync {
    /// Create a note, or return the pre-existing one if the store's
    /// uniqueness constraint on (user, source_url) fired.
    async fn create(&self, req: CreateNoteRequest) -> Result<CreateNoteOutcome>;

    /// Fetch a note by ID.
    async fn fetch(&self, id: Uuid) -> Result<Note>;

    /// Find the user's note with the given normalized source URL.
    async fn find_by_source_url(&self, user_id: Uuid, url: &str) -> Result<Option<Note>>;

    /// Find the user's note with the given content hash captured within the
    /// trailing window.
    async fn find_by_content_hash(
        &self,
        user_id: Uuid,
        hash: &str,
        window_minutes: i64,
    ) -> Result<Option<Note>>;

    /// Confirm a bucket assignment. This is the only path that sets
    /// `is_classified = true`.
    async fn assign_bucket(&self, note_id: Uuid, bucket_id: Uuid) -> Result<()>;

    /// Send a note back to the inbox, clearing its classification.
    async fn clear_bucket(&self, note_id: Uuid) -> Result<()>;

    /// Bump the view counter.
    async fn increment_view_count(&self, id: Uuid) -> Result<()>;

    /// Number of unfiled notes for the user.
    async fn inbox_count(&self, user_id: Uuid) -> Result<i64>;

    /// Direct note counts grouped by bucket (including the inbox row).
    async fn count_by_bucket(&self, user_id: Uuid) -> Result<Vec<BucketNoteCount>>;

    /// Notes most similar to the given embedding, best first, excluding
    /// `exclude_note_id`.
    async fn find_similar(
        &self,
        user_id: Uuid,
        embedding: &Vector,
        limit: i64,
        exclude_note_id: Uuid,
    ) -> Result<Vec<SimilarNote>>;
}

// =============================================================================
// BUCKET REPOSITORY
// =============================================================================

/// Repository for PARA bucket (folder) operations.
#[async_trait]
pub trait BucketRepository: Send + Sync {
    /// Create a new bucket.
    async fn create(&self, req: CreateBucketRequest) -> Result<Uuid>;

    /// Get a bucket by ID.
    async fn get(&self, id: Uuid) -> Result<Option<ParaBucket>>;

    /// All active buckets for the user, ordered by sort order.
    async fn list_active(&self, user_id: Uuid) -> Result<Vec<ParaBucket>>;

    /// Rename a bucket. Descendant paths change on the next cache rebuild.
    async fn rename(&self, id: Uuid, name: &str) -> Result<()>;

    /// Re-parent a bucket.
    async fn move_bucket(&self, id: Uuid, new_parent_id: Option<Uuid>) -> Result<()>;

    /// Delete a bucket. Child buckets are re-parented to the root and the
    /// bucket's notes return to the inbox.
    async fn delete(&self, id: Uuid) -> Result<()>;
}

// =============================================================================
// SUGGESTION REPOSITORY
// =============================================================================

/// Repository for the human review queue.
#[async_trait]
pub trait SuggestionRepository: Send + Sync {
    /// Record a suggestion for review.
    async fn create(&self, user_id: Uuid, kind: SuggestionKind, payload: JsonValue)
        -> Result<Uuid>;

    /// Pending suggestions for the user, oldest first.
    async fn list_pending(&self, user_id: Uuid) -> Result<Vec<Suggestion>>;

    /// Whether a pending suggestion of this kind already exists.
    async fn has_pending(&self, user_id: Uuid, kind: SuggestionKind) -> Result<bool>;

    /// Mark a suggestion accepted or dismissed.
    async fn resolve(&self, id: Uuid, status: &str) -> Result<()>;
}

// =============================================================================
// CONNECTION REPOSITORY
// =============================================================================

/// Repository for note-to-note connections.
#[async_trait]
pub trait ConnectionRepository: Send + Sync {
    /// Create reciprocal connections between two notes and bump both
    /// connection counters.
    async fn create_reciprocal(
        &self,
        note_a: Uuid,
        note_b: Uuid,
        kind: &str,
        score: f32,
    ) -> Result<()>;

    /// Number of connections touching a note.
    async fn count_for_note(&self, note_id: Uuid) -> Result<i64>;

    /// Delete all connections touching a note (both directions).
    async fn delete_for_note(&self, note_id: Uuid) -> Result<()>;
}

// =============================================================================
// INFERENCE SEAMS
// =============================================================================

/// Backend for generating text embeddings.
#[async_trait]
pub trait EmbeddingBackend: Send + Sync {
    /// Generate embeddings for the given texts, one vector per input.
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vector>>;

    /// Expected dimension of embedding vectors.
    fn dimension(&self) -> usize;

    /// Model name being used.
    fn model_name(&self) -> &str;
}

/// Backend for text generation (LLM).
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Generate text given a prompt.
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Generate text with system context.
    async fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String>;

    /// Generate with JSON output enforcement.
    async fn generate_json_with_system(&self, system: &str, prompt: &str) -> Result<String>;

    /// Model name being used.
    fn model_name(&self) -> &str;
}

/// Summarization service. Returns `None` when the model produced nothing
/// usable; callers treat that as a degraded-but-successful outcome.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, req: &SummarizeRequest) -> Result<Option<String>>;
}

/// Classification service mapping content onto the user's bucket hierarchy.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, req: &ClassifyRequest) -> Result<ClassifyResult>;
}
