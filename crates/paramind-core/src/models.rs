//! Core data models for paramind.

use chrono::{DateTime, Utc};
use pgvector::Vector;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

// =============================================================================
// SOURCE TYPES
// =============================================================================

/// Kind of content a note was captured from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Article,
    Tweet,
    Video,
    Pdf,
    Voice,
    Image,
    /// Raw thought typed directly by the user (no external source).
    Thought,
}

impl SourceType {
    /// Stable string form used in the database and prompts.
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Article => "article",
            SourceType::Tweet => "tweet",
            SourceType::Video => "video",
            SourceType::Pdf => "pdf",
            SourceType::Voice => "voice",
            SourceType::Image => "image",
            SourceType::Thought => "thought",
        }
    }
}

impl std::str::FromStr for SourceType {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s {
            "article" => Ok(SourceType::Article),
            "tweet" => Ok(SourceType::Tweet),
            "video" => Ok(SourceType::Video),
            "pdf" => Ok(SourceType::Pdf),
            "voice" => Ok(SourceType::Voice),
            "image" => Ok(SourceType::Image),
            "thought" => Ok(SourceType::Thought),
            other => Err(crate::Error::InvalidInput(format!(
                "Unknown source type: {}",
                other
            ))),
        }
    }
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// EXTRACTED CONTENT (pipeline input)
// =============================================================================

/// Content produced by an upstream extractor, handed to the capture pipeline.
///
/// Immutable once constructed. The `source` payload is extractor-specific;
/// when it carries a `url` key that URL is used for dedup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedContent {
    pub title: String,
    pub content: String,
    pub source_type: SourceType,
    /// Opaque structured payload from the extractor (tweet JSON, article
    /// metadata, transcription info, ...).
    pub source: JsonValue,
    #[serde(default)]
    pub media_urls: Vec<String>,
}

impl ExtractedContent {
    /// The canonical URL carried by the source payload, if any.
    pub fn canonical_url(&self) -> Option<&str> {
        self.source.get("url").and_then(|v| v.as_str()).filter(|u| !u.is_empty())
    }
}

// =============================================================================
// CLASSIFICATION
// =============================================================================

/// Proposal for a bucket that does not exist yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewBucketSuggestion {
    pub name: String,
    pub parent_type: ParaBucketType,
}

/// Output of the classification call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifyResult {
    /// Candidate existing bucket, if the classifier matched one.
    pub bucket_id: Option<Uuid>,
    /// Classifier confidence in [0, 1].
    pub confidence: f32,
    pub tags: Vec<String>,
    pub is_original_thought: bool,
    /// Set when the classifier thinks no existing bucket fits and a new one
    /// should be proposed for human review.
    pub suggest_new_bucket: Option<NewBucketSuggestion>,
}

/// Inputs for the summarization call.
#[derive(Debug, Clone)]
pub struct SummarizeRequest {
    pub title: String,
    pub content: String,
    pub source_type: SourceType,
    pub user_note: Option<String>,
}

/// Inputs for the classification call.
#[derive(Debug, Clone)]
pub struct ClassifyRequest {
    pub user_id: Uuid,
    pub title: String,
    pub content: String,
    pub summary: Option<String>,
    pub source_type: SourceType,
    pub user_note: Option<String>,
}

// =============================================================================
// NOTES
// =============================================================================

/// A persisted unit of captured content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub content: String,
    /// AI-generated summary. Nullable: summarization may have degraded.
    pub summary: Option<String>,
    pub source_type: SourceType,
    pub source: JsonValue,
    /// Normalized source URL. Unique per user when present.
    pub source_url: Option<String>,
    /// User-supplied caption attached at capture time.
    pub caption: Option<String>,
    /// Confirmed bucket. Null until a human files the note.
    pub bucket_id: Option<Uuid>,
    /// Bucket the classifier suggested, pending confirmation.
    pub ai_suggested_bucket: Option<Uuid>,
    pub ai_confidence: Option<f32>,
    /// True only after a human confirmed a bucket assignment.
    pub is_classified: bool,
    pub tags: Vec<String>,
    #[serde(skip)]
    pub embedding: Option<Vector>,
    /// Stable hash of the normalized text content, used for dedup.
    pub content_hash: Option<String>,
    pub captured_at: DateTime<Utc>,
    pub view_count: i32,
    pub connection_count: i32,
    pub distilled_at: Option<DateTime<Utc>>,
    pub distillation: Option<String>,
}

/// Request for creating a new note.
#[derive(Debug, Clone)]
pub struct CreateNoteRequest {
    pub user_id: Uuid,
    pub title: String,
    pub content: String,
    pub summary: Option<String>,
    pub source_type: SourceType,
    pub source: JsonValue,
    pub source_url: Option<String>,
    pub content_hash: Option<String>,
    pub caption: Option<String>,
    pub tags: Vec<String>,
    pub embedding: Option<Vector>,
    pub ai_suggested_bucket: Option<Uuid>,
    pub ai_confidence: Option<f32>,
}

/// Outcome of a note create: either a fresh row, or the pre-existing one
/// when a storage-level uniqueness conflict fired.
#[derive(Debug, Clone)]
pub struct CreateNoteOutcome {
    pub note: Note,
    pub already_existed: bool,
}

/// A similarity hit against an existing note's embedding.
#[derive(Debug, Clone)]
pub struct SimilarNote {
    pub note_id: Uuid,
    pub title: String,
    /// Cosine similarity in [0, 1].
    pub score: f32,
}

// =============================================================================
// PARA BUCKETS
// =============================================================================

/// The four top-level PARA containers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParaBucketType {
    Project,
    Area,
    Resource,
    Archive,
}

impl ParaBucketType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParaBucketType::Project => "project",
            ParaBucketType::Area => "area",
            ParaBucketType::Resource => "resource",
            ParaBucketType::Archive => "archive",
        }
    }

    /// All four types in canonical display order.
    pub fn all() -> [ParaBucketType; 4] {
        [
            ParaBucketType::Project,
            ParaBucketType::Area,
            ParaBucketType::Resource,
            ParaBucketType::Archive,
        ]
    }
}

impl std::str::FromStr for ParaBucketType {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s {
            "project" => Ok(ParaBucketType::Project),
            "area" => Ok(ParaBucketType::Area),
            "resource" => Ok(ParaBucketType::Resource),
            "archive" => Ok(ParaBucketType::Archive),
            other => Err(crate::Error::InvalidInput(format!(
                "Unknown bucket type: {}",
                other
            ))),
        }
    }
}

impl std::fmt::Display for ParaBucketType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A folder node in the PARA hierarchy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParaBucket {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub bucket_type: ParaBucketType,
    /// Null only for the root container of each PARA type.
    pub parent_id: Option<Uuid>,
    pub sort_order: i32,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// Request for creating a bucket.
#[derive(Debug, Clone)]
pub struct CreateBucketRequest {
    pub user_id: Uuid,
    pub name: String,
    pub bucket_type: ParaBucketType,
    pub parent_id: Option<Uuid>,
    pub sort_order: i32,
}

/// Derived, cache-only view of a bucket with aggregated counts and
/// materialized children. Rebuilt by the tree cache, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParaTreeNode {
    pub id: Uuid,
    pub name: String,
    pub bucket_type: ParaBucketType,
    pub parent_id: Option<Uuid>,
    pub sort_order: i32,
    /// Own direct notes plus all descendants' notes.
    pub note_count: i64,
    pub children: Vec<ParaTreeNode>,
}

// =============================================================================
// SUGGESTIONS (review queue)
// =============================================================================

/// Kind of a review-queue suggestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionKind {
    /// Classifier proposed a bucket that does not exist yet.
    CreateBucket,
    /// Inbox has grown enough to warrant a restructuring pass.
    ReorganizeInbox,
    /// A bucket's rollup overview is stale and should be regenerated.
    RefreshOverview,
}

impl SuggestionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SuggestionKind::CreateBucket => "create_bucket",
            SuggestionKind::ReorganizeInbox => "reorganize_inbox",
            SuggestionKind::RefreshOverview => "refresh_overview",
        }
    }
}

impl std::str::FromStr for SuggestionKind {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s {
            "create_bucket" => Ok(SuggestionKind::CreateBucket),
            "reorganize_inbox" => Ok(SuggestionKind::ReorganizeInbox),
            "refresh_overview" => Ok(SuggestionKind::RefreshOverview),
            other => Err(crate::Error::InvalidInput(format!(
                "Unknown suggestion kind: {}",
                other
            ))),
        }
    }
}

/// A pending item in the human review queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Suggestion {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: SuggestionKind,
    pub payload: JsonValue,
    /// "pending", "accepted", or "dismissed".
    pub status: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// NOTE CONNECTIONS
// =============================================================================

/// A directed link between two notes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoteConnection {
    pub id: Uuid,
    pub from_note_id: Uuid,
    pub to_note_id: Uuid,
    /// "ai_detected" or "explicit".
    pub kind: String,
    pub score: f32,
    pub created_at: DateTime<Utc>,
}
