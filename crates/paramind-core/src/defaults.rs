//! Default configuration values shared across paramind crates.
//!
//! Each constant can be overridden by the environment variable named in its
//! doc comment; the `from_env` constructors in the consuming crates do the
//! lookup.

/// Dedup window for content-hash matches, in minutes.
/// Override: `PARAMIND_DEDUP_WINDOW_MINUTES`.
pub const DEDUP_WINDOW_MINUTES: i64 = 5;

/// PARA tree cache TTL, in seconds.
/// Override: `PARAMIND_PARA_CACHE_TTL_SECS`.
pub const PARA_CACHE_TTL_SECS: u64 = 300;

/// Minimum classifier confidence for recording a bucket suggestion.
/// Below this the classification is kept for observability only.
pub const SUGGEST_CONFIDENCE_THRESHOLD: f32 = 0.4;

/// Minimum cosine similarity for an AI-detected note connection.
/// Override: `PARAMIND_CONNECTION_MIN_SIMILARITY`.
pub const CONNECTION_MIN_SIMILARITY: f32 = 0.8;

/// Maximum AI-detected connections created per captured note.
pub const CONNECTION_MAX_PER_NOTE: usize = 5;

/// Unfiled-note count at which a reorganize-inbox suggestion is raised.
/// Override: `PARAMIND_INBOX_REORG_THRESHOLD`.
pub const INBOX_REORG_THRESHOLD: i64 = 20;

/// Capacity of the background task submission queue.
pub const DISPATCH_QUEUE_CAPACITY: usize = 64;

/// Capacity of the background task event broadcast channel.
pub const DISPATCH_EVENT_CAPACITY: usize = 128;

/// Default Ollama endpoint. Override: `OLLAMA_BASE`.
pub const OLLAMA_URL: &str = "http://127.0.0.1:11434";

/// Default embedding model. Override: `OLLAMA_EMBED_MODEL`.
pub const EMBED_MODEL: &str = "nomic-embed-text";

/// Default generation model. Override: `OLLAMA_GEN_MODEL`.
pub const GEN_MODEL: &str = "llama3.1:8b";

/// Default embedding dimension for nomic-embed-text.
/// Override: `OLLAMA_EMBED_DIM`.
pub const EMBED_DIMENSION: usize = 768;

/// Timeout for embedding requests (seconds).
/// Override: `PARAMIND_EMBED_TIMEOUT_SECS`.
pub const EMBED_TIMEOUT_SECS: u64 = 30;

/// Timeout for generation requests (seconds).
/// Override: `PARAMIND_GEN_TIMEOUT_SECS`.
pub const GEN_TIMEOUT_SECS: u64 = 120;
