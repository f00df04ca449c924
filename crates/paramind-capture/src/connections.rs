//! AI connection detection between notes.
//!
//! After a new note is persisted with an embedding, its nearest neighbors
//! above a similarity threshold become reciprocal `ai_detected` connections,
//! capped per note. Runs as a dispatched side effect.

use std::sync::Arc;

use tracing::{debug, instrument};
use uuid::Uuid;

use paramind_core::defaults::{CONNECTION_MAX_PER_NOTE, CONNECTION_MIN_SIMILARITY};
use paramind_core::{ConnectionRepository, NoteRepository, Result, Vector};

/// Finds and records connections for a freshly captured note.
pub struct ConnectionDetector {
    notes: Arc<dyn NoteRepository>,
    connections: Arc<dyn ConnectionRepository>,
    min_similarity: f32,
    max_per_note: usize,
}

impl ConnectionDetector {
    pub fn new(notes: Arc<dyn NoteRepository>, connections: Arc<dyn ConnectionRepository>) -> Self {
        Self {
            notes,
            connections,
            min_similarity: CONNECTION_MIN_SIMILARITY,
            max_per_note: CONNECTION_MAX_PER_NOTE,
        }
    }

    /// Override the similarity threshold.
    pub fn with_min_similarity(mut self, threshold: f32) -> Self {
        self.min_similarity = threshold;
        self
    }

    /// Detect and persist connections for the note. Returns how many were
    /// created.
    #[instrument(skip(self, embedding), fields(subsystem = "capture", component = "connections", op = "detect", user_id = %user_id, note_id = %note_id))]
    pub async fn detect(
        &self,
        user_id: Uuid,
        note_id: Uuid,
        embedding: &Vector,
    ) -> Result<usize> {
        let candidates = self
            .notes
            .find_similar(user_id, embedding, self.max_per_note as i64, note_id)
            .await?;

        let mut created = 0;
        for candidate in candidates {
            if candidate.score < self.min_similarity {
                // Results come back best-first, nothing past this qualifies.
                break;
            }
            self.connections
                .create_reciprocal(note_id, candidate.note_id, "ai_detected", candidate.score)
                .await?;
            created += 1;
        }

        debug!(created, "Connection detection complete");
        Ok(created)
    }
}
