//! Duplicate detection for incoming captures.
//!
//! Advisory pre-check only: the database's uniqueness constraint on
//! (user_id, source_url) remains the authority for racing captures. URL-less
//! content falls back to a content-hash match inside a trailing window, so a
//! double-tapped share sheet dedups but a deliberate re-capture hours later
//! does not.

use std::sync::Arc;

use tracing::{debug, instrument};
use uuid::Uuid;

use paramind_core::defaults::DEDUP_WINDOW_MINUTES;
use paramind_core::{content_hash, normalize_source_url, ExtractedContent, Note, NoteRepository, Result};

/// Pre-persistence duplicate detector.
pub struct DuplicateDetector {
    notes: Arc<dyn NoteRepository>,
    window_minutes: i64,
}

impl DuplicateDetector {
    pub fn new(notes: Arc<dyn NoteRepository>) -> Self {
        Self {
            notes,
            window_minutes: DEDUP_WINDOW_MINUTES,
        }
    }

    /// Override the content-hash window (minutes).
    pub fn with_window_minutes(mut self, minutes: i64) -> Self {
        self.window_minutes = minutes;
        self
    }

    /// The normalized URL this content would dedup on, if any.
    pub fn normalized_url(extracted: &ExtractedContent) -> Option<String> {
        extracted.canonical_url().and_then(normalize_source_url)
    }

    /// Check whether this content duplicates an existing note.
    #[instrument(skip(self, extracted), fields(subsystem = "capture", component = "dedup", op = "detect", user_id = %user_id))]
    pub async fn detect(
        &self,
        user_id: Uuid,
        extracted: &ExtractedContent,
    ) -> Result<Option<Note>> {
        if let Some(url) = Self::normalized_url(extracted) {
            let existing = self.notes.find_by_source_url(user_id, &url).await?;
            debug!(found = existing.is_some(), "URL dedup check");
            return Ok(existing);
        }

        if !extracted.content.trim().is_empty() {
            let hash = content_hash(&extracted.content);
            let existing = self
                .notes
                .find_by_content_hash(user_id, &hash, self.window_minutes)
                .await?;
            debug!(found = existing.is_some(), "Content-hash dedup check");
            return Ok(existing);
        }

        Ok(None)
    }
}
