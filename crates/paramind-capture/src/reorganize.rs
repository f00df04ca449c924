//! Reorganization and overview-refresh triggers.
//!
//! Dispatched after a capture persists. Inbox pressure past a threshold
//! raises a single pending `reorganize_inbox` suggestion; a note landing in
//! a confirmed bucket raises `refresh_overview` for that bucket. Both are
//! gated on not already having a pending suggestion of the same kind, so
//! the review queue never fills with duplicates.

use std::sync::Arc;

use serde_json::json;
use tracing::{debug, instrument};
use uuid::Uuid;

use paramind_core::defaults::INBOX_REORG_THRESHOLD;
use paramind_core::{NoteRepository, Result, SuggestionKind, SuggestionRepository};

/// Raises maintenance suggestions in response to captures.
pub struct ReorganizeTrigger {
    notes: Arc<dyn NoteRepository>,
    suggestions: Arc<dyn SuggestionRepository>,
    inbox_threshold: i64,
}

impl ReorganizeTrigger {
    pub fn new(
        notes: Arc<dyn NoteRepository>,
        suggestions: Arc<dyn SuggestionRepository>,
    ) -> Self {
        Self {
            notes,
            suggestions,
            inbox_threshold: INBOX_REORG_THRESHOLD,
        }
    }

    /// Override the inbox-pressure threshold.
    pub fn with_inbox_threshold(mut self, threshold: i64) -> Self {
        self.inbox_threshold = threshold;
        self
    }

    /// Run the triggers for a freshly captured note.
    #[instrument(skip(self), fields(subsystem = "capture", component = "reorganize", op = "check", user_id = %user_id, note_id = %note_id))]
    pub async fn check(
        &self,
        user_id: Uuid,
        note_id: Uuid,
        bucket_id: Option<Uuid>,
    ) -> Result<()> {
        let inbox = self.notes.inbox_count(user_id).await?;
        if inbox >= self.inbox_threshold
            && !self
                .suggestions
                .has_pending(user_id, SuggestionKind::ReorganizeInbox)
                .await?
        {
            self.suggestions
                .create(
                    user_id,
                    SuggestionKind::ReorganizeInbox,
                    json!({ "inbox_count": inbox }),
                )
                .await?;
            debug!(inbox_count = inbox, "Raised reorganize-inbox suggestion");
        }

        if let Some(bucket_id) = bucket_id {
            if !self
                .suggestions
                .has_pending(user_id, SuggestionKind::RefreshOverview)
                .await?
            {
                self.suggestions
                    .create(
                        user_id,
                        SuggestionKind::RefreshOverview,
                        json!({ "bucket_id": bucket_id, "note_id": note_id }),
                    )
                    .await?;
                debug!(bucket_id = %bucket_id, "Raised refresh-overview suggestion");
            }
        }

        Ok(())
    }
}
