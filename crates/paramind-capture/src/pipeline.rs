//! The note ingestion pipeline.
//!
//! Capture flow: dedup check → parallel enrichment → confidence-gated
//! bucket resolution → exactly-once persistence → detached side effects.
//! Duplicates short-circuit before any model call; a storage-level conflict
//! during insert is folded into the same deduplicated outcome. Side effects
//! never run for a deduplicated capture.

use std::sync::Arc;
use std::time::Instant;

use serde_json::json;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use paramind_core::{
    content_hash, Classifier, ClassifyResult, ConnectionRepository, CreateNoteRequest,
    EmbeddingBackend, ExtractedContent, Note, NoteRepository, Result, SuggestionKind,
    SuggestionRepository, Summarizer,
};

use crate::connections::ConnectionDetector;
use crate::dedup::DuplicateDetector;
use crate::dispatcher::TaskDispatcher;
use crate::enrich::Enricher;
use crate::policy;
use crate::reorganize::ReorganizeTrigger;

/// Optional inputs accompanying a capture.
#[derive(Debug, Clone, Default)]
pub struct CaptureOptions {
    /// Summary computed upstream (e.g. during transcription); skips the
    /// summarizer when present.
    pub summary: Option<String>,
    /// Extraction warning to surface to the user unchanged.
    pub warning: Option<String>,
}

/// What a capture produced.
#[derive(Debug, Clone)]
pub struct CaptureResult {
    pub note: Note,
    pub summary: Option<String>,
    /// Absent for deduplicated captures, which never reach the classifier.
    pub classification: Option<ClassifyResult>,
    /// Name of the new bucket proposed for review, if any. The bucket does
    /// not exist yet; accepting the suggestion creates it.
    pub created_bucket_name: Option<String>,
    pub deduplicated: bool,
    pub warning: Option<String>,
}

/// Orchestrates a capture end to end.
pub struct CapturePipeline {
    notes: Arc<dyn NoteRepository>,
    suggestions: Arc<dyn SuggestionRepository>,
    dedup: DuplicateDetector,
    enricher: Enricher,
    connections: Arc<ConnectionDetector>,
    reorganize: Arc<ReorganizeTrigger>,
    dispatcher: Arc<TaskDispatcher>,
}

impl CapturePipeline {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        notes: Arc<dyn NoteRepository>,
        suggestions: Arc<dyn SuggestionRepository>,
        connections: Arc<dyn ConnectionRepository>,
        embeddings: Arc<dyn EmbeddingBackend>,
        summarizer: Arc<dyn Summarizer>,
        classifier: Arc<dyn Classifier>,
        dispatcher: Arc<TaskDispatcher>,
    ) -> Self {
        Self {
            dedup: DuplicateDetector::new(notes.clone()),
            enricher: Enricher::new(embeddings, summarizer, classifier),
            connections: Arc::new(ConnectionDetector::new(notes.clone(), connections)),
            reorganize: Arc::new(ReorganizeTrigger::new(notes.clone(), suggestions.clone())),
            notes,
            suggestions,
            dispatcher,
        }
    }

    /// The dispatcher handling this pipeline's side effects.
    pub fn dispatcher(&self) -> &Arc<TaskDispatcher> {
        &self.dispatcher
    }

    /// Capture one piece of extracted content for a user.
    #[instrument(skip(self, extracted, user_note, options), fields(subsystem = "capture", component = "pipeline", op = "process", user_id = %user_id, source_type = %extracted.source_type))]
    pub async fn process(
        &self,
        user_id: Uuid,
        extracted: ExtractedContent,
        user_note: Option<String>,
        options: CaptureOptions,
    ) -> Result<CaptureResult> {
        let start = Instant::now();

        if let Some(existing) = self.dedup.detect(user_id, &extracted).await? {
            info!(
                note_id = %existing.id,
                deduplicated = true,
                duration_ms = start.elapsed().as_millis() as u64,
                "Capture deduplicated before enrichment"
            );
            return Ok(Self::deduplicated_result(existing, options.warning));
        }

        let enrichment = self
            .enricher
            .enrich(user_id, &extracted, user_note.as_deref(), options.summary)
            .await?;
        let resolution = policy::resolve(&enrichment.classification);

        let source_url = DuplicateDetector::normalized_url(&extracted);
        let hash = if extracted.content.trim().is_empty() {
            None
        } else {
            Some(content_hash(&extracted.content))
        };

        let outcome = self
            .notes
            .create(CreateNoteRequest {
                user_id,
                title: extracted.title,
                content: extracted.content,
                summary: enrichment.summary.clone(),
                source_type: extracted.source_type,
                source: extracted.source,
                source_url,
                content_hash: hash,
                caption: user_note,
                tags: enrichment.classification.tags.clone(),
                embedding: Some(enrichment.embedding.clone()),
                ai_suggested_bucket: resolution.suggested_bucket(),
                ai_confidence: Some(resolution.confidence()),
            })
            .await?;

        if outcome.already_existed {
            // Lost an insert race; the winner already ran the side effects.
            info!(
                note_id = %outcome.note.id,
                deduplicated = true,
                "Capture deduplicated at storage constraint"
            );
            return Ok(Self::deduplicated_result(outcome.note, options.warning));
        }

        let note = outcome.note;
        let created_bucket_name = self
            .maybe_spawn_bucket_suggestion(user_id, &note, &enrichment.classification)
            .await;

        self.dispatch_side_effects(user_id, &note, &enrichment.embedding);

        info!(
            note_id = %note.id,
            deduplicated = false,
            confidence = resolution.confidence(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Capture complete"
        );

        Ok(CaptureResult {
            summary: enrichment.summary,
            classification: Some(enrichment.classification),
            created_bucket_name,
            deduplicated: false,
            warning: options.warning,
            note,
        })
    }

    fn deduplicated_result(note: Note, warning: Option<String>) -> CaptureResult {
        CaptureResult {
            summary: note.summary.clone(),
            classification: None,
            created_bucket_name: None,
            deduplicated: true,
            warning,
            note,
        }
    }

    /// Record a create-bucket suggestion when classification proposed a new
    /// bucket above the confidence gate. Failures are logged and swallowed;
    /// the capture already succeeded.
    async fn maybe_spawn_bucket_suggestion(
        &self,
        user_id: Uuid,
        note: &Note,
        classification: &ClassifyResult,
    ) -> Option<String> {
        if !policy::new_bucket_gate(classification) {
            return None;
        }
        let proposal = classification.suggest_new_bucket.as_ref()?;

        let payload = json!({
            "note_id": note.id,
            "note_title": note.title,
            "name": proposal.name,
            "parent_type": proposal.parent_type,
        });

        match self
            .suggestions
            .create(user_id, SuggestionKind::CreateBucket, payload)
            .await
        {
            Ok(id) => {
                debug!(suggestion_id = %id, name = %proposal.name, "Recorded create-bucket suggestion");
                Some(proposal.name.clone())
            }
            Err(e) => {
                warn!(error = %e, "Failed to record create-bucket suggestion");
                None
            }
        }
    }

    fn dispatch_side_effects(&self, user_id: Uuid, note: &Note, embedding: &paramind_core::Vector) {
        let detector = self.connections.clone();
        let embedding = embedding.clone();
        let note_id = note.id;
        self.dispatcher.submit("connection_detection", async move {
            detector.detect(user_id, note_id, &embedding).await?;
            Ok(())
        });

        let trigger = self.reorganize.clone();
        let bucket_id = note.bucket_id;
        self.dispatcher.submit("reorganize_check", async move {
            trigger.check(user_id, note_id, bucket_id).await
        });
    }
}
