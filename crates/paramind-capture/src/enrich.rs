//! Parallel enrichment fan-out.
//!
//! Embedding, summarization, and classification run concurrently per
//! capture. Summarization is the only lossy step: a failed or empty summary
//! degrades to `None` and the capture continues. Embedding and
//! classification failures abort the capture before anything is persisted.

use std::sync::Arc;
use std::time::Instant;

use tokio::try_join;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use paramind_core::{
    ClassifyRequest, ClassifyResult, EmbeddingBackend, Error, ExtractedContent, Result,
    Summarizer, SummarizeRequest, Vector,
};

/// Output of the enrichment stage.
#[derive(Debug, Clone)]
pub struct Enrichment {
    pub summary: Option<String>,
    pub embedding: Vector,
    pub classification: ClassifyResult,
}

/// Runs the three enrichment calls for a capture.
pub struct Enricher {
    embeddings: Arc<dyn EmbeddingBackend>,
    summarizer: Arc<dyn Summarizer>,
    classifier: Arc<dyn paramind_core::Classifier>,
}

impl Enricher {
    pub fn new(
        embeddings: Arc<dyn EmbeddingBackend>,
        summarizer: Arc<dyn Summarizer>,
        classifier: Arc<dyn paramind_core::Classifier>,
    ) -> Self {
        Self {
            embeddings,
            summarizer,
            classifier,
        }
    }

    /// Text fed to the embedding model: non-empty parts joined.
    fn embedding_input(extracted: &ExtractedContent, user_note: Option<&str>) -> String {
        [
            extracted.title.as_str(),
            extracted.content.as_str(),
            user_note.unwrap_or(""),
        ]
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
    }

    async fn embed(&self, input: &str) -> Result<Vector> {
        let vectors = self.embeddings.embed_texts(&[input.to_string()]).await?;
        vectors
            .into_iter()
            .next()
            .ok_or_else(|| Error::Embedding("Backend returned no vectors".to_string()))
    }

    /// Summarize with degradation: errors and empty outputs both become
    /// `None` so a flaky model cannot block capture.
    async fn summarize_degraded(&self, req: &SummarizeRequest) -> Option<String> {
        match self.summarizer.summarize(req).await {
            Ok(summary) => summary,
            Err(e) => {
                warn!(
                    subsystem = "capture",
                    component = "enrich",
                    error = %e,
                    "Summarization failed, continuing without summary"
                );
                None
            }
        }
    }

    /// Run the enrichment fan-out.
    ///
    /// With a precomputed summary the summarizer is skipped entirely and
    /// embedding + classification run in parallel. Without one,
    /// summarize-then-classify runs as one branch so the classifier can use
    /// the fresh summary, joined against the embedding branch.
    #[instrument(skip(self, extracted, user_note, precomputed_summary), fields(subsystem = "capture", component = "enrich", op = "enrich", user_id = %user_id, source_type = %extracted.source_type))]
    pub async fn enrich(
        &self,
        user_id: Uuid,
        extracted: &ExtractedContent,
        user_note: Option<&str>,
        precomputed_summary: Option<String>,
    ) -> Result<Enrichment> {
        let start = Instant::now();
        let input = Self::embedding_input(extracted, user_note);

        let classify_request = |summary: Option<String>| ClassifyRequest {
            user_id,
            title: extracted.title.clone(),
            content: extracted.content.clone(),
            summary,
            source_type: extracted.source_type,
            user_note: user_note.map(String::from),
        };

        let (summary, embedding, classification) = match precomputed_summary {
            Some(summary) => {
                let req = classify_request(Some(summary.clone()));
                let (embedding, classification) =
                    try_join!(self.embed(&input), self.classifier.classify(&req))?;
                (Some(summary), embedding, classification)
            }
            None => {
                let summarize_req = SummarizeRequest {
                    title: extracted.title.clone(),
                    content: extracted.content.clone(),
                    source_type: extracted.source_type,
                    user_note: user_note.map(String::from),
                };

                let summarize_classify = async {
                    let summary = self.summarize_degraded(&summarize_req).await;
                    let req = classify_request(summary.clone());
                    let classification = self.classifier.classify(&req).await?;
                    Ok::<_, Error>((summary, classification))
                };

                let (embedding, (summary, classification)) =
                    try_join!(self.embed(&input), summarize_classify)?;
                (summary, embedding, classification)
            }
        };

        debug!(
            duration_ms = start.elapsed().as_millis() as u64,
            has_summary = summary.is_some(),
            confidence = classification.confidence,
            "Enrichment complete"
        );

        Ok(Enrichment {
            summary,
            embedding,
            classification,
        })
    }
}
