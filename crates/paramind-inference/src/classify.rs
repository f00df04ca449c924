//! LLM-backed PARA classification.
//!
//! The classifier maps captured content onto the user's existing bucket
//! hierarchy, or proposes a new bucket when nothing fits. The model is asked
//! for JSON with format enforcement; its output is validated here before any
//! caller sees it. A bucket id the model invents is dropped, and confidence
//! is clamped into [0, 1].

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use paramind_core::{
    BucketRepository, Classifier, ClassifyRequest, ClassifyResult, Error, GenerationBackend,
    NewBucketSuggestion, ParaBucketType, Result,
};

const SYSTEM_PROMPT: &str = "You are a PARA-method filing assistant. Given a captured note and \
the user's folder hierarchy, decide where it belongs. Respond with JSON only, using exactly \
these keys: bucket_id (string uuid or null), confidence (number 0-1), tags (array of 1-5 \
short lowercase strings), is_original_thought (boolean), new_bucket_name (string or null), \
new_bucket_parent_type (one of \"project\", \"area\", \"resource\", \"archive\", or null). \
Set new_bucket_name only when no existing folder is a reasonable fit.";

/// Maximum content length fed into the prompt.
const MAX_CONTENT_CHARS: usize = 8_000;

/// Raw model output before validation.
#[derive(Debug, Deserialize)]
struct RawClassification {
    bucket_id: Option<Uuid>,
    confidence: f32,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    is_original_thought: bool,
    new_bucket_name: Option<String>,
    new_bucket_parent_type: Option<String>,
}

/// Classifier backed by a generation model and the user's bucket hierarchy.
pub struct LlmClassifier {
    backend: Arc<dyn GenerationBackend>,
    buckets: Arc<dyn BucketRepository>,
}

impl LlmClassifier {
    pub fn new(backend: Arc<dyn GenerationBackend>, buckets: Arc<dyn BucketRepository>) -> Self {
        Self { backend, buckets }
    }

    fn build_prompt(req: &ClassifyRequest, bucket_lines: &str) -> String {
        let content: String = req.content.chars().take(MAX_CONTENT_CHARS).collect();

        let mut prompt = format!(
            "Folders (id | type | name):\n{}\n\nSource type: {}\nTitle: {}\n",
            bucket_lines, req.source_type, req.title
        );

        match &req.summary {
            Some(summary) => prompt.push_str(&format!("Summary: {}\n", summary)),
            None => prompt.push_str(&format!("Content:\n{}\n", content)),
        }

        if let Some(note) = &req.user_note {
            if !note.trim().is_empty() {
                prompt.push_str(&format!("User note: {}\n", note));
            }
        }

        prompt
    }

    fn validate(raw: RawClassification, known_ids: &HashSet<Uuid>) -> ClassifyResult {
        let bucket_id = match raw.bucket_id {
            Some(id) if known_ids.contains(&id) => Some(id),
            Some(id) => {
                warn!(bucket_id = %id, "Classifier returned unknown bucket id, dropping");
                None
            }
            None => None,
        };

        let suggest_new_bucket = match (raw.new_bucket_name, raw.new_bucket_parent_type) {
            (Some(name), parent) if !name.trim().is_empty() => {
                let parent_type = parent
                    .as_deref()
                    .and_then(|p| p.parse::<ParaBucketType>().ok())
                    .unwrap_or(ParaBucketType::Resource);
                Some(NewBucketSuggestion {
                    name: name.trim().to_string(),
                    parent_type,
                })
            }
            _ => None,
        };

        let tags = raw
            .tags
            .into_iter()
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .take(5)
            .collect();

        ClassifyResult {
            bucket_id,
            confidence: raw.confidence.clamp(0.0, 1.0),
            tags,
            is_original_thought: raw.is_original_thought,
            suggest_new_bucket,
        }
    }
}

#[async_trait]
impl Classifier for LlmClassifier {
    #[instrument(skip(self, req), fields(subsystem = "inference", component = "classify", op = "classify", user_id = %req.user_id))]
    async fn classify(&self, req: &ClassifyRequest) -> Result<ClassifyResult> {
        let buckets = self.buckets.list_active(req.user_id).await?;
        let known_ids: HashSet<Uuid> = buckets.iter().map(|b| b.id).collect();

        let bucket_lines = if buckets.is_empty() {
            "(none yet)".to_string()
        } else {
            buckets
                .iter()
                .map(|b| format!("{} | {} | {}", b.id, b.bucket_type, b.name))
                .collect::<Vec<_>>()
                .join("\n")
        };

        let prompt = Self::build_prompt(req, &bucket_lines);
        let raw_json = self
            .backend
            .generate_json_with_system(SYSTEM_PROMPT, &prompt)
            .await?;

        let raw: RawClassification = serde_json::from_str(raw_json.trim())
            .map_err(|e| Error::Inference(format!("Unparseable classification: {}", e)))?;

        let result = Self::validate(raw, &known_ids);
        debug!(
            confidence = result.confidence,
            has_bucket = result.bucket_id.is_some(),
            suggests_new = result.suggest_new_bucket.is_some(),
            "Classification complete"
        );
        Ok(result)
    }
}
