//! LLM-backed note summarization.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, instrument, warn};

use paramind_core::{GenerationBackend, Result, SourceType, Summarizer, SummarizeRequest};

const SYSTEM_PROMPT: &str = "You are a note-taking assistant. Summarize captured content in \
2-3 sentences that preserve the key claims and any actionable detail. Write in the third \
person, never address the reader, and do not begin with phrases like 'This article' or \
'The author'. Output only the summary text.";

/// Maximum content length fed into the prompt; longer content is truncated at
/// a char boundary to keep within typical context windows.
const MAX_CONTENT_CHARS: usize = 12_000;

/// Summarizer backed by a generation model.
pub struct LlmSummarizer {
    backend: Arc<dyn GenerationBackend>,
}

impl LlmSummarizer {
    pub fn new(backend: Arc<dyn GenerationBackend>) -> Self {
        Self { backend }
    }

    fn build_prompt(req: &SummarizeRequest) -> String {
        let content: String = req.content.chars().take(MAX_CONTENT_CHARS).collect();

        let mut prompt = format!(
            "Source type: {}\nTitle: {}\n\nContent:\n{}",
            req.source_type, req.title, content
        );

        if let Some(note) = &req.user_note {
            if !note.trim().is_empty() {
                prompt.push_str(&format!(
                    "\n\nThe user attached this note when capturing; weigh it when choosing \
                     what to keep: {}",
                    note
                ));
            }
        }

        prompt
    }
}

#[async_trait]
impl Summarizer for LlmSummarizer {
    #[instrument(skip(self, req), fields(subsystem = "inference", component = "summarize", op = "summarize", source_type = %req.source_type))]
    async fn summarize(&self, req: &SummarizeRequest) -> Result<Option<String>> {
        // Thoughts are already in the user's own words; short ones gain
        // nothing from a model pass.
        if req.source_type == SourceType::Thought && req.content.len() < 280 {
            debug!("Skipping summarization for short thought");
            return Ok(None);
        }

        let prompt = Self::build_prompt(req);
        let raw = self.backend.generate_with_system(SYSTEM_PROMPT, &prompt).await?;
        let trimmed = raw.trim();

        if trimmed.is_empty() {
            warn!("Summarizer produced empty output");
            return Ok(None);
        }

        Ok(Some(trimmed.to_string()))
    }
}
