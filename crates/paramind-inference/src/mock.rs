//! Mock enrichment backend for deterministic testing.
//!
//! Implements the embedding, summarization, and classification seams against
//! scripted outputs, with per-operation failure switches and a call log for
//! assertions. Embeddings are deterministic hashes of the input text, so
//! equal text always embeds identically.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use paramind_core::{
    Classifier, ClassifyRequest, ClassifyResult, EmbeddingBackend, Error, Result, Summarizer,
    SummarizeRequest, Vector,
};

/// A recorded call against the mock.
#[derive(Debug, Clone)]
pub struct MockCall {
    pub operation: String,
    pub input: String,
}

#[derive(Debug)]
struct MockState {
    summary: Option<String>,
    classification: ClassifyResult,
}

/// Mock implementation of all three enrichment seams.
#[derive(Clone)]
pub struct MockEnrichment {
    dimension: usize,
    state: Arc<Mutex<MockState>>,
    call_log: Arc<Mutex<Vec<MockCall>>>,
    fail_embed: Arc<AtomicBool>,
    fail_summarize: Arc<AtomicBool>,
    fail_classify: Arc<AtomicBool>,
}

impl MockEnrichment {
    /// Create a mock with a neutral classification (no bucket, confidence 0).
    pub fn new() -> Self {
        Self {
            dimension: 768,
            state: Arc::new(Mutex::new(MockState {
                summary: Some("Mock summary".to_string()),
                classification: ClassifyResult {
                    bucket_id: None,
                    confidence: 0.0,
                    tags: vec![],
                    is_original_thought: false,
                    suggest_new_bucket: None,
                },
            })),
            call_log: Arc::new(Mutex::new(Vec::new())),
            fail_embed: Arc::new(AtomicBool::new(false)),
            fail_summarize: Arc::new(AtomicBool::new(false)),
            fail_classify: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Set the embedding dimension.
    pub fn with_dimension(mut self, dimension: usize) -> Self {
        self.dimension = dimension;
        self
    }

    /// Script the summarizer output (`None` simulates an unusable summary).
    pub fn with_summary(self, summary: Option<&str>) -> Self {
        self.state.lock().unwrap().summary = summary.map(String::from);
        self
    }

    /// Script the classification result.
    pub fn with_classification(self, classification: ClassifyResult) -> Self {
        self.state.lock().unwrap().classification = classification;
        self
    }

    /// Make embedding calls fail.
    pub fn fail_embedding(&self, fail: bool) {
        self.fail_embed.store(fail, Ordering::SeqCst);
    }

    /// Make summarization calls fail.
    pub fn fail_summarization(&self, fail: bool) {
        self.fail_summarize.store(fail, Ordering::SeqCst);
    }

    /// Make classification calls fail.
    pub fn fail_classification(&self, fail: bool) {
        self.fail_classify.store(fail, Ordering::SeqCst);
    }

    /// Re-script the classification after construction.
    pub fn set_classification(&self, classification: ClassifyResult) {
        self.state.lock().unwrap().classification = classification;
    }

    /// All logged calls.
    pub fn calls(&self) -> Vec<MockCall> {
        self.call_log.lock().unwrap().clone()
    }

    /// Number of calls for one operation.
    pub fn call_count(&self, operation: &str) -> usize {
        self.call_log
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.operation == operation)
            .count()
    }

    fn log_call(&self, operation: &str, input: &str) {
        self.call_log.lock().unwrap().push(MockCall {
            operation: operation.to_string(),
            input: input.to_string(),
        });
    }

    /// Deterministic unit-norm embedding derived from the text's hash.
    fn embed_one(&self, text: &str) -> Vector {
        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        let mut seed = hasher.finish();

        let mut values = Vec::with_capacity(self.dimension);
        for _ in 0..self.dimension {
            // xorshift keeps this dependency-free and stable across runs
            seed ^= seed << 13;
            seed ^= seed >> 7;
            seed ^= seed << 17;
            values.push((seed as f32 / u64::MAX as f32) - 0.5);
        }

        let norm: f32 = values.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut values {
                *v /= norm;
            }
        }
        Vector::from(values)
    }
}

impl Default for MockEnrichment {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingBackend for MockEnrichment {
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vector>> {
        for text in texts {
            self.log_call("embed", text);
        }
        if self.fail_embed.load(Ordering::SeqCst) {
            return Err(Error::Embedding("Mock embedding failure".to_string()));
        }
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        "mock-embed"
    }
}

#[async_trait]
impl Summarizer for MockEnrichment {
    async fn summarize(&self, req: &SummarizeRequest) -> Result<Option<String>> {
        self.log_call("summarize", &req.title);
        if self.fail_summarize.load(Ordering::SeqCst) {
            return Err(Error::Inference("Mock summarization failure".to_string()));
        }
        Ok(self.state.lock().unwrap().summary.clone())
    }
}

#[async_trait]
impl Classifier for MockEnrichment {
    async fn classify(&self, req: &ClassifyRequest) -> Result<ClassifyResult> {
        self.log_call("classify", &req.title);
        if self.fail_classify.load(Ordering::SeqCst) {
            return Err(Error::Inference("Mock classification failure".to_string()));
        }
        Ok(self.state.lock().unwrap().classification.clone())
    }
}
