//! Confidence-gated bucket resolution.
//!
//! The classifier's candidate bucket never files a note by itself. Above the
//! threshold it becomes a suggestion attached to the note; below it the
//! confidence is still recorded for observability but no suggestion is made.
//! `bucket_id` stays empty and `is_classified` stays false until a human
//! confirms, whatever the confidence.

use uuid::Uuid;

use paramind_core::defaults::SUGGEST_CONFIDENCE_THRESHOLD;
use paramind_core::ClassifyResult;

/// Outcome of applying the confidence gate to a classification.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BucketResolution {
    /// No usable candidate: none proposed, or confidence below threshold.
    NoSuggestion { confidence: f32 },
    /// A candidate bucket worth surfacing to the user.
    Suggested { bucket_id: Uuid, confidence: f32 },
}

impl BucketResolution {
    /// The bucket to store in `ai_suggested_bucket`, if any.
    pub fn suggested_bucket(&self) -> Option<Uuid> {
        match self {
            BucketResolution::Suggested { bucket_id, .. } => Some(*bucket_id),
            BucketResolution::NoSuggestion { .. } => None,
        }
    }

    /// The confidence recorded on the note either way.
    pub fn confidence(&self) -> f32 {
        match self {
            BucketResolution::Suggested { confidence, .. }
            | BucketResolution::NoSuggestion { confidence } => *confidence,
        }
    }
}

/// Apply the confidence gate to a classification result.
pub fn resolve(classification: &ClassifyResult) -> BucketResolution {
    let confidence = classification.confidence;
    match classification.bucket_id {
        Some(bucket_id) if confidence >= SUGGEST_CONFIDENCE_THRESHOLD => {
            BucketResolution::Suggested {
                bucket_id,
                confidence,
            }
        }
        _ => BucketResolution::NoSuggestion { confidence },
    }
}

/// Whether a new-bucket proposal clears the same gate.
pub fn new_bucket_gate(classification: &ClassifyResult) -> bool {
    classification.suggest_new_bucket.is_some()
        && classification.confidence >= SUGGEST_CONFIDENCE_THRESHOLD
}
