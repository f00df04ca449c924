//! In-memory repository implementations for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use paramind_core::{
    BucketNoteCount, BucketRepository, ConnectionRepository, CreateBucketRequest,
    CreateNoteOutcome, CreateNoteRequest, Error, ExtractedContent, Note, NoteRepository,
    ParaBucket, Result, SimilarNote, SourceType, Suggestion, SuggestionKind,
    SuggestionRepository, Vector,
};

// =============================================================================
// NOTES
// =============================================================================

#[derive(Default)]
pub struct InMemoryNoteRepository {
    notes: Mutex<HashMap<Uuid, Note>>,
    similar: Mutex<Vec<SimilarNote>>,
    /// When set, the next create reports a storage-level conflict against
    /// this note, simulating a lost insert race.
    race_winner: Mutex<Option<Note>>,
}

impl InMemoryNoteRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_raw(&self, note: Note) {
        self.notes.lock().unwrap().insert(note.id, note);
    }

    pub fn get(&self, id: Uuid) -> Option<Note> {
        self.notes.lock().unwrap().get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.notes.lock().unwrap().len()
    }

    /// Backdate a note's capture time, for window tests.
    pub fn set_captured_at(&self, id: Uuid, captured_at: DateTime<Utc>) {
        if let Some(note) = self.notes.lock().unwrap().get_mut(&id) {
            note.captured_at = captured_at;
        }
    }

    /// Script the similarity results returned by `find_similar`.
    pub fn set_similar(&self, results: Vec<SimilarNote>) {
        *self.similar.lock().unwrap() = results;
    }

    /// Arm the simulated insert race.
    pub fn inject_race_winner(&self, note: Note) {
        *self.race_winner.lock().unwrap() = Some(note);
    }
}

#[async_trait]
impl NoteRepository for InMemoryNoteRepository {
    async fn create(&self, req: CreateNoteRequest) -> Result<CreateNoteOutcome> {
        if let Some(winner) = self.race_winner.lock().unwrap().take() {
            return Ok(CreateNoteOutcome {
                note: winner,
                already_existed: true,
            });
        }

        if let Some(url) = &req.source_url {
            let notes = self.notes.lock().unwrap();
            if let Some(existing) = notes
                .values()
                .find(|n| n.user_id == req.user_id && n.source_url.as_deref() == Some(url))
            {
                return Ok(CreateNoteOutcome {
                    note: existing.clone(),
                    already_existed: true,
                });
            }
        }

        let note = Note {
            id: Uuid::now_v7(),
            user_id: req.user_id,
            title: req.title,
            content: req.content,
            summary: req.summary,
            source_type: req.source_type,
            source: req.source,
            source_url: req.source_url,
            caption: req.caption,
            bucket_id: None,
            ai_suggested_bucket: req.ai_suggested_bucket,
            ai_confidence: req.ai_confidence,
            is_classified: false,
            tags: req.tags,
            embedding: req.embedding,
            content_hash: req.content_hash,
            captured_at: Utc::now(),
            view_count: 0,
            connection_count: 0,
            distilled_at: None,
            distillation: None,
        };
        self.notes.lock().unwrap().insert(note.id, note.clone());
        Ok(CreateNoteOutcome {
            note,
            already_existed: false,
        })
    }

    async fn fetch(&self, id: Uuid) -> Result<Note> {
        self.get(id).ok_or(Error::NoteNotFound(id))
    }

    async fn find_by_source_url(&self, user_id: Uuid, url: &str) -> Result<Option<Note>> {
        let notes = self.notes.lock().unwrap();
        Ok(notes
            .values()
            .find(|n| n.user_id == user_id && n.source_url.as_deref() == Some(url))
            .cloned())
    }

    async fn find_by_content_hash(
        &self,
        user_id: Uuid,
        hash: &str,
        window_minutes: i64,
    ) -> Result<Option<Note>> {
        let cutoff = Utc::now() - Duration::minutes(window_minutes);
        let notes = self.notes.lock().unwrap();
        Ok(notes
            .values()
            .find(|n| {
                n.user_id == user_id
                    && n.content_hash.as_deref() == Some(hash)
                    && n.captured_at >= cutoff
            })
            .cloned())
    }

    async fn assign_bucket(&self, note_id: Uuid, bucket_id: Uuid) -> Result<()> {
        let mut notes = self.notes.lock().unwrap();
        let note = notes.get_mut(&note_id).ok_or(Error::NoteNotFound(note_id))?;
        note.bucket_id = Some(bucket_id);
        note.is_classified = true;
        Ok(())
    }

    async fn clear_bucket(&self, note_id: Uuid) -> Result<()> {
        let mut notes = self.notes.lock().unwrap();
        let note = notes.get_mut(&note_id).ok_or(Error::NoteNotFound(note_id))?;
        note.bucket_id = None;
        note.is_classified = false;
        Ok(())
    }

    async fn increment_view_count(&self, id: Uuid) -> Result<()> {
        let mut notes = self.notes.lock().unwrap();
        let note = notes.get_mut(&id).ok_or(Error::NoteNotFound(id))?;
        note.view_count += 1;
        Ok(())
    }

    async fn inbox_count(&self, user_id: Uuid) -> Result<i64> {
        let notes = self.notes.lock().unwrap();
        Ok(notes
            .values()
            .filter(|n| n.user_id == user_id && n.bucket_id.is_none())
            .count() as i64)
    }

    async fn count_by_bucket(&self, user_id: Uuid) -> Result<Vec<BucketNoteCount>> {
        let notes = self.notes.lock().unwrap();
        let mut counts: HashMap<Option<Uuid>, i64> = HashMap::new();
        for note in notes.values().filter(|n| n.user_id == user_id) {
            *counts.entry(note.bucket_id).or_insert(0) += 1;
        }
        Ok(counts
            .into_iter()
            .map(|(bucket_id, count)| BucketNoteCount { bucket_id, count })
            .collect())
    }

    async fn find_similar(
        &self,
        _user_id: Uuid,
        _embedding: &Vector,
        limit: i64,
        exclude_note_id: Uuid,
    ) -> Result<Vec<SimilarNote>> {
        Ok(self
            .similar
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.note_id != exclude_note_id)
            .take(limit as usize)
            .cloned()
            .collect())
    }
}

// =============================================================================
// BUCKETS
// =============================================================================

#[derive(Default)]
pub struct InMemoryBucketRepository {
    buckets: Mutex<HashMap<Uuid, ParaBucket>>,
    list_calls: AtomicUsize,
}

impl InMemoryBucketRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_raw(&self, bucket: ParaBucket) {
        self.buckets.lock().unwrap().insert(bucket.id, bucket);
    }

    /// Number of times `list_active` has been called; a cache hit makes no
    /// store calls, so this counts rebuilds.
    pub fn list_call_count(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BucketRepository for InMemoryBucketRepository {
    async fn create(&self, req: CreateBucketRequest) -> Result<Uuid> {
        let bucket = ParaBucket {
            id: Uuid::now_v7(),
            user_id: req.user_id,
            name: req.name,
            bucket_type: req.bucket_type,
            parent_id: req.parent_id,
            sort_order: req.sort_order,
            active: true,
            created_at: Utc::now(),
        };
        let id = bucket.id;
        self.buckets.lock().unwrap().insert(id, bucket);
        Ok(id)
    }

    async fn get(&self, id: Uuid) -> Result<Option<ParaBucket>> {
        Ok(self.buckets.lock().unwrap().get(&id).cloned())
    }

    async fn list_active(&self, user_id: Uuid) -> Result<Vec<ParaBucket>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let buckets = self.buckets.lock().unwrap();
        let mut result: Vec<ParaBucket> = buckets
            .values()
            .filter(|b| b.user_id == user_id && b.active)
            .cloned()
            .collect();
        result.sort_by_key(|b| (b.sort_order, b.created_at));
        Ok(result)
    }

    async fn rename(&self, id: Uuid, name: &str) -> Result<()> {
        let mut buckets = self.buckets.lock().unwrap();
        let bucket = buckets.get_mut(&id).ok_or(Error::BucketNotFound(id))?;
        bucket.name = name.to_string();
        Ok(())
    }

    async fn move_bucket(&self, id: Uuid, new_parent_id: Option<Uuid>) -> Result<()> {
        let mut buckets = self.buckets.lock().unwrap();
        let bucket = buckets.get_mut(&id).ok_or(Error::BucketNotFound(id))?;
        bucket.parent_id = new_parent_id;
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let mut buckets = self.buckets.lock().unwrap();
        buckets.remove(&id).ok_or(Error::BucketNotFound(id))?;
        for bucket in buckets.values_mut() {
            if bucket.parent_id == Some(id) {
                bucket.parent_id = None;
            }
        }
        Ok(())
    }
}

// =============================================================================
// SUGGESTIONS
// =============================================================================

#[derive(Default)]
pub struct InMemorySuggestionRepository {
    suggestions: Mutex<Vec<Suggestion>>,
    fail: AtomicBool,
}

impl InMemorySuggestionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn all(&self) -> Vec<Suggestion> {
        self.suggestions.lock().unwrap().clone()
    }

    pub fn count_of_kind(&self, kind: SuggestionKind) -> usize {
        self.suggestions
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.kind == kind)
            .count()
    }
}

#[async_trait]
impl SuggestionRepository for InMemorySuggestionRepository {
    async fn create(
        &self,
        user_id: Uuid,
        kind: SuggestionKind,
        payload: JsonValue,
    ) -> Result<Uuid> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::Internal("Injected suggestion failure".to_string()));
        }
        let suggestion = Suggestion {
            id: Uuid::now_v7(),
            user_id,
            kind,
            payload,
            status: "pending".to_string(),
            created_at: Utc::now(),
        };
        let id = suggestion.id;
        self.suggestions.lock().unwrap().push(suggestion);
        Ok(id)
    }

    async fn list_pending(&self, user_id: Uuid) -> Result<Vec<Suggestion>> {
        Ok(self
            .suggestions
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.user_id == user_id && s.status == "pending")
            .cloned()
            .collect())
    }

    async fn has_pending(&self, user_id: Uuid, kind: SuggestionKind) -> Result<bool> {
        Ok(self
            .suggestions
            .lock()
            .unwrap()
            .iter()
            .any(|s| s.user_id == user_id && s.kind == kind && s.status == "pending"))
    }

    async fn resolve(&self, id: Uuid, status: &str) -> Result<()> {
        let mut suggestions = self.suggestions.lock().unwrap();
        let suggestion = suggestions
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| Error::NotFound(format!("Suggestion {}", id)))?;
        suggestion.status = status.to_string();
        Ok(())
    }
}

// =============================================================================
// CONNECTIONS
// =============================================================================

#[derive(Default)]
pub struct InMemoryConnectionRepository {
    pairs: Mutex<Vec<(Uuid, Uuid, f32)>>,
    fail: AtomicBool,
}

impl InMemoryConnectionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn pair_count(&self) -> usize {
        self.pairs.lock().unwrap().len()
    }
}

#[async_trait]
impl ConnectionRepository for InMemoryConnectionRepository {
    async fn create_reciprocal(
        &self,
        note_a: Uuid,
        note_b: Uuid,
        _kind: &str,
        score: f32,
    ) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::Internal("Injected connection failure".to_string()));
        }
        self.pairs.lock().unwrap().push((note_a, note_b, score));
        Ok(())
    }

    async fn count_for_note(&self, note_id: Uuid) -> Result<i64> {
        Ok(self
            .pairs
            .lock()
            .unwrap()
            .iter()
            .filter(|(a, b, _)| *a == note_id || *b == note_id)
            .count() as i64)
    }

    async fn delete_for_note(&self, note_id: Uuid) -> Result<()> {
        self.pairs
            .lock()
            .unwrap()
            .retain(|(a, b, _)| *a != note_id && *b != note_id);
        Ok(())
    }
}

// =============================================================================
// FIXTURES
// =============================================================================

pub fn article(url: &str, title: &str, content: &str) -> ExtractedContent {
    ExtractedContent {
        title: title.to_string(),
        content: content.to_string(),
        source_type: SourceType::Article,
        source: serde_json::json!({ "url": url }),
        media_urls: vec![],
    }
}

pub fn thought(content: &str) -> ExtractedContent {
    ExtractedContent {
        title: "Thought".to_string(),
        content: content.to_string(),
        source_type: SourceType::Thought,
        source: serde_json::json!({}),
        media_urls: vec![],
    }
}
