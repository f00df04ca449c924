//! PARA tree cache tests with a manual clock and in-memory repositories.

mod helpers;

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use helpers::{InMemoryBucketRepository, InMemoryNoteRepository};
use paramind_capture::{Clock, ManualClock, ParaTreeCache};
use paramind_core::{CreateNoteRequest, NoteRepository, ParaBucket, ParaBucketType, SourceType};

fn bucket(user_id: Uuid, name: &str, parent_id: Option<Uuid>, sort_order: i32) -> ParaBucket {
    ParaBucket {
        id: Uuid::now_v7(),
        user_id,
        name: name.to_string(),
        bucket_type: ParaBucketType::Area,
        parent_id,
        sort_order,
        active: true,
        created_at: Utc::now(),
    }
}

async fn add_notes(notes: &InMemoryNoteRepository, user_id: Uuid, bucket_id: Uuid, count: usize) {
    for i in 0..count {
        let outcome = notes
            .create(CreateNoteRequest {
                user_id,
                title: format!("note {}", i),
                content: "body".to_string(),
                summary: None,
                source_type: SourceType::Thought,
                source: serde_json::json!({}),
                source_url: None,
                content_hash: None,
                caption: None,
                tags: vec![],
                embedding: None,
                ai_suggested_bucket: None,
                ai_confidence: None,
            })
            .await
            .unwrap();
        notes.assign_bucket(outcome.note.id, bucket_id).await.unwrap();
    }
}

struct Fixture {
    buckets: Arc<InMemoryBucketRepository>,
    notes: Arc<InMemoryNoteRepository>,
    clock: Arc<ManualClock>,
    cache: ParaTreeCache,
    user_id: Uuid,
}

impl Fixture {
    fn new() -> Self {
        let buckets = Arc::new(InMemoryBucketRepository::new());
        let notes = Arc::new(InMemoryNoteRepository::new());
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let cache = ParaTreeCache::new(buckets.clone(), notes.clone(), clock.clone());
        Self {
            buckets,
            notes,
            clock,
            cache,
            user_id: Uuid::now_v7(),
        }
    }
}

#[tokio::test]
async fn note_counts_roll_up_to_ancestors() {
    let f = Fixture::new();
    let root = bucket(f.user_id, "Root", None, 0);
    let child = bucket(f.user_id, "Child", Some(root.id), 0);
    let grandchild = bucket(f.user_id, "Grandchild", Some(child.id), 0);
    f.buckets.insert_raw(root.clone());
    f.buckets.insert_raw(child.clone());
    f.buckets.insert_raw(grandchild.clone());

    add_notes(&f.notes, f.user_id, root.id, 3).await;
    add_notes(&f.notes, f.user_id, child.id, 2).await;
    add_notes(&f.notes, f.user_id, grandchild.id, 5).await;

    let tree = f.cache.get_tree(f.user_id).await.unwrap();
    assert_eq!(tree.len(), 1);
    assert_eq!(tree[0].note_count, 10);
    assert_eq!(tree[0].children[0].note_count, 7);
    assert_eq!(tree[0].children[0].children[0].note_count, 5);
}

#[tokio::test]
async fn path_walks_ancestors_root_first() {
    let f = Fixture::new();
    let root = bucket(f.user_id, "Root", None, 0);
    let work = bucket(f.user_id, "Work", Some(root.id), 0);
    let deep = bucket(f.user_id, "Deep", Some(work.id), 0);
    f.buckets.insert_raw(root);
    f.buckets.insert_raw(work);
    f.buckets.insert_raw(deep.clone());

    let path = f.cache.get_path(f.user_id, deep.id).await.unwrap();
    assert_eq!(path.as_deref(), Some("Root/Work/Deep"));

    let missing = f.cache.get_path(f.user_id, Uuid::now_v7()).await.unwrap();
    assert_eq!(missing, None);
}

#[tokio::test]
async fn cached_entry_survives_until_ttl() {
    let f = Fixture::new();
    f.buckets.insert_raw(bucket(f.user_id, "Root", None, 0));

    f.cache.get_tree(f.user_id).await.unwrap();
    assert_eq!(f.buckets.list_call_count(), 1);

    // 4 minutes: still fresh, served from cache.
    f.clock.advance_secs(240);
    f.cache.get_tree(f.user_id).await.unwrap();
    assert_eq!(f.buckets.list_call_count(), 1);

    // 6 minutes total: expired, rebuilt.
    f.clock.advance_secs(120);
    f.cache.get_tree(f.user_id).await.unwrap();
    assert_eq!(f.buckets.list_call_count(), 2);
}

#[tokio::test]
async fn invalidate_forces_rebuild_within_ttl() {
    let f = Fixture::new();
    let root = bucket(f.user_id, "Old Name", None, 0);
    f.buckets.insert_raw(root.clone());

    let tree = f.cache.get_tree(f.user_id).await.unwrap();
    assert_eq!(tree[0].name, "Old Name");

    f.buckets.insert_raw(ParaBucket {
        name: "New Name".to_string(),
        ..root
    });

    // Without invalidation the stale name is still served.
    let tree = f.cache.get_tree(f.user_id).await.unwrap();
    assert_eq!(tree[0].name, "Old Name");

    f.cache.invalidate(f.user_id).await;
    let tree = f.cache.get_tree(f.user_id).await.unwrap();
    assert_eq!(tree[0].name, "New Name");
}

#[tokio::test]
async fn rename_propagates_to_descendant_paths_on_rebuild() {
    let f = Fixture::new();
    let root = bucket(f.user_id, "Root", None, 0);
    let deep = bucket(f.user_id, "Deep", Some(root.id), 0);
    f.buckets.insert_raw(root.clone());
    f.buckets.insert_raw(deep.clone());

    let path = f.cache.get_path(f.user_id, deep.id).await.unwrap();
    assert_eq!(path.as_deref(), Some("Root/Deep"));

    f.buckets.insert_raw(ParaBucket {
        name: "Renamed".to_string(),
        ..root
    });
    f.cache.invalidate(f.user_id).await;

    let path = f.cache.get_path(f.user_id, deep.id).await.unwrap();
    assert_eq!(path.as_deref(), Some("Renamed/Deep"));
}

#[tokio::test]
async fn users_are_cached_independently() {
    let f = Fixture::new();
    let other_user = Uuid::now_v7();
    f.buckets.insert_raw(bucket(f.user_id, "Mine", None, 0));
    f.buckets.insert_raw(bucket(other_user, "Theirs", None, 0));

    let mine = f.cache.get_tree(f.user_id).await.unwrap();
    let theirs = f.cache.get_tree(other_user).await.unwrap();
    assert_eq!(mine[0].name, "Mine");
    assert_eq!(theirs[0].name, "Theirs");

    // Invalidating one user leaves the other's entry untouched.
    f.cache.invalidate(f.user_id).await;
    let calls_before = f.buckets.list_call_count();
    f.cache.get_tree(other_user).await.unwrap();
    assert_eq!(f.buckets.list_call_count(), calls_before);
}

#[tokio::test]
async fn get_all_buckets_returns_flat_ordered_list() {
    let f = Fixture::new();
    f.buckets.insert_raw(bucket(f.user_id, "B", None, 2));
    f.buckets.insert_raw(bucket(f.user_id, "A", None, 1));

    let buckets = f.cache.get_all_buckets(f.user_id).await.unwrap();
    let names: Vec<&str> = buckets.iter().map(|b| b.name.as_str()).collect();
    assert_eq!(names, vec!["A", "B"]);
}

#[tokio::test]
async fn manual_clock_is_shared_with_cache() {
    // Guard against the fixture wiring drifting: the cache must observe the
    // same clock instance the test advances.
    let f = Fixture::new();
    let before = f.clock.now();
    f.clock.advance_secs(10);
    assert!(f.clock.now() > before);
}
