//! PARA tree cache.
//!
//! Per-user, TTL-bounded cache of the bucket hierarchy with aggregated note
//! counts and derived slash-joined paths. Rebuilds are pure functions of
//! store state, so racing rebuilds do duplicate idempotent work rather than
//! corrupt anything; the write lock is held only for the entry swap, never
//! across store calls. Callers must `invalidate` after any bucket mutation.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use paramind_core::defaults::PARA_CACHE_TTL_SECS;
use paramind_core::{
    BucketRepository, Error, NoteRepository, ParaBucket, ParaTreeNode, Result,
};

use crate::clock::Clock;

#[derive(Debug, Clone)]
struct CacheEntry {
    built_at: DateTime<Utc>,
    roots: Vec<ParaTreeNode>,
    paths: HashMap<Uuid, String>,
    buckets: Vec<ParaBucket>,
}

/// Cached, aggregated view of a user's PARA hierarchy.
pub struct ParaTreeCache {
    buckets: Arc<dyn BucketRepository>,
    notes: Arc<dyn NoteRepository>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    entries: RwLock<HashMap<Uuid, CacheEntry>>,
}

impl ParaTreeCache {
    pub fn new(
        buckets: Arc<dyn BucketRepository>,
        notes: Arc<dyn NoteRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            buckets,
            notes,
            clock,
            ttl: Duration::seconds(PARA_CACHE_TTL_SECS as i64),
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Override the TTL (seconds).
    pub fn with_ttl_secs(mut self, secs: i64) -> Self {
        self.ttl = Duration::seconds(secs);
        self
    }

    /// The user's root tree nodes with aggregated note counts.
    pub async fn get_tree(&self, user_id: Uuid) -> Result<Vec<ParaTreeNode>> {
        Ok(self.entry(user_id).await?.roots)
    }

    /// Slash-joined ancestor path for a bucket (`Root/Work/Deep`), or None
    /// for an unknown bucket.
    pub async fn get_path(&self, user_id: Uuid, bucket_id: Uuid) -> Result<Option<String>> {
        Ok(self.entry(user_id).await?.paths.get(&bucket_id).cloned())
    }

    /// The flat active bucket list backing the current tree.
    pub async fn get_all_buckets(&self, user_id: Uuid) -> Result<Vec<ParaBucket>> {
        Ok(self.entry(user_id).await?.buckets)
    }

    /// Drop the user's cached entry. The next read rebuilds.
    pub async fn invalidate(&self, user_id: Uuid) {
        let removed = self.entries.write().await.remove(&user_id).is_some();
        debug!(
            subsystem = "cache",
            component = "para_tree",
            user_id = %user_id,
            removed,
            "Cache invalidated"
        );
    }

    async fn entry(&self, user_id: Uuid) -> Result<CacheEntry> {
        let now = self.clock.now();

        {
            let entries = self.entries.read().await;
            if let Some(entry) = entries.get(&user_id) {
                if now - entry.built_at < self.ttl {
                    return Ok(entry.clone());
                }
            }
        }

        // Rebuild outside any lock. A concurrent rebuild for the same user
        // just wastes a little work; last writer wins with equivalent data.
        let entry = self.rebuild(user_id, now).await?;
        self.entries.write().await.insert(user_id, entry.clone());
        Ok(entry)
    }

    #[instrument(skip(self), fields(subsystem = "cache", component = "para_tree", op = "rebuild", user_id = %user_id))]
    async fn rebuild(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<CacheEntry> {
        let start = Instant::now();

        let buckets = self.buckets.list_active(user_id).await?;
        let counts = self.notes.count_by_bucket(user_id).await?;

        let direct: HashMap<Uuid, i64> = counts
            .into_iter()
            .filter_map(|c| c.bucket_id.map(|id| (id, c.count)))
            .collect();

        let (roots, paths) = build_tree(&buckets, &direct)?;

        info!(
            bucket_count = buckets.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "PARA tree rebuilt"
        );

        Ok(CacheEntry {
            built_at: now,
            roots,
            paths,
            buckets,
        })
    }
}

/// Build the materialized tree and the path map from a flat bucket list.
///
/// Arena of indices rather than nested ownership: parent pointers that form
/// a cycle would otherwise recurse without bound. Unreachable nodes (only
/// possible under a cycle, since each bucket has at most one parent) are
/// rejected; a parent id pointing at a missing bucket degrades the node to a
/// root.
fn build_tree(
    buckets: &[ParaBucket],
    direct: &HashMap<Uuid, i64>,
) -> Result<(Vec<ParaTreeNode>, HashMap<Uuid, String>)> {
    let n = buckets.len();
    let index: HashMap<Uuid, usize> = buckets.iter().enumerate().map(|(i, b)| (b.id, i)).collect();

    let mut parent: Vec<Option<usize>> = Vec::with_capacity(n);
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut root_indices: Vec<usize> = Vec::new();

    for (i, bucket) in buckets.iter().enumerate() {
        let parent_idx = match bucket.parent_id {
            None => None,
            Some(pid) => match index.get(&pid) {
                Some(&p) => Some(p),
                None => {
                    warn!(
                        bucket_id = %bucket.id,
                        missing_parent = %pid,
                        "Bucket parent not in active set, treating as root"
                    );
                    None
                }
            },
        };
        parent.push(parent_idx);
        match parent_idx {
            Some(p) => children[p].push(i),
            None => root_indices.push(i),
        }
    }

    // Preorder walk from the roots. Each node has at most one parent, so a
    // node left unvisited can only sit on a cycle.
    let mut order: Vec<usize> = Vec::with_capacity(n);
    let mut stack: Vec<usize> = root_indices.clone();
    while let Some(i) = stack.pop() {
        order.push(i);
        for &c in &children[i] {
            stack.push(c);
        }
    }
    if order.len() != n {
        return Err(Error::Internal(
            "Bucket hierarchy contains a parent cycle".to_string(),
        ));
    }

    // Post-order count aggregation: children before parents.
    let mut totals: Vec<i64> = buckets
        .iter()
        .map(|b| direct.get(&b.id).copied().unwrap_or(0))
        .collect();
    for &i in order.iter().rev() {
        if let Some(p) = parent[i] {
            totals[p] += totals[i];
        }
    }

    // Materialize nodes children-first so each parent can take ownership of
    // its finished children.
    let mut nodes: Vec<Option<ParaTreeNode>> = (0..n).map(|_| None).collect();
    for &i in order.iter().rev() {
        let bucket = &buckets[i];
        let mut child_nodes: Vec<ParaTreeNode> = Vec::with_capacity(children[i].len());
        for &c in &children[i] {
            if let Some(node) = nodes[c].take() {
                child_nodes.push(node);
            }
        }
        child_nodes.sort_by_key(|c| c.sort_order);

        nodes[i] = Some(ParaTreeNode {
            id: bucket.id,
            name: bucket.name.clone(),
            bucket_type: bucket.bucket_type,
            parent_id: bucket.parent_id,
            sort_order: bucket.sort_order,
            note_count: totals[i],
            children: child_nodes,
        });
    }

    let mut roots: Vec<ParaTreeNode> = root_indices
        .iter()
        .filter_map(|&i| nodes[i].take())
        .collect();
    roots.sort_by_key(|r| r.sort_order);

    // Path map: walk parent pointers root-ward, bounded by the arena size.
    let mut paths: HashMap<Uuid, String> = HashMap::with_capacity(n);
    for (i, bucket) in buckets.iter().enumerate() {
        let mut names: Vec<&str> = vec![bucket.name.as_str()];
        let mut cursor = parent[i];
        let mut steps = 0;
        while let Some(p) = cursor {
            names.push(buckets[p].name.as_str());
            cursor = parent[p];
            steps += 1;
            if steps > n {
                return Err(Error::Internal(
                    "Bucket path walk exceeded hierarchy size".to_string(),
                ));
            }
        }
        names.reverse();
        paths.insert(bucket.id, names.join("/"));
    }

    Ok((roots, paths))
}

#[cfg(test)]
mod tests {
    use super::*;
    use paramind_core::ParaBucketType;

    fn bucket(id: Uuid, name: &str, parent_id: Option<Uuid>, sort_order: i32) -> ParaBucket {
        ParaBucket {
            id,
            user_id: Uuid::nil(),
            name: name.to_string(),
            bucket_type: ParaBucketType::Area,
            parent_id,
            sort_order,
            active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_note_counts_aggregate_recursively() {
        let root = Uuid::now_v7();
        let child = Uuid::now_v7();
        let grandchild = Uuid::now_v7();
        let buckets = vec![
            bucket(root, "Root", None, 0),
            bucket(child, "Child", Some(root), 0),
            bucket(grandchild, "Grandchild", Some(child), 0),
        ];
        let direct = HashMap::from([(root, 3), (child, 2), (grandchild, 5)]);

        let (roots, _) = build_tree(&buckets, &direct).unwrap();
        assert_eq!(roots.len(), 1);
        assert_eq!(roots[0].note_count, 10);
        assert_eq!(roots[0].children[0].note_count, 7);
        assert_eq!(roots[0].children[0].children[0].note_count, 5);
    }

    #[test]
    fn test_paths_join_ancestors_with_slash() {
        let root = Uuid::now_v7();
        let work = Uuid::now_v7();
        let deep = Uuid::now_v7();
        let buckets = vec![
            bucket(root, "Root", None, 0),
            bucket(work, "Work", Some(root), 0),
            bucket(deep, "Deep", Some(work), 0),
        ];

        let (_, paths) = build_tree(&buckets, &HashMap::new()).unwrap();
        assert_eq!(paths[&deep], "Root/Work/Deep");
        assert_eq!(paths[&root], "Root");
    }

    #[test]
    fn test_cycle_is_rejected() {
        let a = Uuid::now_v7();
        let b = Uuid::now_v7();
        let buckets = vec![bucket(a, "A", Some(b), 0), bucket(b, "B", Some(a), 0)];

        let err = build_tree(&buckets, &HashMap::new()).unwrap_err();
        assert!(matches!(err, Error::Internal(_)));
    }

    #[test]
    fn test_orphan_parent_degrades_to_root() {
        let a = Uuid::now_v7();
        let missing = Uuid::now_v7();
        let buckets = vec![bucket(a, "A", Some(missing), 0)];

        let (roots, paths) = build_tree(&buckets, &HashMap::new()).unwrap();
        assert_eq!(roots.len(), 1);
        assert_eq!(paths[&a], "A");
    }

    #[test]
    fn test_children_sorted_by_sort_order() {
        let root = Uuid::now_v7();
        let second = Uuid::now_v7();
        let first = Uuid::now_v7();
        let buckets = vec![
            bucket(root, "Root", None, 0),
            bucket(second, "Second", Some(root), 5),
            bucket(first, "First", Some(root), 1),
        ];

        let (roots, _) = build_tree(&buckets, &HashMap::new()).unwrap();
        let names: Vec<&str> = roots[0].children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["First", "Second"]);
    }

    #[test]
    fn test_empty_forest() {
        let (roots, paths) = build_tree(&[], &HashMap::new()).unwrap();
        assert!(roots.is_empty());
        assert!(paths.is_empty());
    }
}
