//! In-memory bucket store.
//!
//! Suitable for single-process applications and testing. Data lives in
//! nested maps behind a `tokio` read/write lock; empty sets are dropped so an
//! emptied key reads exactly like an absent one.

use crate::bucket::Bucket;
use crate::error::StoreResult;
use crate::store::{Batch, BatchOp, BucketStore, MultiUnion, ValueSet};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

type Buckets = HashMap<Bucket, HashMap<String, ValueSet>>;

/// In-memory [`BucketStore`] implementation.
///
/// Cloning is cheap and clones share the same data.
///
/// # Example
///
/// ```rust,no_run
/// use acl_store::{Bucket, BucketStore, MemoryStore};
///
/// async fn example() {
///     let store = MemoryStore::new();
///
///     let mut batch = store.begin();
///     store.add(&mut batch, Bucket::Users, "joe", ["admin".to_string()].into());
///     store.end(batch).await.unwrap();
///
///     let roles = store.get(&Bucket::Users, "joe").await.unwrap();
///     assert!(roles.contains("admin"));
/// }
/// ```
#[derive(Clone, Default)]
pub struct MemoryStore {
    buckets: Arc<RwLock<Buckets>>,
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore").finish_non_exhaustive()
    }
}

impl MemoryStore {
    /// Create an empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove all data.
    pub async fn clean(&self) {
        self.buckets.write().await.clear();
    }

    /// Number of non-empty keys in `bucket`.
    pub async fn key_count(&self, bucket: &Bucket) -> usize {
        self.buckets
            .read()
            .await
            .get(bucket)
            .map(|keys| keys.len())
            .unwrap_or(0)
    }

    fn union_in(buckets: &Buckets, bucket: &Bucket, keys: &ValueSet) -> ValueSet {
        let mut result = ValueSet::new();
        if let Some(entries) = buckets.get(bucket) {
            for key in keys {
                if let Some(values) = entries.get(key) {
                    result.extend(values.iter().cloned());
                }
            }
        }
        result
    }

    fn apply(buckets: &mut Buckets, op: BatchOp) {
        match op {
            BatchOp::Add {
                bucket,
                key,
                values,
            } => {
                if values.is_empty() {
                    return;
                }
                buckets
                    .entry(bucket)
                    .or_default()
                    .entry(key)
                    .or_default()
                    .extend(values);
            }
            BatchOp::Remove {
                bucket,
                key,
                values,
            } => {
                let Some(entries) = buckets.get_mut(&bucket) else {
                    return;
                };
                if let Some(current) = entries.get_mut(&key) {
                    current.retain(|v| !values.contains(v));
                    if current.is_empty() {
                        entries.remove(&key);
                    }
                }
                if entries.is_empty() {
                    buckets.remove(&bucket);
                }
            }
            BatchOp::Del { bucket, keys } => {
                let Some(entries) = buckets.get_mut(&bucket) else {
                    return;
                };
                for key in &keys {
                    entries.remove(key);
                }
                if entries.is_empty() {
                    buckets.remove(&bucket);
                }
            }
        }
    }
}

#[async_trait]
impl BucketStore for MemoryStore {
    async fn get(&self, bucket: &Bucket, key: &str) -> StoreResult<ValueSet> {
        let buckets = self.buckets.read().await;
        Ok(buckets
            .get(bucket)
            .and_then(|entries| entries.get(key))
            .cloned()
            .unwrap_or_default())
    }

    async fn union(&self, bucket: &Bucket, keys: &ValueSet) -> StoreResult<ValueSet> {
        let buckets = self.buckets.read().await;
        Ok(Self::union_in(&buckets, bucket, keys))
    }

    async fn end(&self, batch: Batch) -> StoreResult<()> {
        let ops = batch.into_ops();
        tracing::trace!(ops = ops.len(), "Applying batch to memory store");

        let mut buckets = self.buckets.write().await;
        for op in ops {
            Self::apply(&mut buckets, op);
        }
        Ok(())
    }

    fn multi_union(&self) -> Option<&dyn MultiUnion> {
        Some(self)
    }
}

#[async_trait]
impl MultiUnion for MemoryStore {
    async fn unions(
        &self,
        buckets: &[Bucket],
        keys: &ValueSet,
    ) -> StoreResult<HashMap<Bucket, ValueSet>> {
        let data = self.buckets.read().await;
        Ok(buckets
            .iter()
            .map(|bucket| (bucket.clone(), Self::union_in(&data, bucket, keys)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(values: &[&str]) -> ValueSet {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[tokio::test]
    async fn test_get_absent_key_is_empty() {
        let store = MemoryStore::new();
        let values = store.get(&Bucket::Users, "nobody").await.unwrap();
        assert!(values.is_empty());
    }

    #[tokio::test]
    async fn test_add_and_get() {
        let store = MemoryStore::new();

        let mut batch = store.begin();
        store.add(&mut batch, Bucket::Users, "joe", set(&["admin", "member"]));
        store.add(&mut batch, Bucket::Users, "joe", set(&["member", "guest"]));
        store.end(batch).await.unwrap();

        let roles = store.get(&Bucket::Users, "joe").await.unwrap();
        assert_eq!(roles, set(&["admin", "member", "guest"]));
    }

    #[tokio::test]
    async fn test_remove_prunes_empty_keys() {
        let store = MemoryStore::new();

        let mut batch = store.begin();
        store.add(&mut batch, Bucket::Parents, "child", set(&["a", "b"]));
        store.end(batch).await.unwrap();

        let mut batch = store.begin();
        store.remove(&mut batch, Bucket::Parents, "child", set(&["a"]));
        store.end(batch).await.unwrap();
        assert_eq!(store.get(&Bucket::Parents, "child").await.unwrap(), set(&["b"]));

        let mut batch = store.begin();
        store.remove(&mut batch, Bucket::Parents, "child", set(&["b"]));
        store.end(batch).await.unwrap();
        assert!(store.get(&Bucket::Parents, "child").await.unwrap().is_empty());
        assert_eq!(store.key_count(&Bucket::Parents).await, 0);
    }

    #[tokio::test]
    async fn test_del_multiple_keys() {
        let store = MemoryStore::new();

        let mut batch = store.begin();
        store.add(&mut batch, Bucket::allows("blogs"), "admin", set(&["*"]));
        store.add(&mut batch, Bucket::allows("blogs"), "editor", set(&["edit"]));
        store.add(&mut batch, Bucket::allows("blogs"), "guest", set(&["view"]));
        store.end(batch).await.unwrap();

        let mut batch = store.begin();
        store.del(&mut batch, Bucket::allows("blogs"), set(&["admin", "guest", "absent"]));
        store.end(batch).await.unwrap();

        assert_eq!(store.key_count(&Bucket::allows("blogs")).await, 1);
        assert_eq!(
            store.get(&Bucket::allows("blogs"), "editor").await.unwrap(),
            set(&["edit"])
        );
    }

    #[tokio::test]
    async fn test_union() {
        let store = MemoryStore::new();

        let mut batch = store.begin();
        store.add(&mut batch, Bucket::Parents, "a", set(&["x", "y"]));
        store.add(&mut batch, Bucket::Parents, "b", set(&["y", "z"]));
        store.end(batch).await.unwrap();

        let all = store
            .union(&Bucket::Parents, &set(&["a", "b", "c"]))
            .await
            .unwrap();
        assert_eq!(all, set(&["x", "y", "z"]));

        let none = store.union(&Bucket::Parents, &ValueSet::new()).await.unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_unions_reports_every_bucket() {
        let store = MemoryStore::new();

        let mut batch = store.begin();
        store.add(&mut batch, Bucket::allows("blogs"), "admin", set(&["edit"]));
        store.add(&mut batch, Bucket::allows("blogs"), "guest", set(&["view"]));
        store.end(batch).await.unwrap();

        let capability = store.multi_union().expect("memory store batches unions");
        let result = capability
            .unions(
                &[Bucket::allows("blogs"), Bucket::allows("forums")],
                &set(&["admin", "guest"]),
            )
            .await
            .unwrap();

        assert_eq!(result.len(), 2);
        assert_eq!(result[&Bucket::allows("blogs")], set(&["edit", "view"]));
        assert!(result[&Bucket::allows("forums")].is_empty());
    }

    #[tokio::test]
    async fn test_clones_share_data_and_clean() {
        let store = MemoryStore::new();
        let other = store.clone();

        let mut batch = store.begin();
        store.add(&mut batch, Bucket::Meta, "roles", set(&["admin"]));
        store.end(batch).await.unwrap();

        assert_eq!(other.get(&Bucket::Meta, "roles").await.unwrap(), set(&["admin"]));

        other.clean().await;
        assert!(store.get(&Bucket::Meta, "roles").await.unwrap().is_empty());
    }
}
