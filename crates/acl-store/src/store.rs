//! Bucket store abstraction
//!
//! This module defines the contract every backend has to fulfil: set reads
//! (`get`, `union`), an optional batched union capability, and deferred
//! mutation batches (`begin` / `add` / `remove` / `del` / `end`).

use crate::bucket::Bucket;
use crate::error::StoreResult;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};

/// Set of string values stored under one `(bucket, key)`.
pub type ValueSet = HashSet<String>;

/// One deferred mutation inside a [`Batch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOp {
    /// Insert `values` into the set at `(bucket, key)`.
    Add {
        /// Target bucket
        bucket: Bucket,
        /// Target key
        key: String,
        /// Values to insert
        values: ValueSet,
    },

    /// Subtract `values` from the set at `(bucket, key)`.
    Remove {
        /// Target bucket
        bucket: Bucket,
        /// Target key
        key: String,
        /// Values to subtract
        values: ValueSet,
    },

    /// Delete every key in `keys` from `bucket`.
    Del {
        /// Target bucket
        bucket: Bucket,
        /// Keys to delete
        keys: ValueSet,
    },
}

/// A mutation batch opened by [`BucketStore::begin`].
///
/// A batch is only a queue of operations. It carries no isolation: nothing
/// is visible to readers until [`BucketStore::end`] runs, and `end` may apply
/// a prefix of the queue before failing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Batch {
    ops: Vec<BatchOp>,
}

impl Batch {
    /// Create an empty batch.
    pub fn new() -> Self {
        Self { ops: Vec::new() }
    }

    /// Queue a set insert.
    pub fn add(&mut self, bucket: Bucket, key: impl Into<String>, values: ValueSet) {
        self.ops.push(BatchOp::Add {
            bucket,
            key: key.into(),
            values,
        });
    }

    /// Queue a set subtraction.
    pub fn remove(&mut self, bucket: Bucket, key: impl Into<String>, values: ValueSet) {
        self.ops.push(BatchOp::Remove {
            bucket,
            key: key.into(),
            values,
        });
    }

    /// Queue a full-key delete.
    pub fn del(&mut self, bucket: Bucket, keys: ValueSet) {
        self.ops.push(BatchOp::Del { bucket, keys });
    }

    /// Queued operations in insertion order.
    pub fn ops(&self) -> &[BatchOp] {
        &self.ops
    }

    /// Consume the batch, returning its operations.
    pub fn into_ops(self) -> Vec<BatchOp> {
        self.ops
    }

    /// Number of queued operations.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Check if nothing has been queued.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// Multi-valued set store keyed by `(bucket, key)`.
///
/// Reads of an absent key return an empty set. Mutations are queued on a
/// [`Batch`] and executed by [`end`](BucketStore::end); backends attempt every
/// queued operation but give no all-or-nothing guarantee.
#[async_trait]
pub trait BucketStore: Send + Sync {
    /// All values stored at `key`, or an empty set.
    async fn get(&self, bucket: &Bucket, key: &str) -> StoreResult<ValueSet>;

    /// Union of the values stored at every key in `keys`.
    async fn union(&self, bucket: &Bucket, keys: &ValueSet) -> StoreResult<ValueSet>;

    /// Execute every operation queued on `batch`.
    async fn end(&self, batch: Batch) -> StoreResult<()>;

    /// Batched union capability, if the backend offers one.
    fn multi_union(&self) -> Option<&dyn MultiUnion> {
        None
    }

    /// Open a mutation batch.
    fn begin(&self) -> Batch {
        Batch::new()
    }

    /// Queue a set insert on `batch`.
    fn add(&self, batch: &mut Batch, bucket: Bucket, key: &str, values: ValueSet) {
        batch.add(bucket, key, values);
    }

    /// Queue a set subtraction on `batch`.
    fn remove(&self, batch: &mut Batch, bucket: Bucket, key: &str, values: ValueSet) {
        batch.remove(bucket, key, values);
    }

    /// Queue a full-key delete on `batch`.
    fn del(&self, batch: &mut Batch, bucket: Bucket, keys: ValueSet) {
        batch.del(bucket, keys);
    }
}

/// Optional capability: one union per bucket for a shared key set, computed
/// in a single round trip.
#[async_trait]
pub trait MultiUnion: Send + Sync {
    /// For every bucket in `buckets`, the union of the values at `keys`.
    ///
    /// Every requested bucket is present in the result, mapped to an empty
    /// set when none of the keys exist.
    async fn unions(
        &self,
        buckets: &[Bucket],
        keys: &ValueSet,
    ) -> StoreResult<HashMap<Bucket, ValueSet>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(values: &[&str]) -> ValueSet {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_batch_keeps_insertion_order() {
        let mut batch = Batch::new();
        assert!(batch.is_empty());

        batch.add(Bucket::Meta, "roles", set(&["admin"]));
        batch.remove(Bucket::Parents, "admin", set(&["guest"]));
        batch.del(Bucket::Resources, set(&["admin"]));

        assert_eq!(batch.len(), 3);
        assert!(matches!(batch.ops()[0], BatchOp::Add { .. }));
        assert!(matches!(batch.ops()[1], BatchOp::Remove { .. }));
        assert!(matches!(batch.ops()[2], BatchOp::Del { .. }));
    }

    #[test]
    fn test_into_ops() {
        let mut batch = Batch::new();
        batch.add(Bucket::allows("blogs"), "admin", set(&["*"]));

        let ops = batch.into_ops();
        assert_eq!(
            ops,
            vec![BatchOp::Add {
                bucket: Bucket::allows("blogs"),
                key: "admin".to_string(),
                values: set(&["*"]),
            }]
        );
    }
}
