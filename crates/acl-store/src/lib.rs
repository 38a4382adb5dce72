//! # ACL Store
//!
//! This crate provides the storage contract for the bucket ACL engine,
//! together with the bundled backends.
//!
//! ## Overview
//!
//! All access-control state lives in a multi-valued set store keyed by
//! `(bucket, key)`:
//! - **Reads**: `get` one key, `union` several keys of one bucket
//! - **Batched unions** (optional): one union per bucket in a single round trip
//! - **Mutations**: `add`, `remove` and `del` queued on a [`Batch`] and
//!   executed by `end`
//!
//! Batches are not transactions. A backend attempts every queued operation
//! and may fail part way; callers must not assume rollback.
//!
//! ## Features
//!
//! - `memory` (default): in-memory store for single-process apps and tests
//! - `redis`: Redis-backed store, one Redis set per key
//!
//! ## Usage
//!
//! ```rust,no_run
//! use acl_store::{Bucket, BucketStore, MemoryStore, ValueSet};
//!
//! async fn example() {
//!     let store = MemoryStore::new();
//!
//!     let mut batch = store.begin();
//!     store.add(&mut batch, Bucket::Parents, "editor", ValueSet::from(["guest".to_string()]));
//!     store.end(batch).await.unwrap();
//!
//!     let parents = store.get(&Bucket::Parents, "editor").await.unwrap();
//!     assert!(parents.contains("guest"));
//! }
//! ```

pub mod bucket;
pub mod error;
pub mod store;

#[cfg(feature = "memory")]
pub mod memory;

#[cfg(feature = "redis")]
pub mod redis;

// Re-export main types
pub use bucket::{Bucket, BucketNames, META_ROLES_KEY, META_USERS_KEY};
pub use error::{StoreError, StoreResult};
pub use store::{Batch, BatchOp, BucketStore, MultiUnion, ValueSet};

#[cfg(feature = "memory")]
pub use memory::MemoryStore;

#[cfg(feature = "redis")]
pub use crate::redis::{RedisStore, RedisStoreConfig};
