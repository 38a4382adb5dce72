//! Redis-backed bucket store for distributed deployments.
//!
//! Every `(bucket, key)` pair is one Redis set named
//! `{prefix}_{bucket}@{key}`. Batches are sent as a single non-transactional
//! pipeline, so a failure can leave a prefix of the batch applied.

use crate::bucket::{Bucket, BucketNames};
use crate::error::{StoreError, StoreResult};
use crate::store::{Batch, BatchOp, BucketStore, MultiUnion, ValueSet};
use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Redis store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisStoreConfig {
    /// Redis connection URL (e.g., redis://localhost:6379).
    pub url: String,

    /// Prefix for all Redis keys (default: "acl").
    pub prefix: String,

    /// Bucket naming scheme.
    pub names: BucketNames,
}

impl Default for RedisStoreConfig {
    fn default() -> Self {
        Self {
            url: std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string()),
            prefix: std::env::var("ACL_REDIS_PREFIX").unwrap_or_else(|_| "acl".to_string()),
            names: BucketNames::from_env(),
        }
    }
}

impl RedisStoreConfig {
    /// Create a configuration for `url` with the default prefix and names.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            prefix: "acl".to_string(),
            names: BucketNames::default(),
        }
    }

    /// Set the key prefix.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Full Redis key for `(bucket, key)`.
    ///
    /// Neither the resource name nor the key is escaped. An `@` inside them
    /// can make two pairs share a key: resource `x` with key `y@r` and
    /// resource `x@y` with key `r` both map to `acl_allows_x@y@r`.
    ///
    /// # Arguments
    ///
    /// * `bucket` - Logical bucket
    /// * `key` - Key inside the bucket
    pub fn key_name(&self, bucket: &Bucket, key: &str) -> String {
        format!("{}_{}@{}", self.prefix, bucket.name(&self.names), key)
    }

    /// `SCAN` patterns matching every key this configuration can produce,
    /// one per bucket name.
    ///
    /// Patterns end with the `@` separator, so a deployment whose prefix
    /// merely starts with this one is not matched.
    pub fn clean_patterns(&self) -> Vec<String> {
        let names = &self.names;
        [
            &names.meta,
            &names.parents,
            &names.resources,
            &names.roles,
            &names.users,
        ]
        .into_iter()
        .map(|name| format!("{}_{}@*", self.prefix, name))
        .chain(std::iter::once(format!(
            "{}_{}*@*",
            self.prefix, names.allows_prefix
        )))
        .collect()
    }

    fn key_names<'a>(&self, bucket: &Bucket, keys: impl IntoIterator<Item = &'a String>) -> Vec<String> {
        keys.into_iter()
            .map(|key| self.key_name(bucket, key))
            .collect()
    }
}

/// Redis-backed [`BucketStore`].
///
/// # Example
///
/// ```rust,no_run
/// use acl_store::{RedisStore, RedisStoreConfig};
///
/// async fn example() -> Result<(), Box<dyn std::error::Error>> {
///     let store = RedisStore::connect(RedisStoreConfig::new("redis://localhost:6379")).await?;
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct RedisStore {
    /// Shared multiplexed connection
    conn: MultiplexedConnection,

    /// Configuration
    config: RedisStoreConfig,
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore")
            .field("config", &self.config)
            .finish()
    }
}

impl RedisStore {
    /// Open a connection and create the store.
    pub async fn connect(config: RedisStoreConfig) -> StoreResult<Self> {
        let client = Client::open(config.url.as_str())
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        let conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        tracing::info!(url = %config.url, prefix = %config.prefix, "Connected Redis bucket store");

        Ok(Self { conn, config })
    }

    /// Create with default configuration.
    pub async fn with_defaults() -> StoreResult<Self> {
        Self::connect(RedisStoreConfig::default()).await
    }

    /// Store configuration.
    pub fn config(&self) -> &RedisStoreConfig {
        &self.config
    }

    /// Delete every key of the configured buckets under the prefix.
    ///
    /// Keys are found with `SCAN`, one pattern per bucket name (see
    /// [`RedisStoreConfig::clean_patterns`]).
    pub async fn clean(&self) -> StoreResult<()> {
        let mut conn = self.conn.clone();
        let mut deleted = 0usize;

        for pattern in self.config.clean_patterns() {
            let keys: Vec<String> = {
                let mut iter = conn.scan_match::<_, String>(&pattern).await?;
                let mut keys = Vec::new();
                while let Some(key) = iter.next_item().await {
                    keys.push(key);
                }
                keys
            };

            if !keys.is_empty() {
                deleted += keys.len();
                conn.del::<_, ()>(keys).await?;
            }
        }

        tracing::debug!(prefix = %self.config.prefix, deleted, "Cleaned Redis bucket store");

        Ok(())
    }
}

#[async_trait]
impl BucketStore for RedisStore {
    async fn get(&self, bucket: &Bucket, key: &str) -> StoreResult<ValueSet> {
        let mut conn = self.conn.clone();
        let values: ValueSet = conn.smembers(self.config.key_name(bucket, key)).await?;
        Ok(values)
    }

    async fn union(&self, bucket: &Bucket, keys: &ValueSet) -> StoreResult<ValueSet> {
        if keys.is_empty() {
            return Ok(ValueSet::new());
        }

        let mut conn = self.conn.clone();
        let values: ValueSet = conn.sunion(self.config.key_names(bucket, keys)).await?;
        Ok(values)
    }

    async fn end(&self, batch: Batch) -> StoreResult<()> {
        let mut pipe = redis::pipe();
        let mut queued = 0usize;

        for op in batch.into_ops() {
            match op {
                BatchOp::Add {
                    bucket,
                    key,
                    values,
                } if !values.is_empty() => {
                    let members: Vec<String> = values.into_iter().collect();
                    pipe.sadd(self.config.key_name(&bucket, &key), members).ignore();
                    queued += 1;
                }
                BatchOp::Remove {
                    bucket,
                    key,
                    values,
                } if !values.is_empty() => {
                    let members: Vec<String> = values.into_iter().collect();
                    pipe.srem(self.config.key_name(&bucket, &key), members).ignore();
                    queued += 1;
                }
                BatchOp::Del { bucket, keys } if !keys.is_empty() => {
                    pipe.del(self.config.key_names(&bucket, &keys)).ignore();
                    queued += 1;
                }
                _ => {}
            }
        }

        if queued == 0 {
            return Ok(());
        }

        let mut conn = self.conn.clone();
        pipe.query_async::<_, ()>(&mut conn).await?;

        tracing::debug!(commands = queued, "Executed batch on Redis");

        Ok(())
    }

    fn multi_union(&self) -> Option<&dyn MultiUnion> {
        Some(self)
    }
}

#[async_trait]
impl MultiUnion for RedisStore {
    async fn unions(
        &self,
        buckets: &[Bucket],
        keys: &ValueSet,
    ) -> StoreResult<HashMap<Bucket, ValueSet>> {
        if keys.is_empty() || buckets.is_empty() {
            return Ok(buckets
                .iter()
                .map(|bucket| (bucket.clone(), ValueSet::new()))
                .collect());
        }

        let mut pipe = redis::pipe();
        for bucket in buckets {
            pipe.sunion(self.config.key_names(bucket, keys));
        }

        let mut conn = self.conn.clone();
        let results: Vec<ValueSet> = pipe.query_async(&mut conn).await?;

        if results.len() != buckets.len() {
            return Err(StoreError::Serialization(format!(
                "expected {} union replies, got {}",
                buckets.len(),
                results.len()
            )));
        }

        Ok(buckets.iter().cloned().zip(results).collect())
    }
}
