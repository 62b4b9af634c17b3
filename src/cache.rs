//! # Task Log Cache
//!
//! Append-only progress logs per task identifier, kept on a shared
//! [`KeyValueStore`].
//!
//! ## Data Model
//!
//! ```text
//! <index>            SET   identifiers that have (or had) a log
//! <prefix><id>       LIST  status entries, oldest first
//! ```
//!
//! Every identifier with a non-empty log is a member of the index. The reverse
//! does not hold: when a log key expires the store removes the list but cannot
//! touch the index, so the identifier stays indexed with length 0 until
//! [`TaskLogCache::reap`] removes it. Every mutating operation other than
//! natural expiry changes the index and the logs in one atomic batch.
//!
//! ## TTL Renewal
//!
//! With `ttl > 0` a log's expiry is set when the log is created, and reset
//! on later pushes only with `ttl_renew_on_write`, and on reads only with
//! `ttl_renew_on_read`.
//!
//! The expiry update after a push is a second round trip, not part of the
//! push batch. Between the two, the new entry is durable while the previous
//! expiry (or none, for a new log) still applies; a concurrent reader of the
//! TTL or a reap in that window sees the stale state.
//!
//! ## Concurrency
//!
//! The cache holds no state besides its configuration and the store handle.
//! Concurrent callers are serialized only by the store's batch atomicity.
//! Nothing is retried; store errors reach the caller as produced.

use crate::config::TaskLogConfig;
use crate::error::{ConfigurationError, StoreError, TaskLogResult};
use crate::status::{self, Status};
use crate::store::{Batch, KeyValueStore};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};
use validator::Validate;

/// Task progress log over a shared key-value store
#[derive(Clone)]
pub struct TaskLogCache {
    store: Arc<dyn KeyValueStore>,
    config: TaskLogConfig,
}

impl std::fmt::Debug for TaskLogCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskLogCache")
            .field("store", &self.store.provider_name())
            .field("config", &self.config)
            .finish()
    }
}

impl TaskLogCache {
    /// Validate the configuration and bind it to a store handle
    ///
    /// No store access happens here; an invalid configuration fails before
    /// the store is touched.
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        config: TaskLogConfig,
    ) -> Result<Self, ConfigurationError> {
        config.validate()?;

        info!(
            provider = store.provider_name(),
            prefix = %config.prefix,
            index = %config.index,
            ttl = config.ttl,
            ttl_renew_on_write = config.ttl_renew_on_write,
            ttl_renew_on_read = config.ttl_renew_on_read,
            "Task log cache initialized"
        );

        Ok(Self { store, config })
    }

    pub fn config(&self) -> &TaskLogConfig {
        &self.config
    }

    /// Key holding the log for `identifier`
    pub fn log_key(&self, identifier: &str) -> String {
        format!("{}{}", self.config.prefix, identifier)
    }

    /// Key holding the index set
    pub fn index_key(&self) -> &str {
        &self.config.index
    }

    /// Length of every indexed log
    ///
    /// An identifier mapped to 0 has lost its log (expired or deleted
    /// concurrently) and is a reap candidate.
    pub async fn summary(&self) -> TaskLogResult<HashMap<String, u64>> {
        let identifiers = self.store.set_members(&self.config.index).await?;
        if identifiers.is_empty() {
            return Ok(HashMap::new());
        }

        let batch = identifiers
            .iter()
            .fold(Batch::new(), |batch, id| batch.list_length(self.log_key(id)));
        let lengths = self.store.exec(batch).await?;

        // Replies line up with the enumeration order; a missing or nil
        // reply means the log vanished in between
        let summary: HashMap<String, u64> = identifiers
            .into_iter()
            .enumerate()
            .map(|(position, id)| {
                let length = lengths.get(position).copied().flatten().unwrap_or(0);
                (id, length.max(0) as u64)
            })
            .collect();

        debug!(index = %self.config.index, entries = summary.len(), "Task log summary");
        Ok(summary)
    }

    /// Append a status, returning the log length right after this append
    pub async fn push(&self, identifier: &str, status: impl Into<Status>) -> TaskLogResult<u64> {
        let list_key = self.log_key(identifier);
        let entry = status::encode(&status.into());

        let replies = self
            .store
            .exec(
                Batch::new()
                    .set_add(&self.config.index, identifier)
                    .list_push(&list_key, entry),
            )
            .await?;

        let created = replies.first().copied().flatten().unwrap_or(0) > 0;
        let length = replies
            .get(1)
            .copied()
            .flatten()
            .ok_or_else(|| StoreError::MissingReply {
                command: "RPUSH",
                key: list_key.clone(),
            })?
            .max(0) as u64;

        if let Some(ttl) = self.config.ttl_seconds() {
            if created || self.config.ttl_renew_on_write {
                self.store.expire(&list_key, ttl).await?;
            }
        }

        debug!(key = %list_key, length = length, created = created, "Task log PUSH");
        Ok(length)
    }

    /// Serialize `status` to JSON and append it
    pub async fn push_structured<T: Serialize>(
        &self,
        identifier: &str,
        status: &T,
    ) -> TaskLogResult<u64> {
        self.push(identifier, Status::structured(status)?).await
    }

    /// Every entry of a log, oldest first
    pub async fn get(&self, identifier: &str) -> TaskLogResult<Vec<Status>> {
        self.get_range(identifier, 0, -1).await
    }

    /// Entries `from..=to` of a log; negative indices count from the end
    ///
    /// A missing log or an out-of-range window yields an empty vector.
    pub async fn get_range(
        &self,
        identifier: &str,
        from: isize,
        to: isize,
    ) -> TaskLogResult<Vec<Status>> {
        let list_key = self.log_key(identifier);

        // Renew before reading so a successful read leaves a full TTL
        if let Some(ttl) = self.config.ttl_seconds() {
            if self.config.ttl_renew_on_read {
                self.store.expire(&list_key, ttl).await?;
            }
        }

        let entries = self.store.list_range(&list_key, from, to).await?;
        debug!(key = %list_key, from = from, to = to, entries = entries.len(), "Task log GET");

        Ok(entries.into_iter().map(status::decode).collect())
    }

    /// Drop a log and its index membership together; a no-op when absent
    pub async fn delete(&self, identifier: &str) -> TaskLogResult<()> {
        let list_key = self.log_key(identifier);
        self.store
            .exec(
                Batch::new()
                    .set_remove(&self.config.index, vec![identifier.to_string()])
                    .delete(vec![list_key.clone()]),
            )
            .await?;

        debug!(key = %list_key, "Task log DEL");
        Ok(())
    }

    /// Remove index entries whose log is empty, returning the reaped identifiers
    ///
    /// Nothing is written when no identifier qualifies.
    pub async fn reap(&self) -> TaskLogResult<Vec<String>> {
        let mut empty: Vec<String> = self
            .summary()
            .await?
            .into_iter()
            .filter(|(_, length)| *length == 0)
            .map(|(id, _)| id)
            .collect();

        if empty.is_empty() {
            debug!(index = %self.config.index, "Task log reap found nothing to remove");
            return Ok(empty);
        }
        empty.sort();

        let keys = empty.iter().map(|id| self.log_key(id)).collect();
        self.store
            .exec(
                Batch::new()
                    .set_remove(&self.config.index, empty.clone())
                    .delete(keys),
            )
            .await?;

        info!(index = %self.config.index, reaped = empty.len(), "Reaped empty task logs");
        Ok(empty)
    }

    /// Check if the backing store is reachable
    pub async fn health_check(&self) -> TaskLogResult<bool> {
        Ok(self.store.health_check().await?)
    }
}
