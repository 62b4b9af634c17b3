//! Shared test helpers
//!
//! `RecordingStore` wraps a [`MemoryStore`] and records every store call so
//! tests can assert on round trips, not just on results.

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tasklog_cache::{
    Batch, BatchReply, Command, KeyValueStore, MemoryStore, StoreResult, TaskLogCache,
    TaskLogConfig,
};

/// One recorded store call
#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    Exec(Vec<Command>),
    SetMembers(String),
    ListRange(String, isize, isize),
    Expire(String, i64),
    TimeToLive(String),
    FlushAll,
    HealthCheck,
}

impl StoreCall {
    /// Whether the call can change stored data
    pub fn is_mutating(&self) -> bool {
        match self {
            StoreCall::Exec(commands) => commands
                .iter()
                .any(|command| !matches!(command, Command::ListLength { .. })),
            StoreCall::Expire(..) | StoreCall::FlushAll => true,
            _ => false,
        }
    }
}

#[derive(Debug, Default)]
struct RecordingState {
    calls: Vec<StoreCall>,
    drop_replies: usize,
}

/// Store wrapper recording calls against a shared in-memory keyspace
#[derive(Debug, Clone, Default)]
pub struct RecordingStore {
    inner: MemoryStore,
    state: Arc<Mutex<RecordingState>>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Underlying store, for arranging state without recording it
    pub fn inner(&self) -> &MemoryStore {
        &self.inner
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    /// Truncate the reply of the next batch by `count` entries
    pub fn drop_trailing_replies(&self, count: usize) {
        self.state.lock().unwrap().drop_replies = count;
    }

    fn record(&self, call: StoreCall) {
        self.state.lock().unwrap().calls.push(call);
    }
}

#[async_trait]
impl KeyValueStore for RecordingStore {
    async fn exec(&self, batch: Batch) -> StoreResult<BatchReply> {
        self.record(StoreCall::Exec(batch.commands().to_vec()));
        let mut replies = self.inner.exec(batch).await?;
        let drop = std::mem::take(&mut self.state.lock().unwrap().drop_replies);
        replies.truncate(replies.len().saturating_sub(drop));
        Ok(replies)
    }

    async fn set_members(&self, key: &str) -> StoreResult<Vec<String>> {
        self.record(StoreCall::SetMembers(key.to_string()));
        self.inner.set_members(key).await
    }

    async fn list_range(&self, key: &str, start: isize, stop: isize) -> StoreResult<Vec<String>> {
        self.record(StoreCall::ListRange(key.to_string(), start, stop));
        self.inner.list_range(key, start, stop).await
    }

    async fn expire(&self, key: &str, seconds: i64) -> StoreResult<bool> {
        self.record(StoreCall::Expire(key.to_string(), seconds));
        self.inner.expire(key, seconds).await
    }

    async fn time_to_live(&self, key: &str) -> StoreResult<i64> {
        self.record(StoreCall::TimeToLive(key.to_string()));
        self.inner.time_to_live(key).await
    }

    async fn flush_all(&self) -> StoreResult<()> {
        self.record(StoreCall::FlushAll);
        self.inner.flush_all().await
    }

    async fn health_check(&self) -> StoreResult<bool> {
        self.record(StoreCall::HealthCheck);
        self.inner.health_check().await
    }

    fn provider_name(&self) -> &'static str {
        "recording"
    }
}

/// The configuration matrix exercised by the lifecycle tests
pub fn config_matrix() -> Vec<TaskLogConfig> {
    let base = TaskLogConfig::new("task:", "tasks");
    vec![
        base.clone()
            .with_ttl(30)
            .with_renew_on_write(true)
            .with_renew_on_read(true),
        base.clone()
            .with_ttl(30)
            .with_renew_on_write(false)
            .with_renew_on_read(true),
        base.clone()
            .with_ttl(30)
            .with_renew_on_write(true)
            .with_renew_on_read(false),
        base.clone()
            .with_ttl(30)
            .with_renew_on_write(false)
            .with_renew_on_read(false),
        base,
    ]
}

/// Cache over a fresh recording store
pub fn recording_cache(config: TaskLogConfig) -> (TaskLogCache, RecordingStore) {
    let store = RecordingStore::new();
    let cache = TaskLogCache::new(Arc::new(store.clone()), config)
        .expect("test configuration should be valid");
    (cache, store)
}
