//! In-process store backend
//!
//! Implements the same protocol as Redis for the subset of commands the task
//! log cache issues. One mutex guards the whole keyspace and is held across a
//! batch, so batches are atomic with respect to every other call.
//!
//! Expiry deadlines use the tokio clock, which lets tests drive TTLs with
//! `tokio::time::pause` and `advance`. Expired keys are dropped lazily when
//! touched, the same way Redis treats passive expiry.

use super::{Batch, BatchReply, Command, KeyValueStore};
use crate::error::{StoreError, StoreResult};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

#[derive(Debug, Clone)]
enum Value {
    Set(BTreeSet<String>),
    List(Vec<String>),
}

#[derive(Debug, Clone)]
struct Entry {
    value: Value,
    expires_at: Option<Instant>,
}

impl Entry {
    fn persistent(value: Value) -> Self {
        Self {
            value,
            expires_at: None,
        }
    }

    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|deadline| deadline <= now)
    }
}

#[derive(Debug, Default)]
struct Keyspace {
    entries: HashMap<String, Entry>,
}

impl Keyspace {
    /// Live entry for `key`, evicting it first if its deadline has passed
    fn live(&mut self, key: &str, now: Instant) -> Option<&mut Entry> {
        if self.entries.get(key).is_some_and(|entry| entry.is_expired(now)) {
            self.entries.remove(key);
            debug!(key = key, "Memory store key expired");
        }
        self.entries.get_mut(key)
    }

    fn set_mut(&mut self, key: &str, now: Instant) -> StoreResult<Option<&mut BTreeSet<String>>> {
        match self.live(key, now) {
            None => Ok(None),
            Some(Entry {
                value: Value::Set(set),
                ..
            }) => Ok(Some(set)),
            Some(_) => Err(wrong_type(key)),
        }
    }

    fn list_mut(&mut self, key: &str, now: Instant) -> StoreResult<Option<&mut Vec<String>>> {
        match self.live(key, now) {
            None => Ok(None),
            Some(Entry {
                value: Value::List(list),
                ..
            }) => Ok(Some(list)),
            Some(_) => Err(wrong_type(key)),
        }
    }

    fn apply(&mut self, command: &Command, now: Instant) -> StoreResult<i64> {
        match command {
            Command::SetAdd { key, members } => {
                if self.set_mut(key, now)?.is_none() {
                    self.entries
                        .insert(key.clone(), Entry::persistent(Value::Set(BTreeSet::new())));
                }
                let set = self.set_mut(key, now)?.ok_or_else(|| wrong_type(key))?;
                let added = members
                    .iter()
                    .filter(|member| set.insert((*member).clone()))
                    .count();
                Ok(added as i64)
            }
            Command::SetRemove { key, members } => {
                let Some(set) = self.set_mut(key, now)? else {
                    return Ok(0);
                };
                let removed = members.iter().filter(|member| set.remove(*member)).count();
                if set.is_empty() {
                    self.entries.remove(key);
                }
                Ok(removed as i64)
            }
            Command::ListPush { key, value } => {
                if self.list_mut(key, now)?.is_none() {
                    self.entries
                        .insert(key.clone(), Entry::persistent(Value::List(Vec::new())));
                }
                let list = self.list_mut(key, now)?.ok_or_else(|| wrong_type(key))?;
                list.push(value.clone());
                Ok(list.len() as i64)
            }
            Command::ListLength { key } => Ok(self
                .list_mut(key, now)?
                .map_or(0, |list| list.len() as i64)),
            Command::Delete { keys } => {
                let mut removed = 0;
                for key in keys {
                    if self.live(key, now).is_some() {
                        self.entries.remove(key);
                        removed += 1;
                    }
                }
                Ok(removed)
            }
        }
    }
}

fn wrong_type(key: &str) -> StoreError {
    StoreError::WrongType {
        key: key.to_string(),
    }
}

/// Resolve an inclusive, possibly negative, index window against a length
fn resolve_range(len: usize, start: isize, stop: isize) -> Option<(usize, usize)> {
    let len = len as isize;
    let start = if start < 0 { (len + start).max(0) } else { start };
    let stop = if stop < 0 { len + stop } else { stop.min(len - 1) };
    if len == 0 || start > stop || start >= len || stop < 0 {
        return None;
    }
    Some((start as usize, stop as usize))
}

/// In-memory store
///
/// Clones share the same keyspace.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    keyspace: Arc<Mutex<Keyspace>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn exec(&self, batch: Batch) -> StoreResult<BatchReply> {
        let now = Instant::now();
        let mut keyspace = self.keyspace.lock();
        let replies = batch
            .commands()
            .iter()
            .map(|command| keyspace.apply(command, now).map(Some))
            .collect::<StoreResult<BatchReply>>()?;

        debug!(commands = batch.len(), replies = ?replies, "Memory store batch");
        Ok(replies)
    }

    async fn set_members(&self, key: &str) -> StoreResult<Vec<String>> {
        let mut keyspace = self.keyspace.lock();
        Ok(keyspace
            .set_mut(key, Instant::now())?
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn list_range(&self, key: &str, start: isize, stop: isize) -> StoreResult<Vec<String>> {
        let mut keyspace = self.keyspace.lock();
        let Some(list) = keyspace.list_mut(key, Instant::now())? else {
            return Ok(Vec::new());
        };
        Ok(resolve_range(list.len(), start, stop)
            .map(|(from, to)| list[from..=to].to_vec())
            .unwrap_or_default())
    }

    async fn expire(&self, key: &str, seconds: i64) -> StoreResult<bool> {
        let now = Instant::now();
        let mut keyspace = self.keyspace.lock();
        if keyspace.live(key, now).is_none() {
            return Ok(false);
        }
        if seconds <= 0 {
            keyspace.entries.remove(key);
            return Ok(true);
        }
        let deadline = now
            .checked_add(Duration::from_secs(seconds as u64))
            .ok_or_else(|| StoreError::InvalidExpireTime {
                key: key.to_string(),
                seconds,
            })?;
        if let Some(entry) = keyspace.live(key, now) {
            entry.expires_at = Some(deadline);
        }
        Ok(true)
    }

    async fn time_to_live(&self, key: &str) -> StoreResult<i64> {
        let now = Instant::now();
        let mut keyspace = self.keyspace.lock();
        Ok(match keyspace.live(key, now) {
            None => -2,
            Some(Entry {
                expires_at: None, ..
            }) => -1,
            // Rounded to the nearest second, as Redis does
            Some(Entry {
                expires_at: Some(deadline),
                ..
            }) => (deadline.saturating_duration_since(now).as_millis() as i64 + 500) / 1000,
        })
    }

    async fn flush_all(&self) -> StoreResult<()> {
        self.keyspace.lock().entries.clear();
        Ok(())
    }

    async fn health_check(&self) -> StoreResult<bool> {
        Ok(true)
    }

    fn provider_name(&self) -> &'static str {
        "memory"
    }
}
