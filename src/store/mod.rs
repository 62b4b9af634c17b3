//! # Key-Value Store Protocol
//!
//! The capability set the task log cache needs from its backing store.
//!
//! ```text
//! KeyValueStore (trait object)    <- injected into TaskLogCache
//!   ├── RedisStore                 <- ConnectionManager-based async Redis
//!   └── MemoryStore                <- in-process, tokio-clock expiry
//! ```
//!
//! Mutations that must stay consistent with each other are expressed as a
//! [`Batch`] and executed atomically by [`KeyValueStore::exec`]. Reads and
//! expiry changes are single commands.

pub mod memory;

#[cfg(feature = "store-redis")]
pub mod redis;

pub use memory::MemoryStore;

#[cfg(feature = "store-redis")]
pub use self::redis::RedisStore;

use crate::error::StoreResult;
use async_trait::async_trait;

/// One command inside an atomic batch
///
/// Every command replies with an integer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// SADD, replies with the number of members newly added
    SetAdd { key: String, members: Vec<String> },
    /// SREM, replies with the number of members removed
    SetRemove { key: String, members: Vec<String> },
    /// RPUSH, replies with the list length after the append
    ListPush { key: String, value: String },
    /// LLEN, replies with 0 for a missing key
    ListLength { key: String },
    /// DEL, replies with the number of keys removed
    Delete { keys: Vec<String> },
}

/// Ordered commands executed without interleaving from other clients
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Batch {
    commands: Vec<Command>,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_add(mut self, key: impl Into<String>, member: impl Into<String>) -> Self {
        self.commands.push(Command::SetAdd {
            key: key.into(),
            members: vec![member.into()],
        });
        self
    }

    pub fn set_remove(mut self, key: impl Into<String>, members: Vec<String>) -> Self {
        self.commands.push(Command::SetRemove {
            key: key.into(),
            members,
        });
        self
    }

    pub fn list_push(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.commands.push(Command::ListPush {
            key: key.into(),
            value: value.into(),
        });
        self
    }

    pub fn list_length(mut self, key: impl Into<String>) -> Self {
        self.commands.push(Command::ListLength { key: key.into() });
        self
    }

    pub fn delete(mut self, keys: Vec<String>) -> Self {
        self.commands.push(Command::Delete { keys });
        self
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// Per-command replies of an executed batch, in command order
///
/// `None` is a nil reply.
pub type BatchReply = Vec<Option<i64>>;

/// Store operations used by the task log cache
///
/// Implementations share one handle across all concurrent callers and do no
/// retrying of their own; errors are returned as produced by the backend.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Execute a batch atomically, returning one reply per command
    async fn exec(&self, batch: Batch) -> StoreResult<BatchReply>;

    /// All members of a set, empty for a missing key
    async fn set_members(&self, key: &str) -> StoreResult<Vec<String>>;

    /// Inclusive range of a list; negative indices count from the end
    async fn list_range(&self, key: &str, start: isize, stop: isize) -> StoreResult<Vec<String>>;

    /// Set a key's timeout; false when the key does not exist
    async fn expire(&self, key: &str, seconds: i64) -> StoreResult<bool>;

    /// Remaining seconds to live: -2 for a missing key, -1 without expiry
    async fn time_to_live(&self, key: &str) -> StoreResult<i64>;

    /// Remove every key. Test harnesses only.
    async fn flush_all(&self) -> StoreResult<()>;

    /// Check if the backend is reachable
    async fn health_check(&self) -> StoreResult<bool>;

    /// Name of the backend
    fn provider_name(&self) -> &'static str;
}
