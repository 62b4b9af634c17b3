#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Task Log Cache
//!
//! Append-only progress logs for long-running background jobs, stored in
//! Redis (or any store implementing [`store::KeyValueStore`]).
//!
//! ## Overview
//!
//! Each task identifier gets a list of status entries (`"started"`, then
//! `{"progress": "50%"}`, then `"done"`), and a shared index set records
//! which identifiers currently have a log. Logs can expire after an idle
//! period; [`TaskLogCache::reap`] cleans the index after expiry.
//!
//! ## Module Organization
//!
//! - [`cache`] - The five log operations and the TTL renewal policy
//! - [`store`] - Store protocol, atomic batches, Redis and in-memory backends
//! - [`status`] - Status entries and their stored representation
//! - [`config`] - Validated configuration and layered loading
//! - [`error`] - Structured error handling
//! - [`logging`] - Subscriber setup for embedding applications
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use serde_json::json;
//! use tasklog_cache::{RedisConfig, RedisStore, TaskLogCache, TaskLogConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = RedisStore::from_config(&RedisConfig::from_env()).await?;
//! let config = TaskLogConfig::new("task:", "tasks")
//!     .with_ttl(30)
//!     .with_renew_on_write(true);
//! let tasklog = TaskLogCache::new(Arc::new(store), config)?;
//!
//! tasklog.push("1", json!({"task": "start", "progress": "0%"})).await?;
//! tasklog.push("1", "done").await?;
//!
//! let entries = tasklog.get("1").await?;
//! let lengths = tasklog.summary().await?;
//! tasklog.reap().await?;
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod logging;
pub mod status;
pub mod store;

pub use cache::TaskLogCache;
pub use self::config::{RedisConfig, TaskLogConfig};
pub use error::{ConfigurationError, StoreError, StoreResult, TaskLogError, TaskLogResult};
pub use status::Status;
pub use store::{Batch, BatchReply, Command, KeyValueStore, MemoryStore};

#[cfg(feature = "store-redis")]
pub use store::RedisStore;
