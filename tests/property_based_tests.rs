use proptest::prelude::*;
use serde_json::{json, Value};
use std::sync::Arc;
use tasklog_cache::{MemoryStore, Status, TaskLogCache, TaskLogConfig};

fn run<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(future)
}

fn fresh_cache() -> TaskLogCache {
    TaskLogCache::new(
        Arc::new(MemoryStore::new()),
        TaskLogConfig::new("task:", "tasks"),
    )
    .unwrap()
}

/// Plain statuses that the read heuristic leaves alone
fn text_status_strategy() -> impl Strategy<Value = String> {
    "[^{][a-zA-Z0-9 %:_-]{0,24}"
}

/// Structured statuses: JSON objects with scalar and nested values
fn object_status_strategy() -> impl Strategy<Value = Value> {
    (
        "[a-z]{1,8}",
        0u32..=100,
        any::<bool>(),
        prop::collection::vec("[a-z]{0,6}", 0..4),
    )
        .prop_map(|(task, percent, done, tags)| {
            json!({
                "task": task,
                "percent": percent,
                "done": done,
                "tags": tags,
                "detail": {"note": null},
            })
        })
}

fn status_strategy() -> impl Strategy<Value = Status> {
    prop_oneof![
        text_status_strategy().prop_map(Status::Text),
        object_status_strategy().prop_map(Status::Structured),
    ]
}

proptest! {
    /// Property: push returns 1, 2, ... N for a fresh identifier
    #[test]
    fn push_lengths_count_pushes(statuses in prop::collection::vec(status_strategy(), 1..20)) {
        let lengths = run(async {
            let tasklog = fresh_cache();
            let mut lengths = Vec::new();
            for status in &statuses {
                lengths.push(tasklog.push("job", status.clone()).await.unwrap());
            }
            lengths
        });
        prop_assert_eq!(lengths, (1..=statuses.len() as u64).collect::<Vec<_>>());
    }

    /// Property: get returns exactly what was pushed, in push order
    #[test]
    fn get_returns_pushed_statuses(statuses in prop::collection::vec(status_strategy(), 0..20)) {
        let entries = run(async {
            let tasklog = fresh_cache();
            for status in &statuses {
                tasklog.push("job", status.clone()).await.unwrap();
            }
            tasklog.get("job").await.unwrap()
        });
        prop_assert_eq!(entries, statuses);
    }

    /// Property: summary maps every pushed identifier to its push count
    #[test]
    fn summary_counts_per_identifier(counts in prop::collection::btree_map("[a-z0-9]{1,6}", 1usize..6, 0..6)) {
        let summary = run(async {
            let tasklog = fresh_cache();
            for (id, count) in &counts {
                for n in 0..*count {
                    tasklog.push(id, format!("step {n}")).await.unwrap();
                }
            }
            tasklog.summary().await.unwrap()
        });
        prop_assert_eq!(summary.len(), counts.len());
        for (id, count) in &counts {
            prop_assert_eq!(summary.get(id).copied(), Some(*count as u64));
        }
    }
}
