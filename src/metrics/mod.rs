//! Client metrics
//!
//! Tracks remote call counts, error rates and search outcomes.

use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Remote operation of the search API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Create,
    Start,
    Status,
    Results,
}

impl Operation {
    pub const ALL: [Operation; 4] = [
        Operation::Create,
        Operation::Start,
        Operation::Status,
        Operation::Results,
    ];

    fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::Start => "start",
            Operation::Status => "status",
            Operation::Results => "results",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Counters shared by a client and every results context it produced
#[derive(Debug, Default)]
pub struct ClientMetrics {
    /// Searches submitted
    searches_started: AtomicU64,
    /// Searches that reached FINISHED
    searches_finished: AtomicU64,
    /// Calls per operation
    calls: [AtomicU64; 4],
    /// Failed calls per operation
    errors: [AtomicU64; 4],
    /// Cumulative call latency per operation, in ms
    latency_ms: [AtomicU64; 4],
}

impl ClientMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_search_started(&self) {
        self.searches_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_search_finished(&self) {
        self.searches_finished.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a completed call and its outcome
    pub fn record_call(&self, operation: Operation, elapsed_ms: u64, success: bool) {
        let i = operation.index();
        self.calls[i].fetch_add(1, Ordering::Relaxed);
        self.latency_ms[i].fetch_add(elapsed_ms, Ordering::Relaxed);
        if !success {
            self.errors[i].fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn searches_started(&self) -> u64 {
        self.searches_started.load(Ordering::Relaxed)
    }

    pub fn searches_finished(&self) -> u64 {
        self.searches_finished.load(Ordering::Relaxed)
    }

    pub fn calls(&self, operation: Operation) -> u64 {
        self.calls[operation.index()].load(Ordering::Relaxed)
    }

    pub fn errors(&self, operation: Operation) -> u64 {
        self.errors[operation.index()].load(Ordering::Relaxed)
    }

    /// Average latency of an operation
    pub fn avg_latency_ms(&self, operation: Operation) -> Option<u64> {
        let calls = self.calls(operation);
        if calls == 0 {
            None
        } else {
            Some(self.latency_ms[operation.index()].load(Ordering::Relaxed) / calls)
        }
    }

    /// Percentage of successful calls for an operation
    pub fn reliability(&self, operation: Operation) -> f64 {
        let calls = self.calls(operation);
        if calls == 0 {
            100.0
        } else {
            let ok = calls.saturating_sub(self.errors(operation));
            (ok as f64 / calls as f64) * 100.0
        }
    }

    /// Point-in-time copy of all counters
    pub fn snapshot(&self) -> Vec<OperationStats> {
        Operation::ALL
            .iter()
            .map(|&operation| OperationStats {
                operation,
                calls: self.calls(operation),
                errors: self.errors(operation),
                avg_latency_ms: self.avg_latency_ms(operation),
            })
            .collect()
    }
}

/// Statistics for a single operation
#[derive(Debug, Clone, Serialize)]
pub struct OperationStats {
    pub operation: Operation,
    pub calls: u64,
    pub errors: u64,
    pub avg_latency_ms: Option<u64>,
}
