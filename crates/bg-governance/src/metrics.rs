//! Governance counters.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters updated by the governance service.
#[derive(Debug, Default)]
pub struct GovernanceMetrics {
    pub operations_committed: AtomicU64,
    pub operations_aborted: AtomicU64,
    pub operations_rejected: AtomicU64,
    pub votes_cast: AtomicU64,
    pub vote_retries: AtomicU64,
    pub quorums_reached: AtomicU64,
    pub submissions_finalized: AtomicU64,
}

/// Point-in-time copy of [`GovernanceMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GovernanceMetricsSnapshot {
    pub operations_committed: u64,
    pub operations_aborted: u64,
    pub operations_rejected: u64,
    pub votes_cast: u64,
    pub vote_retries: u64,
    pub quorums_reached: u64,
    pub submissions_finalized: u64,
}

impl GovernanceMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_committed(&self) {
        self.operations_committed.fetch_add(1, Ordering::Relaxed);
    }

    /// A transaction aborted (timeout, storage failure, conflict).
    pub fn record_aborted(&self) {
        self.operations_aborted.fetch_add(1, Ordering::Relaxed);
    }

    /// Failed validation before anything was written.
    pub fn record_rejected(&self) {
        self.operations_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_vote(&self, quorum_newly_reached: bool) {
        self.votes_cast.fetch_add(1, Ordering::Relaxed);
        if quorum_newly_reached {
            self.quorums_reached.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_vote_retry(&self) {
        self.vote_retries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_finalized(&self) {
        self.submissions_finalized.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> GovernanceMetricsSnapshot {
        GovernanceMetricsSnapshot {
            operations_committed: self.operations_committed.load(Ordering::Relaxed),
            operations_aborted: self.operations_aborted.load(Ordering::Relaxed),
            operations_rejected: self.operations_rejected.load(Ordering::Relaxed),
            votes_cast: self.votes_cast.load(Ordering::Relaxed),
            vote_retries: self.vote_retries.load(Ordering::Relaxed),
            quorums_reached: self.quorums_reached.load(Ordering::Relaxed),
            submissions_finalized: self.submissions_finalized.load(Ordering::Relaxed),
        }
    }
}
