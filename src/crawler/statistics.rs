//! Workload accounting
//!
//! Counters are plain atomics; no lock is taken. A snapshot reads each field
//! atomically but not all fields together.

use crate::model::Resource;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

/// Errors raised by workload accounting
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StatisticsError {
    #[error("Remaining workload would drop below zero")]
    WorkloadUnderflow,
}

/// Point-in-time view of the counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatisticsSnapshot {
    pub remaining_workload: u64,
    pub verified_url_count: u64,
    pub valid_url_count: u64,
    pub broken_url_count: u64,
}

/// Atomic crawl counters
#[derive(Debug, Default)]
pub struct Statistics {
    remaining_workload: AtomicU64,
    verified_url_count: AtomicU64,
    valid_url_count: AtomicU64,
    broken_url_count: AtomicU64,
}

impl Statistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one resource to the workload, returning the new value
    pub fn increment_remaining_workload(&self) -> u64 {
        self.remaining_workload.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Removes one resource from the workload, returning the new value
    ///
    /// Refuses to go below zero.
    pub fn decrement_remaining_workload(&self) -> Result<u64, StatisticsError> {
        self.remaining_workload
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .map(|previous| previous - 1)
            .map_err(|_| StatisticsError::WorkloadUnderflow)
    }

    /// Counts a verified resource as valid or broken
    pub fn record_verification(&self, resource: &Resource) {
        self.verified_url_count.fetch_add(1, Ordering::Relaxed);
        if resource.status_code.is_broken() {
            self.broken_url_count.fetch_add(1, Ordering::Relaxed);
        } else {
            self.valid_url_count.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn take_snapshot(&self) -> StatisticsSnapshot {
        StatisticsSnapshot {
            remaining_workload: self.remaining_workload.load(Ordering::SeqCst),
            verified_url_count: self.verified_url_count.load(Ordering::Relaxed),
            valid_url_count: self.valid_url_count.load(Ordering::Relaxed),
            broken_url_count: self.broken_url_count.load(Ordering::Relaxed),
        }
    }
}
