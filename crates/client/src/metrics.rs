//! Metrics for the extrinsic submitter.
//!
//! Nothing is exported from here; an embedding process may install a
//! `metrics` recorder to collect them.

use metrics::{counter, histogram};

/// Submission metrics, labelled by `Pallet.call`.
#[derive(Clone, Copy, Debug, Default)]
pub struct SubmitterMetrics;

impl SubmitterMetrics {
    /// Record a submitted extrinsic
    #[inline]
    pub fn record_submitted(&self, pallet: &'static str, call: &'static str) {
        counter!("sygma_extrinsics_submitted_total", "pallet" => pallet, "call" => call)
            .increment(1);
    }

    /// Record a terminal outcome (`in_block`, `finalized`, `rejected`, `closed`, `timeout`)
    #[inline]
    pub fn record_outcome(&self, pallet: &'static str, call: &'static str, outcome: &'static str) {
        counter!(
            "sygma_extrinsics_completed_total",
            "pallet" => pallet,
            "call" => call,
            "outcome" => outcome
        )
        .increment(1);
    }

    /// Record time from submission to the terminal status
    #[inline]
    pub fn record_latency(&self, pallet: &'static str, call: &'static str, duration_secs: f64) {
        histogram!("sygma_extrinsic_latency_seconds", "pallet" => pallet, "call" => call)
            .record(duration_secs);
    }

    /// Record a storage read
    #[inline]
    pub fn record_query(&self, entry: &str) {
        counter!("sygma_storage_queries_total", "entry" => entry.to_string()).increment(1);
    }
}
