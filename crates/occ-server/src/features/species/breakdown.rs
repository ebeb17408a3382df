//! Record-type breakdown reconciliation
//!
//! Bucket counts are queried independently and may be mutually inconsistent
//! (data can change between parallel calls). The residual `other` bucket is
//! defined as the total minus the named buckets, clamped to zero; the clamp
//! is the reconciliation policy, and every time it actually fires the
//! negative residual is logged.

use serde::{Deserialize, Serialize};

/// Occurrence counts partitioned by basis of record
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordTypeBreakdown {
    pub human_observation: u64,
    pub preserved_specimen: u64,
    pub machine_observation: u64,
    /// Crowd-sourced dataset subset of the human-observation bucket
    pub crowd_sourced: u64,
    /// Residual: total minus all named buckets, clamped to zero
    pub other: u64,
}

/// Reconcile independently-queried bucket counts against a total
pub fn reconcile(
    total: u64,
    human_observation: u64,
    preserved_specimen: u64,
    machine_observation: u64,
    crowd_sourced: u64,
) -> RecordTypeBreakdown {
    let partitioned = human_observation + preserved_specimen + machine_observation + crowd_sourced;
    if partitioned > total {
        tracing::warn!(
            total,
            partitioned,
            residual = partitioned - total,
            "record-type buckets exceed the total, clamping 'other' to zero"
        );
    }

    RecordTypeBreakdown {
        human_observation,
        preserved_specimen,
        machine_observation,
        crowd_sourced,
        other: total.saturating_sub(partitioned),
    }
}
