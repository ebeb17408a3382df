//! Scatter/gather support for provider fan-out
//!
//! Each aggregation phase launches its sub-fetches concurrently and joins on
//! all of them. A sub-fetch that fails, returns a non-success status, or
//! exceeds its time bound settles to `None` and the failure reason is
//! logged; it never aborts the phase. The time bound keeps one stalled
//! provider from stalling an entire phase.

use crate::providers::ProviderResult;
use std::future::Future;
use std::time::Duration;

/// Per-sub-fetch time bound within a fan-out phase
pub const SUBFETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Run one sub-fetch to completion, folding failure and timeout to `None`
pub async fn settle<T, F>(label: &'static str, fut: F) -> Option<T>
where
    F: Future<Output = ProviderResult<T>>,
{
    match tokio::time::timeout(SUBFETCH_TIMEOUT, fut).await {
        Ok(Ok(value)) => Some(value),
        Ok(Err(e)) => {
            tracing::warn!(subfetch = label, error = %e, "sub-fetch failed");
            None
        },
        Err(_) => {
            tracing::warn!(
                subfetch = label,
                timeout_secs = SUBFETCH_TIMEOUT.as_secs(),
                "sub-fetch timed out"
            );
            None
        },
    }
}

/// Run an optional sub-fetch; absent input settles to `None` without a call
pub async fn settle_opt<T, F>(label: &'static str, fut: Option<F>) -> Option<T>
where
    F: Future<Output = ProviderResult<T>>,
{
    match fut {
        Some(fut) => settle(label, fut).await,
        None => None,
    }
}
