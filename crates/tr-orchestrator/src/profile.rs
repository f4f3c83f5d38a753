use std::collections::HashMap;

use hdrhistogram::Histogram;
use tokio_util::sync::CancellationToken;
use tr_document::{Document, ProfileSpec, Request};
use tr_resolver::VarTable;

use crate::error::CoreError;
use crate::request_exec::{run_request, Executors};

#[derive(Debug, Clone)]
pub struct ProfileStats {
    pub samples: u32,
    pub failures: u32,
    pub min_ms: u64,
    pub max_ms: u64,
    pub mean_ms: f64,
    pub p50_ms: u64,
    pub p90_ms: u64,
    pub p99_ms: u64,
}

/// Runs a request `spec.count` times (after `spec.warmup` untimed runs,
/// spaced `spec.delay` apart) and reduces the wall-clock durations to
/// latency percentiles via `hdrhistogram` (spec §4.8's `@profile`).
pub async fn run_profile(
    executors: &Executors,
    doc: &Document,
    request: &Request,
    spec: &ProfileSpec,
    process_vars: &HashMap<String, String>,
    cancel: &CancellationToken,
) -> Result<ProfileStats, CoreError> {
    for _ in 0..spec.warmup {
        if cancel.is_cancelled() {
            return Err(CoreError::Cancelled);
        }
        let mut vars = VarTable::default();
        let _ = run_request(executors, doc, request, &mut vars, process_vars, cancel).await;
        if !spec.delay.is_zero() {
            tokio::time::sleep(spec.delay).await;
        }
    }

    // 3 significant digits is the hdrhistogram-recommended default for
    // sub-minute latencies without excessive memory use.
    let mut histogram = Histogram::<u64>::new(3).expect("valid histogram precision");
    let mut failures = 0u32;

    for i in 0..spec.count {
        if cancel.is_cancelled() {
            return Err(CoreError::Cancelled);
        }
        let mut vars = VarTable::default();
        let start = std::time::Instant::now();
        let result = run_request(executors, doc, request, &mut vars, process_vars, cancel).await;
        let elapsed = start.elapsed();
        match result {
            Ok(_) => {
                let _ = histogram.record(elapsed.as_millis() as u64);
            }
            Err(_) => failures += 1,
        }
        if !spec.delay.is_zero() && i + 1 < spec.count {
            tokio::time::sleep(spec.delay).await;
        }
    }

    Ok(ProfileStats {
        samples: histogram.len() as u32,
        failures,
        min_ms: histogram.min(),
        max_ms: histogram.max(),
        mean_ms: histogram.mean(),
        p50_ms: histogram.value_at_quantile(0.50),
        p90_ms: histogram.value_at_quantile(0.90),
        p99_ms: histogram.value_at_quantile(0.99),
    })
}
