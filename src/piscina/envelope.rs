//! Request safety envelope: a wall-clock budget and resource measurement
//! around privileged handlers.
//!
//! The handler is spawned as its own task and raced against a timer. When the
//! timer wins, the response is a [`EnvelopeError::Timeout`] immediately, but
//! the spawned task is left running to completion with its result discarded:
//! the handler is a black box, so its in-flight work is a deliberate, bounded
//! leak accepted in exchange for bounding client-observable latency. Retry
//! policy, if any, belongs to the caller; the envelope never retries.

use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, warn};

pub const DEFAULT_BUDGET: Duration = Duration::from_millis(9500);

/// Fraction of the budget after which a completed handler is worth a warning.
const SLOW_HANDLER_FRACTION: f64 = 0.8;
/// Resident-memory growth past this triggers a warning.
const MEMORY_WARN_BYTES: i64 = 50 * 1024 * 1024;

/// Per-invocation measurement; diagnostics only, never persisted.
#[derive(Debug)]
pub struct SafetyOutcome<T> {
    pub result: T,
    pub duration: Duration,
    pub memory_delta_bytes: i64,
}

#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("handler exceeded its {budget_ms} ms budget")]
    Timeout { budget_ms: u64 },
    #[error("handler failed: {message}")]
    Internal { message: String },
}

/// Run `handler` under `budget`, returning its result or a timeout, whichever
/// resolves first, and measure every invocation.
///
/// Handler panics and `Err` returns are captured here and normalized; nothing
/// escapes the envelope unhandled. Error messages that look timeout-shaped
/// (an upstream call that timed out inside the handler) are classified as
/// [`EnvelopeError::Timeout`] as well.
pub async fn with_budget<T, F>(budget: Duration, handler: F) -> Result<SafetyOutcome<T>, EnvelopeError>
where
    T: Send + 'static,
    F: std::future::Future<Output = anyhow::Result<T>> + Send + 'static,
{
    let started = Instant::now();
    let resident_before = resident_bytes();

    let handle = tokio::spawn(handler);

    let result = match tokio::time::timeout(budget, handle).await {
        // Timer won; the task keeps running, its result is discarded.
        Err(_elapsed) => Err(EnvelopeError::Timeout {
            budget_ms: budget.as_millis() as u64,
        }),
        Ok(Err(join_err)) => {
            let message = if join_err.is_panic() {
                format!("handler panicked: {join_err}")
            } else {
                format!("handler was aborted: {join_err}")
            };
            Err(EnvelopeError::Internal { message })
        }
        Ok(Ok(Err(err))) => Err(classify_failure(&err, budget)),
        Ok(Ok(Ok(value))) => Ok(value),
    };

    let duration = started.elapsed();
    let memory_delta_bytes = match (resident_before, resident_bytes()) {
        (Some(before), Some(after)) => after as i64 - before as i64,
        _ => 0,
    };
    observe(budget, duration, memory_delta_bytes, result.is_ok());

    result.map(|result| SafetyOutcome {
        result,
        duration,
        memory_delta_bytes,
    })
}

fn classify_failure(err: &anyhow::Error, budget: Duration) -> EnvelopeError {
    let message = format!("{err:#}");
    if message.to_ascii_lowercase().contains("timed out")
        || message.to_ascii_lowercase().contains("timeout")
    {
        EnvelopeError::Timeout {
            budget_ms: budget.as_millis() as u64,
        }
    } else {
        EnvelopeError::Internal { message }
    }
}

fn observe(budget: Duration, duration: Duration, memory_delta_bytes: i64, ok: bool) {
    debug!(
        duration_ms = duration.as_millis() as u64,
        memory_delta_bytes, ok, "handler measured"
    );

    if duration.as_secs_f64() > budget.as_secs_f64() * SLOW_HANDLER_FRACTION {
        warn!(
            duration_ms = duration.as_millis() as u64,
            budget_ms = budget.as_millis() as u64,
            "handler consumed most of its budget"
        );
    }

    if memory_delta_bytes > MEMORY_WARN_BYTES {
        warn!(memory_delta_bytes, "handler grew resident memory");
    }
}

/// Resident set size from `/proc/self/statm`, where available.
fn resident_bytes() -> Option<u64> {
    // statm reports pages; the kernel page size is 4 KiB on every platform we
    // deploy to.
    const PAGE_SIZE: u64 = 4096;
    let statm = std::fs::read_to_string("/proc/self/statm").ok()?;
    let resident_pages: u64 = statm.split_whitespace().nth(1)?.parse().ok()?;
    Some(resident_pages * PAGE_SIZE)
}
