use std::time::Duration;

use tokio::time::sleep;

/// Computes the wait before attempt number `attempt` (1-based).
///
/// Exponential backoff uses `2^(attempt - 2) * delay_ms`: half a unit
/// before the first attempt, then `delay_ms`, `2 * delay_ms`, ...
/// Attempt `0` never waits.
pub fn backoff_delay(attempt: u32, delay_ms: f64, exponential: bool) -> Duration {
    if attempt == 0 {
        return Duration::ZERO;
    }

    let millis = if exponential {
        let exponent = attempt.min(1_024) as i32 - 2;
        2f64.powi(exponent) * delay_ms
    } else {
        delay_ms
    };

    // Float to int casts saturate, so oversized waits clamp to u64::MAX nanos.
    Duration::from_nanos((millis * 1_000_000.0) as u64)
}

/// Suspends the current task for the backoff of `attempt`.
pub async fn wait_for(attempt: u32, delay_ms: f64, exponential: bool) {
    let delay = backoff_delay(attempt, delay_ms, exponential);

    #[cfg(feature = "tracing")]
    tracing::trace!(attempt, delay_ms = delay.as_millis() as u64, "waiting before attempt");

    if !delay.is_zero() {
        sleep(delay).await;
    }
}
