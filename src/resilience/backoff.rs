//! Exponential delay schedule with jitter.

use rand::Rng;
use std::time::Duration;

/// Delay before poll `attempt` (0-based), doubling from `base` up to `max`.
///
/// Up to 10% jitter is added so concurrent waiters do not poll in lockstep.
pub fn poll_delay(attempt: u32, base: Duration, max: Duration) -> Duration {
    let base_ms = base.as_millis() as u64;
    let max_ms = max.as_millis() as u64;

    let factor = 2u64.saturating_pow(attempt.min(32));
    let capped_ms = base_ms.saturating_mul(factor).min(max_ms);

    let jitter_range = capped_ms / 10;
    let jitter = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range)
    } else {
        0
    };

    Duration::from_millis(capped_ms + jitter)
}
