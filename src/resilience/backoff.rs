//! Jittered replay delay.

use rand::Rng;
use std::time::Duration;

use crate::config::DelayRange;

/// Draw a delay uniformly from `range`, bounds included.
pub fn jittered_delay(range: &DelayRange) -> Duration {
    jittered_delay_with(range, &mut rand::thread_rng())
}

/// Same as [`jittered_delay`] with a caller-supplied RNG.
pub fn jittered_delay_with<R: Rng + ?Sized>(range: &DelayRange, rng: &mut R) -> Duration {
    let (low, high) = if range.min_secs <= range.max_secs {
        (range.min_secs, range.max_secs)
    } else {
        (range.max_secs, range.min_secs)
    };
    Duration::from_secs(rng.gen_range(low..=high))
}
