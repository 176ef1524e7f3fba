//! Plan measurement clock.
//!
//! Only compiled with `std`; without a clock the planner clamps every
//! search to estimation. Measurement repeats the candidate until one block
//! takes at least [`MIN_BLOCKS`] timer granularities, then reports the
//! median of [`REPEATS`] such blocks in seconds per single application.

use std::time::{Duration, Instant};

const REPEATS: usize = 8;
const MIN_BLOCKS: u32 = 16;

/// Smallest interval the clock can resolve, probed once per planner.
pub(crate) fn granularity() -> Duration {
    let mut best = Duration::from_secs(1);
    for _ in 0..8 {
        let t0 = Instant::now();
        let mut t1 = Instant::now();
        while t1 == t0 {
            t1 = Instant::now();
        }
        let d = t1 - t0;
        if d < best {
            best = d;
        }
    }
    if best.is_zero() {
        Duration::from_nanos(1)
    } else {
        best
    }
}

/// Wall-clock budget for one planning call. `None` means unbounded.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Deadline {
    end: Option<Instant>,
}

impl Deadline {
    pub(crate) fn start(limit: Option<Duration>) -> Self {
        Self {
            end: limit.map(|d| Instant::now() + d),
        }
    }

    pub(crate) fn expired(&self) -> bool {
        match self.end {
            Some(end) => Instant::now() >= end,
            None => false,
        }
    }
}

/// Median-of-repeats timing of `f`, in seconds per call.
pub(crate) fn measure<F: FnMut()>(gran: Duration, mut f: F) -> f64 {
    let floor = gran * MIN_BLOCKS;
    let mut iters: u32 = 1;
    // grow the block until it is long enough to trust the clock
    loop {
        let t0 = Instant::now();
        for _ in 0..iters {
            f();
        }
        let d = t0.elapsed();
        if d >= floor {
            break;
        }
        iters = iters.saturating_mul(2);
    }
    let mut samples = [0.0f64; REPEATS];
    for s in samples.iter_mut() {
        let t0 = Instant::now();
        for _ in 0..iters {
            f();
        }
        *s = t0.elapsed().as_secs_f64() / iters as f64;
    }
    samples.sort_by(|a, b| a.partial_cmp(b).unwrap());
    (samples[REPEATS / 2 - 1] + samples[REPEATS / 2]) / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn granularity_is_positive() {
        assert!(!granularity().is_zero());
    }

    #[test]
    fn measure_orders_workloads() {
        let gran = granularity();
        let mut sink = 0u64;
        let small = measure(gran, || {
            for i in 0..100u64 {
                sink = sink.wrapping_add(i * i);
            }
        });
        let large = measure(gran, || {
            for i in 0..20_000u64 {
                sink = sink.wrapping_add(i * i);
            }
        });
        core::hint::black_box(sink);
        assert!(large > small);
    }

    #[test]
    fn deadline_expires() {
        let d = Deadline::start(Some(Duration::from_nanos(1)));
        std::thread::sleep(Duration::from_millis(1));
        assert!(d.expired());
        assert!(!Deadline::start(None).expired());
    }
}
