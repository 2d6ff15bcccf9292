#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
use core::arch::x86_64::_rdtsc;
use std::time::{Duration, Instant};

/// High-resolution timer used by `engine_demo`'s latency histogram.
///
/// Uses the CPU timestamp counter on x86/x86_64, falls back to
/// `Instant::now()` elsewhere (e.g. Apple Silicon). Lock-free, no
/// allocations.
pub struct HighResolutionCounter {
    start_cycles: u64,
    start_time: Instant,
    cpu_ghz: f64,
}

impl HighResolutionCounter {
    /// `cpu_ghz` is the CPU's base frequency in GHz (e.g. 3.5, 5.0); used
    /// only on the TSC-backed path to convert cycles to nanoseconds.
    pub fn start(cpu_ghz: f64) -> Self {
        #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
        let start_cycles = unsafe { _rdtsc() };

        #[cfg(not(any(target_arch = "x86", target_arch = "x86_64")))]
        let start_cycles = 0;

        Self {
            start_cycles,
            start_time: Instant::now(),
            cpu_ghz,
        }
    }

    pub fn ns(&self) -> u128 {
        #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
        {
            let end = unsafe { _rdtsc() };
            let delta_cycles = end - self.start_cycles;
            return (delta_cycles as f64 / self.cpu_ghz) as u128;
        }

        #[cfg(not(any(target_arch = "x86", target_arch = "x86_64")))]
        {
            return self.start_time.elapsed().as_nanos();
        }
    }

    pub fn us(&self) -> f64 {
        self.ns() as f64 / 1_000.0
    }

    pub fn ms(&self) -> f64 {
        self.ns() as f64 / 1_000_000.0
    }

    pub fn duration(&self) -> Duration {
        Duration::from_nanos(self.ns() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elapsed_time_is_nondecreasing() {
        let timer = HighResolutionCounter::start(3.0);
        let a = timer.ns();
        std::thread::sleep(Duration::from_micros(50));
        let b = timer.ns();
        assert!(b >= a);
    }
}
