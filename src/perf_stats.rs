//! Latency percentile reporting for `engine_demo`'s per-message timings.

/// Percentile cutpoints this report tracks, in display order.
const PERCENTILES: &[f64] = &[
    10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0, 80.0, 90.0, 95.0, 96.0, 97.0, 98.0, 99.0, 99.9,
    100.0,
];

/// Nearest-rank percentile samples over one latency run, in the same order
/// as [`PERCENTILES`].
pub struct Stats {
    samples: Vec<(f64, u32)>,
}

impl Stats {
    /// The sample nearest to `percentile`, or `None` if it wasn't one of
    /// the tracked cutpoints.
    pub fn at(&self, percentile: f64) -> Option<u32> {
        self.samples
            .iter()
            .find(|(p, _)| (*p - percentile).abs() < f64::EPSILON)
            .map(|(_, v)| *v)
    }

    pub fn median(&self) -> u32 {
        self.at(50.0).unwrap_or(0)
    }

    pub fn max(&self) -> u32 {
        self.at(100.0).unwrap_or(0)
    }
}

/// Computes nearest-rank percentile stats over `data`. Sorts `data` in
/// place; returns `None` for an empty run (there is nothing to report).
pub fn calculate_perf(mut data: Vec<u32>) -> Option<Stats> {
    if data.is_empty() {
        return None;
    }
    data.sort_unstable();
    let len = data.len();
    let nearest_rank = |percentile: f64| -> u32 {
        if percentile >= 100.0 {
            return data[len - 1];
        }
        let rank = (percentile / 100.0 * len as f64).ceil() as usize;
        data[rank.saturating_sub(1).min(len - 1)]
    };
    let samples = PERCENTILES
        .iter()
        .map(|&p| (p, nearest_rank(p)))
        .collect();
    Some(Stats { samples })
}

pub fn print_stats(stats: &Stats) {
    println!("--- latency percentiles (ns) ---");
    for &(percentile, value) in &stats.samples {
        println!("p{percentile:<5}: {value}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_yields_none() {
        assert!(calculate_perf(Vec::new()).is_none());
    }

    #[test]
    fn single_value_is_every_percentile() {
        let stats = calculate_perf(vec![42]).unwrap();
        assert_eq!(stats.median(), 42);
        assert_eq!(stats.max(), 42);
    }

    #[test]
    fn percentiles_are_nondecreasing() {
        let stats = calculate_perf((1..=1000).collect()).unwrap();
        assert!(stats.at(10.0) <= stats.at(50.0));
        assert!(stats.at(50.0) <= stats.at(90.0));
        assert!(stats.at(90.0) <= stats.at(99.0));
        assert!(stats.at(99.0) <= stats.at(100.0));
    }

    #[test]
    fn untracked_percentile_is_none() {
        let stats = calculate_perf(vec![1, 2, 3]).unwrap();
        assert!(stats.at(33.0).is_none());
    }
}
