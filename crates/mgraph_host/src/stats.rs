//! Latency statistics for the query benchmark.
//!
//! Accumulates per-shot query latencies into a power-of-two histogram.
//! Trackers are mergeable so that each rayon worker can fill its own and the
//! results can be reduced without locking.

const NUM_BUCKETS: usize = 40;

/// Tracks latency statistics with minimal overhead.
///
/// Bucket i counts samples in `[2^i, 2^(i+1))` nanoseconds, with bucket 0
/// also holding zero-length samples and the last bucket absorbing the tail.
#[derive(Clone, Debug)]
pub struct LatencyStats {
    pub min: u64,
    pub max: u64,
    pub sum: u64,
    pub count: u64,
    pub buckets: [u64; NUM_BUCKETS],
}

impl Default for LatencyStats {
    fn default() -> Self {
        Self::new()
    }
}

impl LatencyStats {
    pub fn new() -> Self {
        Self {
            min: u64::MAX,
            max: 0,
            sum: 0,
            count: 0,
            buckets: [0; NUM_BUCKETS],
        }
    }

    /// Records a latency measurement in nanoseconds.
    pub fn update(&mut self, nanos: u64) {
        self.min = self.min.min(nanos);
        self.max = self.max.max(nanos);
        self.sum = self.sum.saturating_add(nanos);
        self.count += 1;
        self.buckets[bucket_of(nanos)] += 1;
    }

    /// Folds another tracker into this one.
    pub fn merge(mut self, other: Self) -> Self {
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
        self.sum = self.sum.saturating_add(other.sum);
        self.count += other.count;
        for (a, b) in self.buckets.iter_mut().zip(other.buckets) {
            *a += b;
        }
        self
    }

    pub fn avg(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum as f64 / self.count as f64
        }
    }

    /// Upper bucket edge below which at least `q` of the samples fall.
    pub fn quantile_upper_bound(&self, q: f64) -> u64 {
        let target = (q * self.count as f64).ceil() as u64;
        let mut seen = 0;
        for (i, &c) in self.buckets.iter().enumerate() {
            seen += c;
            if seen >= target && c > 0 {
                return 1u64 << (i + 1);
            }
        }
        self.max
    }

    pub fn print_report(&self) {
        println!("\nLatency Metrics (per shot)");
        println!("Count: {}", self.count);
        if self.count == 0 {
            return;
        }

        println!("Min:   {}", format_nanos(self.min as f64));
        println!("Avg:   {}", format_nanos(self.avg()));
        println!("p99 <= {}", format_nanos(self.quantile_upper_bound(0.99) as f64));
        println!("Max:   {}", format_nanos(self.max as f64));

        println!("Distribution (power-of-two buckets):");
        for (i, &count) in self.buckets.iter().enumerate() {
            if count > 0 {
                let lower = if i == 0 { 0 } else { 1u64 << i };
                let upper = 1u64 << (i + 1);
                let tail = if i == NUM_BUCKETS - 1 { "+" } else { "" };
                println!(
                    "[{:>10} - {:>10}{}]: {}",
                    format_nanos(lower as f64),
                    format_nanos(upper as f64),
                    tail,
                    count
                );
            }
        }
    }
}

fn bucket_of(nanos: u64) -> usize {
    if nanos == 0 {
        0
    } else {
        (63 - nanos.leading_zeros() as usize).min(NUM_BUCKETS - 1)
    }
}

fn format_nanos(nanos: f64) -> String {
    if nanos < 1_000.0 {
        format!("{:.0} ns", nanos)
    } else if nanos < 1_000_000.0 {
        format!("{:.2} us", nanos / 1_000.0)
    } else {
        format!("{:.2} ms", nanos / 1_000_000.0)
    }
}
