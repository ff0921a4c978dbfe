//! Experiment statistics.
//!
//! This module holds the counters the experiment harness reports. It provides:
//! 1. **Rows:** [`StatRow`], one whitespace-separated line of counters.
//! 2. **Histograms:** [`LeakageHistogram`], per-predictor bucket counts with
//!    out-of-range values folded into the last bucket.
//! 3. **Means:** [`mean`], the integer average used by the sweep experiments.

use std::fmt;

/// One output row: counters separated by single spaces.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StatRow {
    values: Vec<u64>,
}

impl StatRow {
    /// Creates an empty row.
    pub const fn new() -> Self {
        Self { values: Vec::new() }
    }

    /// Creates an empty row with room for `capacity` counters.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            values: Vec::with_capacity(capacity),
        }
    }

    /// Appends one counter.
    pub fn push(&mut self, value: u64) {
        self.values.push(value);
    }

    /// Counters in output order.
    pub fn values(&self) -> &[u64] {
        &self.values
    }

    /// Number of counters.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the row has no counters.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl From<Vec<u64>> for StatRow {
    fn from(values: Vec<u64>) -> Self {
        Self { values }
    }
}

impl FromIterator<u64> for StatRow {
    fn from_iter<I: IntoIterator<Item = u64>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for StatRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, value) in self.values.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{value}")?;
        }
        Ok(())
    }
}

/// Bucketed leakage counts, `buckets` slots per predictor.
///
/// Bucket `b` of predictor `p` counts the repetitions in which `b` secrets
/// leaked through `p`. Values at or past the last bucket land in it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LeakageHistogram {
    counts: Vec<u64>,
    buckets: usize,
}

impl LeakageHistogram {
    /// Creates a zeroed histogram; `buckets` is clamped to at least one.
    pub fn new(predictors: usize, buckets: usize) -> Self {
        let buckets = buckets.max(1);
        Self {
            counts: vec![0; predictors * buckets],
            buckets,
        }
    }

    /// Records one observation of `value` for `predictor`.
    pub fn record(&mut self, predictor: usize, value: usize) {
        let bucket = value.min(self.buckets - 1);
        if let Some(slot) = self.counts.get_mut(predictor * self.buckets + bucket) {
            *slot += 1;
        }
    }

    /// Count in one bucket.
    pub fn count(&self, predictor: usize, bucket: usize) -> u64 {
        if bucket >= self.buckets {
            return 0;
        }
        self.counts
            .get(predictor * self.buckets + bucket)
            .copied()
            .unwrap_or(0)
    }

    /// Buckets per predictor.
    pub const fn buckets(&self) -> usize {
        self.buckets
    }

    /// All counts flattened predictor-major into one row.
    pub fn to_row(&self) -> StatRow {
        StatRow::from(self.counts.clone())
    }
}

/// Integer mean of `total` over `samples`, zero when there are no samples.
pub const fn mean(total: u64, samples: u64) -> u64 {
    if samples == 0 { 0 } else { total / samples }
}
