//! Adaptive histogram binning
//!
//! Bucket count follows the square-root rule, capped so rendering stays cheap.

use serde::{Deserialize, Serialize};

use crate::core::stats::finite_values;

/// Upper bound on the number of buckets
pub const MAX_BUCKETS: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    /// Midpoint of the bucket
    pub center: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Histogram {
    pub bins: Vec<HistogramBin>,
    pub min_val: f64,
    pub max_val: f64,
    pub bucket_width: f64,
}

impl Histogram {
    /// Lower edge of bucket `index`
    pub fn bucket_start(&self, index: usize) -> f64 {
        self.min_val + index as f64 * self.bucket_width
    }

    /// Axis domain; with limit overlay it widens to enclose whichever limits are set
    pub fn domain(&self, lo: Option<f64>, hi: Option<f64>) -> (f64, f64) {
        let mut low = self.min_val;
        let mut high = self.max_val;
        for limit in [lo, hi].into_iter().flatten() {
            low = low.min(limit);
            high = high.max(limit);
        }
        (low, high)
    }

    /// Largest bucket population
    pub fn peak(&self) -> usize {
        self.bins.iter().map(|b| b.count).max().unwrap_or(0)
    }
}

/// Number of buckets for a sample of `n` values: `min(30, ceil(sqrt(n)))`
pub fn bucket_count(n: usize) -> usize {
    ((n as f64).sqrt().ceil() as usize).clamp(1, MAX_BUCKETS)
}

/// Bucket a sample; `None` when no usable value remains
///
/// An all-equal sample collapses to one bucket of width 1.
pub fn build_histogram<I>(values: I) -> Option<Histogram>
where
    I: IntoIterator<Item = Option<f64>>,
{
    let values = finite_values(values);
    if values.is_empty() {
        return None;
    }

    let min_val = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max_val = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max_val - min_val;

    let (buckets, bucket_width) = if range == 0.0 {
        (1, 1.0)
    } else {
        let buckets = bucket_count(values.len());
        (buckets, range / buckets as f64)
    };

    let mut counts = vec![0usize; buckets];
    for value in &values {
        let index = ((value - min_val) / bucket_width).floor() as usize;
        counts[index.min(buckets - 1)] += 1;
    }

    let bins = counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBin {
            center: min_val + i as f64 * bucket_width + bucket_width / 2.0,
            count,
        })
        .collect();

    Some(Histogram {
        bins,
        min_val,
        max_val,
        bucket_width,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(values: &[f64]) -> Vec<Option<f64>> {
        values.iter().copied().map(Some).collect()
    }

    #[test]
    fn test_empty_sample() {
        assert!(build_histogram(Vec::new()).is_none());
        assert!(build_histogram(vec![None]).is_none());
    }

    #[test]
    fn test_bucket_count_rule() {
        assert_eq!(bucket_count(1), 1);
        assert_eq!(bucket_count(4), 2);
        assert_eq!(bucket_count(10), 4);
        assert_eq!(bucket_count(900), 30);
        assert_eq!(bucket_count(100_000), 30);
    }

    #[test]
    fn test_degenerate_sample_single_bucket() {
        let hist = build_histogram(sample(&[1.0, 1.0, 1.0, 1.0])).unwrap();
        assert_eq!(hist.bins.len(), 1);
        assert_eq!(hist.bins[0].count, 4);
        assert_eq!(hist.bucket_width, 1.0);
        assert_eq!(hist.bins[0].center, 1.5);
    }

    #[test]
    fn test_max_value_lands_in_last_bucket() {
        let hist = build_histogram(sample(&[0.0, 1.0, 2.0, 3.0])).unwrap();
        // 2 buckets of width 1.5: [0, 1.5) and [1.5, 3]
        assert_eq!(hist.bins.len(), 2);
        assert_eq!(hist.bucket_width, 1.5);
        assert_eq!(hist.bins[0].count, 2);
        assert_eq!(hist.bins[1].count, 2);
        assert_eq!(hist.bins[0].center, 0.75);
        assert_eq!(hist.bins[1].center, 2.25);
    }

    #[test]
    fn test_counts_cover_every_value() {
        let values: Vec<f64> = (0..1000).map(|i| (i as f64 * 0.37).sin()).collect();
        let hist = build_histogram(sample(&values)).unwrap();
        assert_eq!(hist.bins.len(), 30);
        let total: usize = hist.bins.iter().map(|b| b.count).sum();
        assert_eq!(total, 1000);
    }

    #[test]
    fn test_domain_encloses_limits() {
        let hist = build_histogram(sample(&[2.0, 3.0, 4.0])).unwrap();
        assert_eq!(hist.domain(None, None), (2.0, 4.0));
        assert_eq!(hist.domain(Some(0.5), None), (0.5, 4.0));
        assert_eq!(hist.domain(None, Some(10.0)), (2.0, 10.0));
        assert_eq!(hist.domain(Some(2.5), Some(3.5)), (2.0, 4.0));
    }
}
