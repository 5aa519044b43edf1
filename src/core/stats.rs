//! Descriptive statistics and process capability for a measurement sample
//!
//! Standard deviation is the population form (divide by n). Capability
//! indices follow the usual definitions:
//! - Cp  = (USL - LSL) / (6σ)
//! - Cpu = (USL - μ) / (3σ)
//! - Cpl = (μ - LSL) / (3σ)
//! - Cpk = min(Cpu, Cpl), or whichever side exists for one-sided limits

use serde::{Deserialize, Serialize};

use crate::entities::within_limits;

/// Summary of a sample against optional specification limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityStats {
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub pass_count: usize,
    pub fail_count: usize,
    pub lo_limit: Option<f64>,
    pub hi_limit: Option<f64>,
    pub cp: Option<f64>,
    pub cpk: Option<f64>,
    pub cpu: Option<f64>,
    pub cpl: Option<f64>,
}

impl CapabilityStats {
    /// Sample size the statistics were computed from
    pub fn count(&self) -> usize {
        self.pass_count + self.fail_count
    }
}

/// Drop missing and non-finite values
pub fn finite_values<I>(values: I) -> Vec<f64>
where
    I: IntoIterator<Item = Option<f64>>,
{
    values
        .into_iter()
        .flatten()
        .filter(|v| v.is_finite())
        .collect()
}

/// Compute statistics; `None` when no usable value remains
pub fn capability_stats<I>(values: I, lo: Option<f64>, hi: Option<f64>) -> Option<CapabilityStats>
where
    I: IntoIterator<Item = Option<f64>>,
{
    let mut sorted = finite_values(values);
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(f64::total_cmp);

    let n = sorted.len();
    let mean = sorted.iter().sum::<f64>() / n as f64;
    let median = if n % 2 == 0 {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    } else {
        sorted[n / 2]
    };
    let variance = sorted.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n as f64;
    let std_dev = variance.sqrt();

    let pass_count = sorted.iter().filter(|&&x| within_limits(x, lo, hi)).count();
    let indices = capability_indices(mean, std_dev, lo, hi);

    Some(CapabilityStats {
        mean,
        median,
        std_dev,
        min: sorted[0],
        max: sorted[n - 1],
        pass_count,
        fail_count: n - pass_count,
        lo_limit: lo,
        hi_limit: hi,
        cp: indices.cp,
        cpk: indices.cpk,
        cpu: indices.cpu,
        cpl: indices.cpl,
    })
}

/// Cp/Cpk/Cpu/Cpl for a known mean and spread
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CapabilityIndices {
    pub cp: Option<f64>,
    pub cpk: Option<f64>,
    pub cpu: Option<f64>,
    pub cpl: Option<f64>,
}

/// All indices are `None` for a zero-spread sample
pub fn capability_indices(
    mean: f64,
    std_dev: f64,
    lo: Option<f64>,
    hi: Option<f64>,
) -> CapabilityIndices {
    if std_dev.is_nan() || std_dev <= 0.0 {
        return CapabilityIndices::default();
    }

    let cpu = hi.map(|hi| (hi - mean) / (3.0 * std_dev));
    let cpl = lo.map(|lo| (mean - lo) / (3.0 * std_dev));

    match (lo, hi, cpu, cpl) {
        (Some(lo), Some(hi), Some(u), Some(l)) => CapabilityIndices {
            cp: Some((hi - lo) / (6.0 * std_dev)),
            cpk: Some(u.min(l)),
            cpu,
            cpl,
        },
        (None, Some(_), Some(u), None) => CapabilityIndices {
            cp: None,
            cpk: Some(u),
            cpu,
            cpl: None,
        },
        (Some(_), None, None, Some(l)) => CapabilityIndices {
            cp: None,
            cpk: Some(l),
            cpu: None,
            cpl,
        },
        _ => CapabilityIndices::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(values: &[f64]) -> Vec<Option<f64>> {
        values.iter().copied().map(Some).collect()
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn test_empty_sample() {
        assert!(capability_stats(Vec::new(), Some(0.0), Some(1.0)).is_none());
        assert!(capability_stats(vec![None, None], None, None).is_none());
    }

    #[test]
    fn test_descriptive_values() {
        let stats = capability_stats(sample(&[3.0, 1.0, 2.0, 10.0]), None, None).unwrap();
        assert!(approx(stats.mean, 4.0));
        assert!(approx(stats.median, 2.5));
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 10.0);
        // population variance: (9 + 1 + 4 + 36) / 4 = 12.5
        assert!(approx(stats.std_dev, 12.5_f64.sqrt()));
        assert_eq!(stats.count(), 4);
    }

    #[test]
    fn test_odd_median_and_nulls_ignored() {
        let stats =
            capability_stats(vec![Some(5.0), None, Some(1.0), Some(3.0)], None, None).unwrap();
        assert_eq!(stats.median, 3.0);
        assert_eq!(stats.count(), 3);
    }

    #[test]
    fn test_capability_both_limits() {
        // mean 5, population sigma 1
        let stats = capability_stats(sample(&[4.0, 6.0]), Some(2.0), Some(8.0)).unwrap();
        assert!(approx(stats.mean, 5.0));
        assert!(approx(stats.std_dev, 1.0));
        assert!(approx(stats.cp.unwrap(), 1.0));
        assert!(approx(stats.cpu.unwrap(), 1.0));
        assert!(approx(stats.cpl.unwrap(), 1.0));
        assert!(approx(stats.cpk.unwrap(), 1.0));
    }

    #[test]
    fn test_cpk_takes_worse_side() {
        let idx = capability_indices(6.0, 1.0, Some(0.0), Some(9.0));
        assert!(approx(idx.cpu.unwrap(), 1.0));
        assert!(approx(idx.cpl.unwrap(), 2.0));
        assert!(approx(idx.cpk.unwrap(), 1.0));
        assert!(approx(idx.cp.unwrap(), 1.5));
    }

    #[test]
    fn test_one_sided_limits() {
        let hi_only = capability_indices(5.0, 1.0, None, Some(8.0));
        assert_eq!(hi_only.cp, None);
        assert_eq!(hi_only.cpl, None);
        assert_eq!(hi_only.cpk, hi_only.cpu);
        assert!(approx(hi_only.cpk.unwrap(), 1.0));

        let lo_only = capability_indices(5.0, 1.0, Some(2.0), None);
        assert_eq!(lo_only.cp, None);
        assert_eq!(lo_only.cpu, None);
        assert_eq!(lo_only.cpk, lo_only.cpl);
    }

    #[test]
    fn test_no_limits_no_indices() {
        assert_eq!(
            capability_indices(5.0, 1.0, None, None),
            CapabilityIndices::default()
        );
    }

    #[test]
    fn test_zero_spread_has_no_indices() {
        let stats = capability_stats(sample(&[2.0, 2.0, 2.0]), Some(1.0), Some(3.0)).unwrap();
        assert_eq!(stats.std_dev, 0.0);
        assert_eq!(stats.cp, None);
        assert_eq!(stats.cpk, None);
        assert_eq!(stats.cpu, None);
        assert_eq!(stats.cpl, None);
        assert_eq!(stats.pass_count, 3);
    }

    #[test]
    fn test_pass_fail_counts() {
        let stats =
            capability_stats(sample(&[0.5, 1.0, 1.5, 2.0, 2.5]), Some(1.0), Some(2.0)).unwrap();
        assert_eq!(stats.pass_count, 3);
        assert_eq!(stats.fail_count, 2);
    }
}
