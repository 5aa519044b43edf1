//! Test catalog merging across files
//!
//! Counts are summed per test number and fail rates are weighted by count.
//! Descriptive fields are first-wins: the first non-empty value seen is kept.
//! Only call this for files that passed [`ensure_mergeable`](crate::core::identity::ensure_mergeable).

use std::collections::BTreeMap;

use tracing::debug;

use crate::entities::TestMetadata;

#[derive(Debug)]
struct Accumulator {
    merged: TestMetadata,
    weighted_fail: f64,
}

/// Merge per-file catalogs into one catalog sorted by test number
pub fn merge_catalogs<'a, I>(catalogs: I) -> Vec<TestMetadata>
where
    I: IntoIterator<Item = &'a [TestMetadata]>,
{
    let mut by_test: BTreeMap<u32, Accumulator> = BTreeMap::new();

    for catalog in catalogs {
        for test in catalog {
            let acc = by_test.entry(test.test_num).or_insert_with(|| Accumulator {
                merged: TestMetadata::new(test.test_num),
                weighted_fail: 0.0,
            });

            acc.merged.count += test.count;
            acc.weighted_fail += test.fail_rate * test.count as f64;

            let merged = &mut acc.merged;
            if merged.test_txt.is_empty() && !test.test_txt.is_empty() {
                merged.test_txt = test.test_txt.clone();
            }
            if merged.units.is_empty() && !test.units.is_empty() {
                merged.units = test.units.clone();
            }
            if merged.lo_limit.is_none() {
                merged.lo_limit = test.lo_limit;
            }
            if merged.hi_limit.is_none() {
                merged.hi_limit = test.hi_limit;
            }
        }
    }

    debug!(tests = by_test.len(), "merged test catalogs");

    by_test
        .into_values()
        .map(|acc| {
            let mut merged = acc.merged;
            merged.fail_rate = if merged.count > 0 {
                round2(acc.weighted_fail / merged.count as f64)
            } else {
                0.0
            };
            merged
        })
        .collect()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Order a catalog by fail rate, worst first, ties by test number
pub fn sort_by_fail_rate(catalog: &mut [TestMetadata]) {
    catalog.sort_by(|a, b| {
        b.fail_rate
            .total_cmp(&a.fail_rate)
            .then(a.test_num.cmp(&b.test_num))
    });
}
