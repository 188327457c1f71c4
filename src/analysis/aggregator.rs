//! Sample aggregation and statistics.
//!
//! This module folds per-system counts into sample totals and derives
//! per-system averages and, optionally, per-metric distributions.

use crate::error::{Result, SampleError};
use crate::models::{Metric, MetricAverages, MetricDistribution, SampleResult, SystemCounts};

/// Streaming accumulator over per-system counts.
///
/// Partial aggregators can be combined with [`Aggregator::merge`]; the sums
/// are order independent, so the result never depends on the order systems
/// were added or merged in.
#[derive(Debug, Clone, Default)]
pub struct Aggregator {
    totals: SystemCounts,
    systems: u64,
    /// Per-system values, kept only when a distribution is wanted.
    values: Option<Vec<SystemCounts>>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Aggregator that also keeps per-system values for [`Aggregator::distribution`].
    pub fn with_distribution() -> Self {
        Self {
            values: Some(Vec::new()),
            ..Self::default()
        }
    }

    /// Add one system's contribution.
    pub fn add(&mut self, counts: SystemCounts) {
        self.totals += counts;
        self.systems += 1;
        if let Some(ref mut values) = self.values {
            values.push(counts);
        }
    }

    /// Combine with another partial aggregator.
    ///
    /// Distribution values survive only if both sides kept them.
    #[allow(dead_code)] // Reduction step for split samples
    pub fn merge(&mut self, other: Aggregator) {
        self.totals += other.totals;
        self.systems += other.systems;
        self.values = match (self.values.take(), other.values) {
            (Some(mut mine), Some(theirs)) => {
                mine.extend(theirs);
                Some(mine)
            }
            _ => None,
        };
    }

    /// Number of systems added so far.
    #[allow(dead_code)]
    pub fn systems(&self) -> u64 {
        self.systems
    }

    /// Totals and averages over everything added.
    pub fn finish(&self) -> Result<SampleResult> {
        if self.systems == 0 {
            return Err(SampleError::EmptySample);
        }

        let n = self.systems as f64;
        let average = |metric: Metric| self.totals.get(metric) as f64 / n;

        Ok(SampleResult {
            sample_size: self.systems,
            totals: self.totals,
            averages: MetricAverages {
                playbook_cves: average(Metric::PlaybookCves),
                manual_cves: average(Metric::ManualCves),
                unfixed_cves: average(Metric::UnfixedCves),
                unfixed_packages: average(Metric::UnfixedPackages),
                total_packages: average(Metric::TotalPackages),
            },
        })
    }

    /// Per-metric distribution, if values were kept.
    pub fn distribution(&self) -> Option<Result<Vec<MetricDistribution>>> {
        let values = self.values.as_ref()?;
        if values.is_empty() {
            return Some(Err(SampleError::EmptySample));
        }

        Some(Ok(Metric::ALL
            .iter()
            .map(|metric| {
                let mut column: Vec<u64> = values.iter().map(|c| c.get(*metric)).collect();
                describe(*metric, &mut column)
            })
            .collect()))
    }
}

/// Aggregate an already materialised sample.
#[allow(dead_code)] // Convenience over Aggregator for in-memory samples
pub fn aggregate(counts: &[SystemCounts]) -> Result<SampleResult> {
    let mut aggregator = Aggregator::new();
    for c in counts {
        aggregator.add(*c);
    }
    aggregator.finish()
}

/// Summary statistics of one non-empty column.
///
/// The column is sorted first, so the floating point sums run in a fixed
/// order regardless of the sample order.
fn describe(metric: Metric, column: &mut [u64]) -> MetricDistribution {
    column.sort_unstable();

    let count = column.len();
    let total: u64 = column.iter().sum();
    let mean = total as f64 / count as f64;

    let std = if count > 1 {
        let squares: f64 = column
            .iter()
            .map(|v| {
                let d = *v as f64 - mean;
                d * d
            })
            .sum();
        Some((squares / (count - 1) as f64).sqrt())
    } else {
        None
    };

    MetricDistribution {
        metric,
        count: count as u64,
        mean,
        std,
        min: column[0],
        p25: quantile(column, 0.25),
        p50: quantile(column, 0.5),
        p75: quantile(column, 0.75),
        max: column[count - 1],
    }
}

/// Linear-interpolated quantile of a sorted, non-empty column.
fn quantile(sorted: &[u64], q: f64) -> f64 {
    let position = q * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let low = sorted[lower] as f64;
    let high = sorted[upper] as f64;
    low + (high - low) * (position - lower as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(values: [u64; 5]) -> SystemCounts {
        SystemCounts {
            playbook_cves: values[0],
            manual_cves: values[1],
            unfixed_cves: values[2],
            unfixed_packages: values[3],
            total_packages: values[4],
        }
    }

    fn sample() -> Vec<SystemCounts> {
        vec![
            counts([3, 1, 4, 1, 500]),
            counts([0, 0, 0, 0, 0]),
            counts([9, 2, 6, 5, 812]),
            counts([1, 0, 7, 3, 129]),
            counts([2, 8, 1, 1, 333]),
        ]
    }

    #[test]
    fn test_two_system_scenario() {
        // {packages: 2, [PlaybookFixable, Unfixed]} and {packages: 3, []}
        let result = aggregate(&[counts([1, 0, 1, 1, 2]), counts([0, 0, 0, 0, 3])]).unwrap();
        assert_eq!(result.sample_size, 2);
        assert_eq!(result.totals, counts([1, 0, 1, 1, 5]));
        assert_eq!(result.averages.playbook_cves, 0.5);
        assert_eq!(result.averages.manual_cves, 0.0);
        assert_eq!(result.averages.unfixed_cves, 0.5);
        assert_eq!(result.averages.unfixed_packages, 0.5);
        assert_eq!(result.averages.total_packages, 2.5);
    }

    #[test]
    fn test_average_uses_real_division() {
        let result = aggregate(&[counts([1, 0, 0, 0, 1]), counts([0, 0, 0, 0, 0]), counts([0, 0, 0, 0, 0])])
            .unwrap();
        assert!((result.averages.playbook_cves - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_system_stays_in_denominator() {
        let result = aggregate(&[counts([4, 0, 0, 0, 10]), counts([0, 0, 0, 0, 0])]).unwrap();
        assert_eq!(result.averages.playbook_cves, 2.0);
        assert_eq!(result.averages.total_packages, 5.0);
    }

    #[test]
    fn test_empty_sample() {
        assert!(matches!(aggregate(&[]), Err(SampleError::EmptySample)));
        assert!(matches!(
            Aggregator::with_distribution().distribution(),
            Some(Err(SampleError::EmptySample))
        ));
    }

    #[test]
    fn test_permutation_invariance() {
        let forward = sample();
        let mut reversed = sample();
        reversed.reverse();
        let mut rotated = sample();
        rotated.rotate_left(2);

        let expected = aggregate(&forward).unwrap();
        assert_eq!(aggregate(&reversed).unwrap(), expected);
        assert_eq!(aggregate(&rotated).unwrap(), expected);
    }

    #[test]
    fn test_repeated_aggregation_is_identical() {
        let values = sample();
        let first = aggregate(&values).unwrap();
        let second = aggregate(&values).unwrap();
        assert_eq!(first, second);
        for metric in Metric::ALL {
            assert_eq!(
                first.averages.get(metric).to_bits(),
                second.averages.get(metric).to_bits()
            );
        }
    }

    #[test]
    fn test_merge_matches_single_pass() {
        let values = sample();
        let mut left = Aggregator::with_distribution();
        let mut right = Aggregator::with_distribution();
        for (i, c) in values.iter().enumerate() {
            if i % 2 == 0 {
                left.add(*c);
            } else {
                right.add(*c);
            }
        }
        right.merge(left);

        let mut single = Aggregator::with_distribution();
        for c in &values {
            single.add(*c);
        }

        assert_eq!(right.systems(), 5);
        assert_eq!(right.finish().unwrap(), single.finish().unwrap());
        assert_eq!(
            right.distribution().unwrap().unwrap(),
            single.distribution().unwrap().unwrap()
        );
    }

    #[test]
    fn test_merge_drops_distribution_when_one_side_lacks_it() {
        let mut left = Aggregator::with_distribution();
        left.add(counts([1, 1, 1, 1, 1]));
        let mut right = Aggregator::new();
        right.add(counts([1, 1, 1, 1, 1]));
        left.merge(right);
        assert!(left.distribution().is_none());
        assert_eq!(left.finish().unwrap().sample_size, 2);
    }

    #[test]
    fn test_distribution_statistics() {
        let mut aggregator = Aggregator::with_distribution();
        for c in sample() {
            aggregator.add(c);
        }
        let distribution = aggregator.distribution().unwrap().unwrap();
        assert_eq!(distribution.len(), 5);

        // playbook column sorted: [0, 1, 2, 3, 9]
        let playbook = &distribution[0];
        assert_eq!(playbook.metric, Metric::PlaybookCves);
        assert_eq!(playbook.count, 5);
        assert_eq!(playbook.mean, 3.0);
        assert_eq!(playbook.min, 0);
        assert_eq!(playbook.p25, 1.0);
        assert_eq!(playbook.p50, 2.0);
        assert_eq!(playbook.p75, 3.0);
        assert_eq!(playbook.max, 9);
        // squared deviations: 9 + 4 + 1 + 0 + 36 = 50, / 4 = 12.5
        assert!((playbook.std.unwrap() - 12.5f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_quantile_interpolates() {
        assert_eq!(quantile(&[10, 20], 0.25), 12.5);
        assert_eq!(quantile(&[10, 20, 30, 40], 0.5), 25.0);
        assert_eq!(quantile(&[7], 0.75), 7.0);
    }

    #[test]
    fn test_single_system_has_no_std() {
        let mut aggregator = Aggregator::with_distribution();
        aggregator.add(counts([1, 2, 3, 4, 5]));
        let distribution = aggregator.distribution().unwrap().unwrap();
        assert!(distribution.iter().all(|d| d.std.is_none()));
    }
}
