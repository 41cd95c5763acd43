//! Data Processor Module
//! Feature scaling and summaries over loaded loan records.

use crate::data::loader::{LoanRecord, LoanStatus};
use std::collections::BTreeMap;

/// Smallest sphere radius in scene units.
pub const BASE_RADIUS: f64 = 0.002;
/// Extra radius added for the largest balance.
pub const RADIUS_SPAN: f64 = 0.002;

/// Raw `[term_or_age, balance, rate]` triple per record.
pub fn feature_points(records: &[LoanRecord]) -> Vec<[f64; 3]> {
    records
        .iter()
        .map(|r| [r.term_or_age_months, r.balance, r.rate])
        .collect()
}

/// Per-column (min, max) of a set of points.
pub fn column_bounds(points: &[[f64; 3]]) -> Option<[(f64, f64); 3]> {
    let first = points.first()?;
    let mut bounds = [
        (first[0], first[0]),
        (first[1], first[1]),
        (first[2], first[2]),
    ];

    for p in &points[1..] {
        for (axis, bound) in bounds.iter_mut().enumerate() {
            bound.0 = bound.0.min(p[axis]);
            bound.1 = bound.1.max(p[axis]);
        }
    }

    Some(bounds)
}

/// Min-max scale each column to [0, 1].
///
/// A column with no spread maps every value to 0.
pub fn scale_features(points: &[[f64; 3]]) -> Vec<[f64; 3]> {
    let Some(bounds) = column_bounds(points) else {
        return Vec::new();
    };

    points
        .iter()
        .map(|p| {
            let mut scaled = [0.0; 3];
            for axis in 0..3 {
                let (min, max) = bounds[axis];
                scaled[axis] = (p[axis] - min) / non_zero_range(min, max);
            }
            scaled
        })
        .collect()
}

/// Sphere radius for a balance, growing linearly from `BASE_RADIUS`.
pub fn balance_radius(balance: f64, min: f64, max: f64) -> f64 {
    let normalized = (balance - min) / non_zero_range(min, max);
    BASE_RADIUS + RADIUS_SPAN * normalized
}

fn non_zero_range(min: f64, max: f64) -> f64 {
    let range = max - min;
    if range == 0.0 {
        1.0
    } else {
        range
    }
}

/// Counts and ranges shown in the control panel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PortfolioSummary {
    pub total: usize,
    pub added: usize,
    pub removed: usize,
    /// Record count per cluster id; records without a cluster are keyed as 0.
    pub clusters: BTreeMap<i64, usize>,
    pub term_range: Option<(f64, f64)>,
    pub balance_range: Option<(f64, f64)>,
    pub rate_range: Option<(f64, f64)>,
}

impl PortfolioSummary {
    pub fn from_records(records: &[LoanRecord]) -> Self {
        let mut summary = PortfolioSummary {
            total: records.len(),
            ..Default::default()
        };

        for record in records {
            match record.status {
                LoanStatus::Added => summary.added += 1,
                LoanStatus::Removed => summary.removed += 1,
            }
            *summary
                .clusters
                .entry(record.cluster.unwrap_or(0))
                .or_default() += 1;
        }

        if let Some(bounds) = column_bounds(&feature_points(records)) {
            summary.term_range = Some(bounds[0]);
            summary.balance_range = Some(bounds[1]);
            summary.rate_range = Some(bounds[2]);
        }

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn record(balance: f64, rate: f64, term: f64, status: LoanStatus) -> LoanRecord {
        LoanRecord {
            balance,
            rate,
            term_or_age_months: term,
            status,
            cluster: None,
        }
    }

    #[test]
    fn test_scale_features_range() {
        let points = vec![[12.0, 1000.0, 4.0], [96.0, 50500.0, 8.0], [180.0, 100000.0, 12.0]];
        let scaled = scale_features(&points);

        assert_eq!(scaled.len(), 3);
        assert_relative_eq!(scaled[0][0], 0.0);
        assert_relative_eq!(scaled[2][0], 1.0);
        assert_relative_eq!(scaled[1][0], 0.5);
        assert_relative_eq!(scaled[1][1], 0.5);
        assert_relative_eq!(scaled[1][2], 0.5);
        for p in &scaled {
            for v in p {
                assert!((0.0..=1.0).contains(v));
            }
        }
    }

    #[test]
    fn test_scale_features_constant_column() {
        let points = vec![[60.0, 1000.0, 5.0], [60.0, 2000.0, 7.0]];
        let scaled = scale_features(&points);
        assert_eq!(scaled[0][0], 0.0);
        assert_eq!(scaled[1][0], 0.0);
        assert_relative_eq!(scaled[1][1], 1.0);
    }

    #[test]
    fn test_scale_features_empty() {
        assert!(scale_features(&[]).is_empty());
        assert!(column_bounds(&[]).is_none());
    }

    #[test]
    fn test_balance_radius() {
        assert_relative_eq!(balance_radius(1000.0, 1000.0, 3000.0), 0.002);
        assert_relative_eq!(balance_radius(3000.0, 1000.0, 3000.0), 0.004);
        assert_relative_eq!(balance_radius(2000.0, 1000.0, 3000.0), 0.003);
        // Single balance: no spread, smallest radius.
        assert_relative_eq!(balance_radius(500.0, 500.0, 500.0), 0.002);
    }

    #[test]
    fn test_summary_counts() {
        let mut records = vec![
            record(1000.0, 4.0, 12.0, LoanStatus::Added),
            record(2000.0, 5.0, 24.0, LoanStatus::Removed),
            record(3000.0, 6.0, 36.0, LoanStatus::Added),
        ];
        records[0].cluster = Some(2);
        records[1].cluster = Some(2);

        let summary = PortfolioSummary::from_records(&records);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.added, 2);
        assert_eq!(summary.removed, 1);
        assert_eq!(summary.clusters.get(&2), Some(&2));
        assert_eq!(summary.clusters.get(&0), Some(&1));
        assert_eq!(summary.balance_range, Some((1000.0, 3000.0)));
        assert_eq!(summary.term_range, Some((12.0, 36.0)));
    }

    #[test]
    fn test_summary_empty() {
        let summary = PortfolioSummary::from_records(&[]);
        assert_eq!(summary.total, 0);
        assert!(summary.rate_range.is_none());
    }
}
