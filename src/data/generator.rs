//! Sample Data Generator
//! Produces clustered synthetic loan portfolios and writes them as CSV.

use crate::data::loader::{
    LoanRecord, LoanStatus, COL_BALANCE, COL_CLUSTER, COL_FLAG, COL_RATE, COL_TERM,
};
use log::info;
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::{Normal, NormalError};
use serde::Serialize;
use std::path::Path;
use thiserror::Error;

/// Default number of records used when generating sample data.
pub const DEFAULT_NUM_RECORDS: usize = 500;
pub const DEFAULT_CLUSTERS: usize = 4;

pub const BALANCE_BOUNDS: (f64, f64) = (1_000.0, 100_000.0);
pub const RATE_BOUNDS: (f64, f64) = (4.0, 12.0);
pub const TERM_BOUNDS: (f64, f64) = (12.0, 180.0);

#[derive(Error, Debug)]
pub enum GeneratorError {
    #[error("Cluster count must be at least 1")]
    NoClusters,
    #[error("Invalid distribution: {0}")]
    Distribution(#[from] NormalError),
    #[error("Failed to write CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// One CSV row as written to disk, fields already formatted.
#[derive(Serialize)]
struct SampleRow {
    #[serde(rename = "loanbalance")]
    balance: String,
    #[serde(rename = "loanrate")]
    rate: String,
    #[serde(rename = "loanaddedOrRemovedFlag")]
    flag: &'static str,
    #[serde(rename = "loantermOrAgeInMonths")]
    term: String,
    #[serde(rename = "cluster")]
    cluster: String,
}

/// Generate `num_records` loans spread over `clusters` gaussian blobs.
///
/// Cluster centers are uniform over the valid ranges; every value is
/// clamped back into range after sampling. The final cluster absorbs the
/// remainder when `num_records` is not a multiple of `clusters`.
pub fn generate_clustered_loans<R: Rng>(
    num_records: usize,
    clusters: usize,
    rng: &mut R,
) -> Result<Vec<LoanRecord>, GeneratorError> {
    if clusters == 0 {
        return Err(GeneratorError::NoClusters);
    }

    let balance_std = (BALANCE_BOUNDS.1 - BALANCE_BOUNDS.0) / 20.0;
    let rate_std = (RATE_BOUNDS.1 - RATE_BOUNDS.0) / 10.0;
    let term_std = (TERM_BOUNDS.1 - TERM_BOUNDS.0) / 20.0;
    let cluster_size = num_records / clusters;

    let mut records = Vec::with_capacity(num_records);
    for idx in 0..clusters {
        let size = if idx == clusters - 1 {
            num_records - records.len()
        } else {
            cluster_size
        };

        let balance_dist = Normal::new(rng.gen_range(BALANCE_BOUNDS.0..=BALANCE_BOUNDS.1), balance_std)?;
        let rate_dist = Normal::new(rng.gen_range(RATE_BOUNDS.0..=RATE_BOUNDS.1), rate_std)?;
        let term_dist = Normal::new(rng.gen_range(TERM_BOUNDS.0..=TERM_BOUNDS.1), term_std)?;

        for _ in 0..size {
            let balance = clamp(balance_dist.sample(rng), BALANCE_BOUNDS);
            let rate = clamp(rate_dist.sample(rng), RATE_BOUNDS);
            let term = clamp(term_dist.sample(rng), TERM_BOUNDS).trunc();
            let status = if rng.gen_bool(0.5) {
                LoanStatus::Added
            } else {
                LoanStatus::Removed
            };

            records.push(LoanRecord {
                balance: round_cents(balance),
                rate: round_cents(rate),
                term_or_age_months: term,
                status,
                cluster: Some(idx as i64 + 1),
            });
        }
    }

    records.shuffle(rng);
    Ok(records)
}

/// Write records in the sample file column order.
pub fn write_sample_csv(path: &Path, records: &[LoanRecord]) -> Result<(), GeneratorError> {
    let mut writer = csv::Writer::from_path(path)?;

    if records.is_empty() {
        writer.write_record([COL_BALANCE, COL_RATE, COL_FLAG, COL_TERM, COL_CLUSTER])?;
    }

    for record in records {
        writer.serialize(SampleRow {
            balance: format!("{:.2}", record.balance),
            rate: format!("{:.2}", record.rate),
            flag: record.status.as_str(),
            term: format!("{}", record.term_or_age_months as i64),
            cluster: record.cluster.map(|c| c.to_string()).unwrap_or_default(),
        })?;
    }

    writer.flush()?;
    Ok(())
}

/// Generate a clustered sample portfolio and write it to `path`.
pub fn generate_sample_csv(
    path: &Path,
    num_records: usize,
    clusters: usize,
    seed: Option<u64>,
) -> Result<Vec<LoanRecord>, GeneratorError> {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let records = generate_clustered_loans(num_records, clusters, &mut rng)?;
    write_sample_csv(path, &records)?;
    info!(
        "Wrote {} sample records in {} clusters to {}",
        records.len(),
        clusters,
        path.display()
    );
    Ok(records)
}

fn clamp(value: f64, bounds: (f64, f64)) -> f64 {
    value.max(bounds.0).min(bounds.1)
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::load_loans;
    use std::collections::HashMap;

    #[test]
    fn test_count_and_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        let records = generate_clustered_loans(500, 4, &mut rng).unwrap();
        assert_eq!(records.len(), 500);

        for r in &records {
            assert!(r.balance >= BALANCE_BOUNDS.0 && r.balance <= BALANCE_BOUNDS.1);
            assert!(r.rate >= RATE_BOUNDS.0 && r.rate <= RATE_BOUNDS.1);
            assert!(r.term_or_age_months >= TERM_BOUNDS.0 && r.term_or_age_months <= TERM_BOUNDS.1);
            assert_eq!(r.term_or_age_months.fract(), 0.0);
        }
    }

    #[test]
    fn test_last_cluster_takes_remainder() {
        let mut rng = StdRng::seed_from_u64(11);
        let records = generate_clustered_loans(10, 3, &mut rng).unwrap();

        let mut sizes: HashMap<i64, usize> = HashMap::new();
        for r in &records {
            *sizes.entry(r.cluster.unwrap()).or_default() += 1;
        }
        assert_eq!(sizes.get(&1), Some(&3));
        assert_eq!(sizes.get(&2), Some(&3));
        assert_eq!(sizes.get(&3), Some(&4));
        assert!(sizes.keys().all(|k| (1..=3).contains(k)));
    }

    #[test]
    fn test_seed_is_deterministic() {
        let a = generate_clustered_loans(50, 2, &mut StdRng::seed_from_u64(42)).unwrap();
        let b = generate_clustered_loans(50, 2, &mut StdRng::seed_from_u64(42)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_zero_clusters_rejected() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(matches!(
            generate_clustered_loans(10, 0, &mut rng),
            Err(GeneratorError::NoClusters)
        ));
    }

    #[test]
    fn test_written_file_loads_back() {
        let path = std::env::temp_dir().join(format!(
            "loan_viewer_generator_{}.csv",
            std::process::id()
        ));
        let written = generate_sample_csv(&path, 40, 4, Some(3)).unwrap();
        let loaded = load_loans(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded.len(), 40);
        assert_eq!(loaded, written);
    }
}
