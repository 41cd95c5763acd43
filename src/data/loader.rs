//! CSV Data Loader Module
//! Reads loan records from CSV using Polars.

use polars::prelude::*;
use std::path::Path;
use thiserror::Error;

pub const COL_BALANCE: &str = "loanbalance";
pub const COL_RATE: &str = "loanrate";
pub const COL_TERM: &str = "loantermOrAgeInMonths";
pub const COL_FLAG: &str = "loanaddedOrRemovedFlag";
pub const COL_CLUSTER: &str = "cluster";

/// Columns every loan file must carry.
pub const REQUIRED_COLUMNS: [&str; 4] = [COL_BALANCE, COL_RATE, COL_TERM, COL_FLAG];

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Failed to load CSV: {0}")]
    Csv(#[from] PolarsError),
    #[error("Missing required column '{0}'")]
    MissingColumn(String),
    #[error("Malformed value in row {row}, column '{column}'")]
    MalformedRow { row: usize, column: String },
}

/// Whether a loan entered or left the portfolio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoanStatus {
    Added,
    Removed,
}

impl LoanStatus {
    /// Interpret the raw flag column. Anything not recognised as "added" counts as removed.
    pub fn from_flag(flag: &str) -> Self {
        match flag.trim().to_lowercase().as_str() {
            "added" | "new" | "1" | "true" | "yes" => LoanStatus::Added,
            _ => LoanStatus::Removed,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LoanStatus::Added => "added",
            LoanStatus::Removed => "removed",
        }
    }
}

/// A single row of the loan file.
#[derive(Debug, Clone, PartialEq)]
pub struct LoanRecord {
    pub balance: f64,
    pub rate: f64,
    pub term_or_age_months: f64,
    pub status: LoanStatus,
    pub cluster: Option<i64>,
}

/// Load all loan records from a CSV file.
///
/// Every column is read as text; numeric parsing happens per row in
/// `records_from_dataframe` so a bad cell is reported with its row.
pub fn load_loans(path: &Path) -> Result<Vec<LoanRecord>, LoaderError> {
    let df = LazyCsvReader::new(path)
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .finish()?
        .collect()?;

    records_from_dataframe(&df)
}

/// Convert a loaded DataFrame into typed loan records.
pub fn records_from_dataframe(df: &DataFrame) -> Result<Vec<LoanRecord>, LoaderError> {
    let names: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect();

    for required in REQUIRED_COLUMNS {
        if !names.iter().any(|n| n == required) {
            return Err(LoaderError::MissingColumn(required.to_string()));
        }
    }

    let balance = numeric_column(df, COL_BALANCE)?;
    let rate = numeric_column(df, COL_RATE)?;
    let term = numeric_column(df, COL_TERM)?;

    let flag_col = df.column(COL_FLAG)?.cast(&DataType::String)?;
    let flags = flag_col.str()?;

    let cluster_col = if names.iter().any(|n| n == COL_CLUSTER) {
        Some(df.column(COL_CLUSTER)?.cast(&DataType::Int64)?)
    } else {
        None
    };
    let clusters = match &cluster_col {
        Some(col) => Some(col.i64()?),
        None => None,
    };

    let mut records = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        records.push(LoanRecord {
            balance: value_at(&balance, i, COL_BALANCE)?,
            rate: value_at(&rate, i, COL_RATE)?,
            term_or_age_months: value_at(&term, i, COL_TERM)?,
            status: flags.get(i).map_or(LoanStatus::Removed, LoanStatus::from_flag),
            cluster: clusters.and_then(|ca| ca.get(i)),
        });
    }

    Ok(records)
}

/// Cast a column to f64. Unparseable cells become nulls and are reported per row.
fn numeric_column(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>, LoaderError> {
    let column = df.column(name)?.cast(&DataType::Float64)?;
    let values = column.f64()?;
    Ok(values.into_iter().collect())
}

fn value_at(values: &[Option<f64>], idx: usize, column: &str) -> Result<f64, LoaderError> {
    values
        .get(idx)
        .copied()
        .flatten()
        .filter(|v| !v.is_nan())
        .ok_or_else(|| LoaderError::MalformedRow {
            row: idx + 1,
            column: column.to_string(),
        })
}
