//! Data module - CSV loading, scaling, generation and file watching

pub mod generator;
pub mod loader;
pub mod processor;
pub mod watcher;

pub use loader::{load_loans, LoanRecord, LoanStatus, LoaderError};
pub use processor::PortfolioSummary;
pub use watcher::{CsvWatcher, PollOutcome};
