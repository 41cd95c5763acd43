//! Loan Viewer - Loan Portfolio 3D Point Cloud Viewer
//!
//! Renders loan records from a CSV file as spheres positioned by term/age,
//! balance and rate, and redraws when the file changes on disk.

mod charts;
mod config;
mod data;
mod gui;
mod scene;

use anyhow::{anyhow, Context};
use charts::StaticPlotRenderer;
use clap::Parser;
use config::ViewerConfig;
use data::generator::{generate_sample_csv, DEFAULT_CLUSTERS, DEFAULT_NUM_RECORDS};
use data::load_loans;
use eframe::egui;
use gui::LoanViewerApp;
use log::info;
use scene::ViewerState;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, clap::Parser)]
#[command(
    name = "loan_viewer",
    about = "Visualize loan portfolio data and monitor for updates"
)]
struct Cli {
    /// CSV file containing loan data
    csv_file: PathBuf,

    /// Generate a new sample dataset without asking
    #[arg(long, conflicts_with = "no_prompt")]
    generate: bool,

    /// Never ask; generate sample data only when the file is missing
    #[arg(long)]
    no_prompt: bool,

    /// Number of generated sample records
    #[arg(long, default_value_t = DEFAULT_NUM_RECORDS)]
    records: usize,

    /// Number of clusters in generated sample data
    #[arg(long, default_value_t = DEFAULT_CLUSTERS)]
    clusters: usize,

    /// Seed for reproducible sample data
    #[arg(long)]
    seed: Option<u64>,

    /// Render a static cluster plot to this PNG and exit
    #[arg(long, value_name = "OUT.png")]
    plot: Option<PathBuf>,

    /// Plot width in pixels
    #[arg(long, default_value_t = 1000, value_parser = clap::value_parser!(u32).range(1..))]
    width: u32,

    /// Plot height in pixels
    #[arg(long, default_value_t = 700, value_parser = clap::value_parser!(u32).range(1..))]
    height: u32,

    /// Seconds between file checks (overrides the config file)
    #[arg(long, value_name = "SECS")]
    interval: Option<f64>,

    /// JSON file with viewer settings
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

/// Decide from the prompt answer whether to write a fresh sample file.
fn should_generate(answer: &str, file_exists: bool) -> bool {
    let answer = answer.trim().to_lowercase();
    answer == "y" || (answer.is_empty() && !file_exists)
}

fn prompt_generate(path: &Path, records: usize) -> anyhow::Result<bool> {
    print!(
        "Generate a new dataset with {} sample records? [y/N]: ",
        with_thousands(records)
    );
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().read_line(&mut answer)?;
    Ok(should_generate(&answer, path.exists()))
}

fn with_thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

fn load_config(cli: &Cli) -> anyhow::Result<ViewerConfig> {
    let mut config = match &cli.config {
        Some(path) => ViewerConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => ViewerConfig::default(),
    };
    if let Some(interval) = cli.interval {
        config.poll_interval_secs = interval;
    }
    config.validate()?;
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let csv_path = cli.csv_file.clone();

    let generate = if cli.generate {
        true
    } else if cli.no_prompt {
        !csv_path.exists()
    } else {
        prompt_generate(&csv_path, cli.records)?
    };

    if generate {
        generate_sample_csv(&csv_path, cli.records, cli.clusters, cli.seed)
            .with_context(|| format!("Failed to write sample data to {}", csv_path.display()))?;
        println!("Sample data written to {}", csv_path.display());
    }

    let records = load_loans(&csv_path)
        .with_context(|| format!("Failed to load loans from {}", csv_path.display()))?;
    info!("Loaded {} loans from {}", records.len(), csv_path.display());

    if let Some(out) = &cli.plot {
        StaticPlotRenderer::render_cluster_scatter_png(&records, out, cli.width, cli.height)
            .with_context(|| format!("Failed to render plot to {}", out.display()))?;
        println!("Plot written to {}", out.display());
        return Ok(());
    }

    let state = ViewerState::new(&csv_path, records, &config);

    // Configure native options
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([config.window_width, config.window_height])
            .with_min_inner_size([800.0, 500.0])
            .with_title("Loan Portfolio"),
        ..Default::default()
    };

    // Run the application
    eframe::run_native(
        "Loan Portfolio",
        options,
        Box::new(move |cc| Ok(Box::new(LoanViewerApp::new(cc, state, config)))),
    )
    .map_err(|e| anyhow!("Viewer failed: {}", e))
}
