use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use chat_analytics_pipeline::config::Config;
use chat_analytics_pipeline::services::{exporter, generate, DatasetStore, SegmentAggregator};

#[derive(Parser)]
#[command(
    name = "chat-analytics-pipeline",
    about = "Export the conversation analytics table for the demo dashboard",
    long_about = "Exports the anonymized gold table when one is available; otherwise \
                  generates a statistically coherent synthetic stand-in and writes the \
                  same interchange CSV either way."
)]
struct Cli {
    /// Force synthetic data even when a gold export exists
    #[arg(long)]
    synthetic: bool,

    /// Number of rows when generating synthetic data
    #[arg(long)]
    rows: Option<usize>,

    /// Seed for reproducible synthetic data
    #[arg(long)]
    seed: Option<u64>,

    /// Gold export to load instead of DATA_PATH
    #[arg(long)]
    data: Option<PathBuf>,

    /// Output path for the interchange CSV
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("🚀 Starting Chat Analytics data export");

    let cli = Cli::parse();

    // Load configuration from environment variables, CLI flags winning
    let mut config = Config::from_env();
    if let Some(data) = &cli.data {
        config.data_path = data.to_string_lossy().into_owned();
    }
    if let Some(output) = &cli.output {
        config.export_path = output.to_string_lossy().into_owned();
    }
    if let Some(rows) = cli.rows {
        config.synthetic_rows = rows;
    }
    if let Some(seed) = cli.seed {
        config.synthetic_seed = seed;
    }

    let df = if cli.synthetic {
        log::info!(
            "🎲 Synthetic mode selected ({} rows, seed {})",
            config.synthetic_rows,
            config.synthetic_seed
        );
        std::sync::Arc::new(generate(config.synthetic_rows, config.synthetic_seed)?.to_dataframe()?)
    } else {
        let store = DatasetStore::new(config.clone());
        if store.is_synthetic() {
            log::warn!(
                "⚠ No gold export found at {}, falling back to synthetic data",
                config.data_path
            );
        }
        store.load()?
    };

    let output = PathBuf::from(&config.export_path);
    exporter::write_csv(&df, &output)?;
    log::info!("✅ Wrote {} rows to {}", df.height(), output.display());

    let overview = SegmentAggregator::default().overview(&df)?;
    log::info!("📊 Overview: {}", serde_json::to_string(&overview)?);

    log::info!("Next steps:");
    log::info!("  1. git add {}", output.display());
    log::info!("  2. git commit -m 'Add demo data'");
    log::info!("  3. Point the dashboard at the exported table");

    Ok(())
}
