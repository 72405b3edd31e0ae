pub mod profile;

pub use profile::SynthesisProfile;

use dotenv::dotenv;
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    /// Path checked for a real (anonymized) gold export.
    pub data_path: String,
    /// Path the interchange CSV is written to.
    pub export_path: String,
    /// Row count used when falling back to synthetic data.
    pub synthetic_rows: usize,
    /// Seed used when falling back to synthetic data.
    pub synthetic_seed: u64,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        Self {
            data_path: env::var("DATA_PATH").unwrap_or_else(|_| "data/conversations.csv".to_string()),
            export_path: env::var("EXPORT_PATH")
                .unwrap_or_else(|_| "data/conversations.csv".to_string()),
            synthetic_rows: env::var("SYNTHETIC_ROWS")
                .unwrap_or_else(|_| "350".to_string())
                .parse()
                .expect("SYNTHETIC_ROWS must be a positive integer"),
            synthetic_seed: env::var("SYNTHETIC_SEED")
                .unwrap_or_else(|_| "42".to_string())
                .parse()
                .expect("SYNTHETIC_SEED must be an integer"),
        }
    }
}
