pub mod aggregator;
pub mod assembler;
pub mod exporter;
pub mod store;
pub mod synthesizer;
pub mod templates;

use anyhow::Result;
use polars::prelude::DataFrame;

/// A provider of the interchange analytics table. The real gold export and
/// the synthetic generator both satisfy this contract, so every downstream
/// consumer stays source-agnostic.
pub trait TableSource {
    /// Human-readable provenance for logs and the demo badge.
    fn describe(&self) -> String;
    fn load(&self) -> Result<DataFrame>;
}

// Re-export the services
pub use aggregator::{DegenerateValueFilter, SegmentAggregator};
pub use assembler::{assemble, generate, generate_with_profile, AnalyticsTable};
pub use store::{DatasetStore, GoldExportSource, SyntheticSource};
pub use synthesizer::{FieldVectors, RecordSynthesizer};
