use anyhow::{anyhow, Result};
use log::{info, warn};
use polars::prelude::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::config::Config;
use crate::models::{SCHEMA_COLUMNS, UPSTREAM_COLUMNS};
use crate::services::assembler::generate;
use crate::services::{exporter, templates, TableSource};

/// A real anonymized gold export on disk.
#[derive(Debug, Clone)]
pub struct GoldExportSource {
    path: PathBuf,
}

impl GoldExportSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TableSource for GoldExportSource {
    fn describe(&self) -> String {
        format!("gold export at {}", self.path.display())
    }

    fn load(&self) -> Result<DataFrame> {
        let df = exporter::read_csv(&self.path)?;
        info!(
            "📂 Loaded gold export: {} rows, {} columns",
            df.height(),
            df.width()
        );
        sanitize_gold_export(df)
    }
}

/// The synthetic generator standing in when no export exists.
#[derive(Debug, Clone)]
pub struct SyntheticSource {
    rows: usize,
    seed: u64,
}

impl SyntheticSource {
    pub fn new(rows: usize, seed: u64) -> Self {
        Self { rows, seed }
    }
}

impl TableSource for SyntheticSource {
    fn describe(&self) -> String {
        format!("synthetic data ({} rows, seed {})", self.rows, self.seed)
    }

    fn load(&self) -> Result<DataFrame> {
        let table = generate(self.rows, self.seed)?;
        info!("🎲 Generated {} synthetic conversations", table.len());
        table.to_dataframe()
    }
}

/// Session-scoped dataset access: picks the gold export when the file
/// exists, the synthetic generator otherwise, and caches the loaded table
/// for the rest of the session. The cached table is read-only; it is
/// invalidated only by process restart or an explicit [`DatasetStore::clear`].
#[derive(Debug, Clone)]
pub struct DatasetStore {
    config: Config,
    cache: Arc<Mutex<Option<Arc<DataFrame>>>>,
}

impl DatasetStore {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            cache: Arc::new(Mutex::new(None)),
        }
    }

    /// Whether loads would fall back to the synthetic generator.
    pub fn is_synthetic(&self) -> bool {
        !Path::new(&self.config.data_path).exists()
    }

    /// The source a load would use right now.
    pub fn source(&self) -> Box<dyn TableSource> {
        if self.is_synthetic() {
            Box::new(SyntheticSource::new(
                self.config.synthetic_rows,
                self.config.synthetic_seed,
            ))
        } else {
            Box::new(GoldExportSource::new(&self.config.data_path))
        }
    }

    pub fn load(&self) -> Result<Arc<DataFrame>> {
        let mut cache = self
            .cache
            .lock()
            .map_err(|_| anyhow!("Failed to acquire lock on dataset cache"))?;

        if let Some(df) = cache.as_ref() {
            info!("💾 Serving cached table ({} rows)", df.height());
            return Ok(Arc::clone(df));
        }

        let source = self.source();
        info!("🔍 Loading dataset from {}", source.describe());
        let df = Arc::new(source.load()?);
        *cache = Some(Arc::clone(&df));
        Ok(df)
    }

    /// Drop the cached table; the next load re-reads its source.
    pub fn clear(&self) -> Result<()> {
        let mut cache = self
            .cache
            .lock()
            .map_err(|_| anyhow!("Failed to acquire lock on dataset cache"))?;
        *cache = None;
        Ok(())
    }
}

/// Clean a real export down to the interchange contract: de-duplicate by
/// conversation ID, strip upstream/PII columns, restrict to schema
/// columns, and attach dialogue snippets when the export lacks them.
pub fn sanitize_gold_export(df: DataFrame) -> Result<DataFrame> {
    let df = dedup_by_conversation_id(df)?;

    let present: Vec<&str> = df.get_column_names();
    let extras: Vec<&str> = present
        .iter()
        .copied()
        .filter(|c| !SCHEMA_COLUMNS.iter().any(|s| s == c))
        .collect();
    if !extras.is_empty() {
        info!("ℹ Dropping non-interchange columns: {:?}", extras);
    }
    for upstream in UPSTREAM_COLUMNS {
        if present.contains(&upstream) {
            warn!("🔒 Removing upstream column from export: {}", upstream);
        }
    }

    let keep: Vec<&str> = SCHEMA_COLUMNS
        .iter()
        .filter(|c| present.contains(c))
        .copied()
        .collect();
    let mut df = df.select(keep)?;

    let has_snippets = df.get_column_names().contains(&"conversation_snippet");
    if !has_snippets && df.get_column_names().contains(&"intent_primary") {
        let intents = df.column("intent_primary")?.cast(&DataType::Utf8)?;
        let intents = intents.utf8()?;
        let snippets: Vec<Option<String>> = intents
            .into_iter()
            .map(|key| key.map(|k| templates::for_intent_key(k).to_string()))
            .collect();
        df.with_column(Series::new("conversation_snippet", snippets))?;
        info!("✅ Attached dialogue snippets by intent");
    }

    Ok(df)
}

/// Keep one row per conversation ID, preferring the most recently
/// processed when the export carries `processed_at`; row order is
/// otherwise preserved.
fn dedup_by_conversation_id(df: DataFrame) -> Result<DataFrame> {
    if !df.get_column_names().contains(&"conversation_id") {
        return Ok(df);
    }

    let ids = df.column("conversation_id")?.cast(&DataType::Utf8)?;
    let ids = ids.utf8()?;

    let processed_at = if df.get_column_names().contains(&"processed_at") {
        let series = df.column("processed_at")?.cast(&DataType::Utf8)?;
        let values = series.utf8()?;
        values
            .into_iter()
            .map(|v| v.map(str::to_string))
            .collect::<Vec<_>>()
    } else {
        vec![None; df.height()]
    };

    // First pass: pick the winning row per ID (latest processed_at, ties
    // to the earliest row).
    let mut winner: HashMap<String, usize> = HashMap::new();
    for (i, id) in ids.into_iter().enumerate() {
        let Some(id) = id else { continue };
        match winner.get(id) {
            Some(&current) if processed_at[current] >= processed_at[i] => {}
            _ => {
                winner.insert(id.to_string(), i);
            }
        }
    }

    let mask: Vec<bool> = ids
        .into_iter()
        .enumerate()
        .map(|(i, id)| match id {
            Some(id) => winner.get(id) == Some(&i),
            None => false,
        })
        .collect();

    let dropped = mask.iter().filter(|keep| !**keep).count();
    if dropped > 0 {
        info!("🧹 Dropped {} duplicate/unidentified rows", dropped);
    }

    let mask = BooleanChunked::from_slice("dedup_mask", &mask);
    Ok(df.filter(&mask)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn synthetic_config(rows: usize) -> Config {
        Config {
            data_path: "does/not/exist.csv".to_string(),
            export_path: "unused.csv".to_string(),
            synthetic_rows: rows,
            synthetic_seed: 42,
        }
    }

    #[test]
    fn falls_back_to_synthetic_when_export_is_missing() {
        let store = DatasetStore::new(synthetic_config(40));
        assert!(store.is_synthetic());

        let df = store.load().unwrap();
        assert_eq!(df.height(), 40);
        assert_eq!(df.get_column_names(), SCHEMA_COLUMNS.to_vec());
    }

    #[test]
    fn caches_the_table_for_the_session() {
        let store = DatasetStore::new(synthetic_config(25));

        let first = store.load().unwrap();
        let second = store.load().unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        store.clear().unwrap();
        let third = store.load().unwrap();
        assert!(!Arc::ptr_eq(&first, &third));
        // Same seed, so the regenerated table is identical in content.
        assert_eq!(first.height(), third.height());
    }

    #[test]
    fn loads_and_sanitizes_a_real_export() {
        let table = generate(30, 9).unwrap();
        let df = table.to_dataframe().unwrap();

        let path = std::env::temp_dir().join(format!("gold_export_{}.csv", std::process::id()));
        exporter::write_csv(&df, &path).unwrap();

        let store = DatasetStore::new(Config {
            data_path: path.to_string_lossy().into_owned(),
            export_path: "unused.csv".to_string(),
            synthetic_rows: 5,
            synthetic_seed: 1,
        });
        assert!(!store.is_synthetic());

        let loaded = store.load().unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(loaded.height(), 30);
        assert_eq!(loaded.get_column_names(), SCHEMA_COLUMNS.to_vec());
    }

    #[test]
    fn sanitize_strips_upstream_columns_and_duplicates() {
        let df = DataFrame::new(vec![
            Series::new("conversation_id", vec!["a", "a", "b"]),
            Series::new("conversation_date", vec!["2025-07-01", "2025-07-01", "2025-07-02"]),
            Series::new("intent_primary", vec!["hoi_gia", "hoi_gia", "mua_hang"]),
            Series::new("sentiment_overall", vec!["neutral", "positive", "negative"]),
            Series::new("customer_id", vec!["c1", "c1", "c2"]),
            Series::new("full_conversation", vec!["pii", "pii", "pii"]),
            Series::new(
                "processed_at",
                vec!["2026-01-01T00:00:00", "2026-01-02T00:00:00", "2026-01-01T00:00:00"],
            ),
        ])
        .unwrap();

        let clean = sanitize_gold_export(df).unwrap();

        assert_eq!(clean.height(), 2);
        for upstream in UPSTREAM_COLUMNS {
            assert!(!clean.get_column_names().contains(&upstream));
        }

        // The duplicate resolved to the later processed_at row.
        let sentiments = clean.column("sentiment_overall").unwrap();
        let sentiments = sentiments.utf8().unwrap();
        assert_eq!(sentiments.get(0), Some("positive"));

        // Snippets were attached from the intent templates.
        let snippets = clean.column("conversation_snippet").unwrap();
        let snippets = snippets.utf8().unwrap();
        assert_eq!(snippets.get(1), Some(templates::for_intent_key("mua_hang")));
    }
}
