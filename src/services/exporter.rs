use anyhow::{Context, Result};
use polars::prelude::*;
use std::fs::{self, File};
use std::path::Path;

/// Write the interchange table: one header row, the schema column order,
/// ISO-8601 dates, `.` decimal separator. Absent optional fields become
/// empty cells, never placeholder text.
pub fn write_csv(df: &DataFrame, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
    }

    let mut file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut out = df.clone();
    CsvWriter::new(&mut file)
        .finish(&mut out)
        .with_context(|| format!("Failed to write interchange CSV to {}", path.display()))?;
    Ok(())
}

/// Parse raw interchange CSV bytes into a `DataFrame`. Empty cells come
/// back as nulls, so optional fields keep their explicit no-value marker.
pub fn parse_csv(data: &[u8]) -> Result<DataFrame> {
    let cursor = std::io::Cursor::new(data);
    CsvReader::new(cursor)
        .infer_schema(Some(100))
        .has_header(true)
        .finish()
        .context("Failed to parse CSV data")
}

/// Read an interchange CSV from disk.
pub fn read_csv(path: &Path) -> Result<DataFrame> {
    let data =
        fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    parse_csv(&data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SCHEMA_COLUMNS;
    use crate::services::assembler::generate;
    use std::path::PathBuf;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("interchange_{}_{}.csv", name, std::process::id()))
    }

    #[test]
    fn round_trip_preserves_field_values() {
        let table = generate(150, 42).unwrap();
        let written = table.to_dataframe().unwrap();

        let path = temp_path("round_trip");
        write_csv(&written, &path).unwrap();
        let reloaded = read_csv(&path).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(reloaded.height(), written.height());
        assert_eq!(reloaded.get_column_names(), SCHEMA_COLUMNS.to_vec());

        for column in [
            "conversation_id",
            "conversation_date",
            "page_name",
            "intent_primary",
            "sentiment_overall",
            "conversation_snippet",
        ] {
            let before = written.column(column).unwrap();
            let after = reloaded.column(column).unwrap().cast(&DataType::Utf8).unwrap();
            let before = before.utf8().unwrap();
            let after = after.utf8().unwrap();
            for i in 0..written.height() {
                assert_eq!(before.get(i), after.get(i), "{} row {}", column, i);
            }
        }

        for column in [
            "sentiment_score",
            "agent_overall_score",
            "conversion_probability",
            "funnel_is_successful",
            "message_count",
        ] {
            let before = written.column(column).unwrap().cast(&DataType::Float64).unwrap();
            let after = reloaded.column(column).unwrap().cast(&DataType::Float64).unwrap();
            let before = before.f64().unwrap();
            let after = after.f64().unwrap();
            for i in 0..written.height() {
                let (a, b) = (before.get(i).unwrap(), after.get(i).unwrap());
                assert!((a - b).abs() < 1e-9, "{} row {}: {} vs {}", column, i, a, b);
            }
        }
    }

    #[test]
    fn absent_optionals_round_trip_as_no_value() {
        let table = generate(400, 7).unwrap();
        let written = table.to_dataframe().unwrap();

        let path = temp_path("optionals");
        write_csv(&written, &path).unwrap();
        let reloaded = read_csv(&path).unwrap();
        fs::remove_file(&path).ok();

        for column in ["competitor_brand", "churn_reason"] {
            assert_eq!(
                reloaded.column(column).unwrap().null_count(),
                written.column(column).unwrap().null_count(),
                "{} nulls changed across the round trip",
                column
            );

            // Absence must stay absence: no literal markers leaking in.
            let series = reloaded.column(column).unwrap().cast(&DataType::Utf8).unwrap();
            let values = series.utf8().unwrap();
            for value in values.into_iter().flatten() {
                assert!(!matches!(value, "None" | "nan" | "NaN" | "null"));
                assert!(!value.is_empty());
            }
        }
    }
}
