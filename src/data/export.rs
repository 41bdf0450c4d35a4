use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{ArrayRef, Float64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use serde::Serialize;

use super::model::Recording;

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Output formats for decoded recordings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ExportFormat {
    Csv,
    Json,
    Parquet,
}

impl ExportFormat {
    /// Guess the format from a file extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();

        match ext.as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            "parquet" | "pq" => Ok(ExportFormat::Parquet),
            other => bail!("Unsupported output extension: .{other}"),
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
            ExportFormat::Parquet => "parquet",
        }
    }
}

/// Write a recording to `path` in the given format.
pub fn write_recording(recording: &Recording, path: &Path, format: ExportFormat) -> Result<()> {
    let written = match format {
        ExportFormat::Csv => write_csv(recording, path),
        ExportFormat::Json => write_json(recording, path),
        ExportFormat::Parquet => write_parquet(recording, path),
    };
    written.with_context(|| format!("writing {}", path.display()))?;

    log::info!(
        "Wrote {} rows x {} columns to {}",
        recording.n_rows(),
        recording.n_columns(),
        path.display()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// CSV writer
// ---------------------------------------------------------------------------

/// One header row of column names, then one row per sample.
fn write_csv(recording: &Recording, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating CSV file")?;
    writer
        .write_record(&recording.column_names)
        .context("writing CSV header")?;

    for row in 0..recording.n_rows() {
        let record: Vec<String> = recording
            .columns
            .iter()
            .map(|c| c[row].to_string())
            .collect();
        writer
            .write_record(&record)
            .with_context(|| format!("writing CSV row {row}"))?;
    }
    writer.flush().context("flushing CSV file")?;
    Ok(())
}

// ---------------------------------------------------------------------------
// JSON writer
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct JsonColumn<'a> {
    name: &'a str,
    values: &'a [f64],
}

#[derive(Serialize)]
struct JsonRecording<'a> {
    n_rows: usize,
    columns: Vec<JsonColumn<'a>>,
}

/// Column-oriented JSON:
///
/// ```json
/// { "n_rows": 3, "columns": [ { "name": "time", "values": [0.0, 0.01, 0.02] }, ... ] }
/// ```
fn write_json(recording: &Recording, path: &Path) -> Result<()> {
    let doc = JsonRecording {
        n_rows: recording.n_rows(),
        columns: recording
            .column_names
            .iter()
            .zip(&recording.columns)
            .map(|(name, values)| JsonColumn { name, values })
            .collect(),
    };
    let file = std::fs::File::create(path).context("creating JSON file")?;
    let mut out = BufWriter::new(file);
    serde_json::to_writer(&mut out, &doc).context("serializing JSON")?;
    out.flush().context("flushing JSON file")?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Parquet writer
// ---------------------------------------------------------------------------

/// One non-nullable Float64 column per recording column.
fn write_parquet(recording: &Recording, path: &Path) -> Result<()> {
    let schema = Arc::new(Schema::new(
        recording
            .column_names
            .iter()
            .map(|name| Field::new(name.as_str(), DataType::Float64, false))
            .collect::<Vec<_>>(),
    ));
    let arrays: Vec<ArrayRef> = recording
        .columns
        .iter()
        .map(|c| Arc::new(Float64Array::from(c.clone())) as ArrayRef)
        .collect();

    let batch = RecordBatch::try_new(schema.clone(), arrays).context("building record batch")?;

    let file = std::fs::File::create(path).context("creating parquet file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing record batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}
