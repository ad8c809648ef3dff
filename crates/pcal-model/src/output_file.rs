//! Wetland effects output of the model.
//!
//! The file carries a header, occasional summary lines and rows of varying
//! width. Rows are parsed leniently: anything too short or non-numeric in a
//! used column is skipped and counted instead of failing the trial.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use pcal_core::volume_m3;

use crate::{Basin, ModelError, ModelResult};

/// Column layout of the wetland output file (0-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputColumns {
    /// Gregorian day number
    pub day: usize,
    pub basin: usize,
    /// Ponded depth, mm
    pub depth: usize,
    /// Rows narrower than this are skipped
    pub min_columns: usize,
}

impl Default for OutputColumns {
    fn default() -> Self {
        Self {
            day: 0,
            basin: 4,
            depth: 14,
            min_columns: 32,
        }
    }
}

/// One parsed daily row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WetlandRecord {
    pub day: f64,
    pub basin: f64,
    pub depth_mm: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WetlandOutput {
    pub records: Vec<WetlandRecord>,
    pub skipped_rows: usize,
}

impl WetlandOutput {
    /// Simulated volumes (m³) of `basin`, window by window in file order.
    pub fn basin_series(&self, basin: &Basin) -> Vec<f64> {
        let id = f64::from(basin.id);
        let mut series = Vec::new();
        for window in &basin.windows {
            series.extend(
                self.records
                    .iter()
                    .filter(|r| r.basin == id && window.contains(r.day))
                    .map(|r| volume_m3(basin.volume_at(r.depth_mm))),
            );
        }
        series
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OutputExtractor {
    columns: OutputColumns,
}

impl OutputExtractor {
    pub fn new(columns: OutputColumns) -> Self {
        Self { columns }
    }

    pub fn read(&self, path: &Path) -> ModelResult<WetlandOutput> {
        let file = File::open(path).map_err(|e| ModelError::io(path, e))?;
        let output = self.parse(file);
        if output.skipped_rows > 0 {
            tracing::warn!(
                path = %path.display(),
                skipped = output.skipped_rows,
                kept = output.records.len(),
                "skipped malformed wetland output rows"
            );
        }
        Ok(output)
    }

    pub fn parse<R: Read>(&self, input: R) -> WetlandOutput {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(input);

        let mut output = WetlandOutput::default();
        for (line, result) in reader.records().enumerate() {
            let parsed = result
                .map_err(|e| e.to_string())
                .and_then(|record| self.parse_record(&record));
            match parsed {
                Ok(record) => output.records.push(record),
                Err(reason) => {
                    tracing::debug!(line = line + 1, %reason, "skipping wetland output row");
                    output.skipped_rows += 1;
                }
            }
        }
        output
    }

    fn parse_record(&self, record: &csv::StringRecord) -> Result<WetlandRecord, String> {
        if record.len() < self.columns.min_columns {
            return Err(format!(
                "{} columns, expected at least {}",
                record.len(),
                self.columns.min_columns
            ));
        }
        let number = |idx: usize| -> Result<f64, String> {
            let text = record.get(idx).unwrap_or_default();
            match text.parse::<f64>() {
                Ok(v) if v.is_finite() => Ok(v),
                _ => Err(format!("column {idx}: '{text}' is not a number")),
            }
        };
        Ok(WetlandRecord {
            day: number(self.columns.day)?,
            basin: number(self.columns.basin)?,
            depth_mm: number(self.columns.depth)?,
        })
    }
}
