//! Plain-text series files, one value per line.

use std::fmt::Write as _;
use std::path::Path;

use crate::{ModelError, ModelResult, write_atomic};

/// Read a series. Blank lines and `#` comments are ignored; any other line
/// must hold a single finite number.
pub fn read_series(path: &Path) -> ModelResult<Vec<f64>> {
    let content = std::fs::read_to_string(path).map_err(|e| ModelError::io(path, e))?;
    let mut values = Vec::new();
    for (idx, raw) in content.lines().enumerate() {
        let text = raw.trim();
        if text.is_empty() || text.starts_with('#') {
            continue;
        }
        match text.parse::<f64>() {
            Ok(v) if v.is_finite() => values.push(v),
            _ => {
                return Err(ModelError::SeriesParse {
                    path: path.to_path_buf(),
                    line: idx + 1,
                    text: text.to_string(),
                });
            }
        }
    }
    Ok(values)
}

/// Replace the series file. Values are written in shortest round-trip form,
/// so reading the file back yields the same numbers.
pub fn write_series(path: &Path, values: &[f64]) -> ModelResult<()> {
    let mut out = String::with_capacity(values.len() * 20);
    for v in values {
        let _ = writeln!(out, "{v}");
    }
    write_atomic(path, out.as_bytes())
}
