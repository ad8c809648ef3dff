//! Append-only calibration ledger.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use pcal_grid::CurveNumbers;

use crate::types::{
    COLUMN_HEADER, FAILED_MARKER, Ledger, LedgerHeader, LedgerRow, LedgerScores, RowOutcome,
};
use crate::{ResultsError, ResultsResult};

/// Writer for one sweep's ledger. Creation truncates; afterwards rows are
/// only ever appended.
#[derive(Debug)]
pub struct ResultLedger {
    path: PathBuf,
    basin_column: bool,
    rows_written: usize,
}

impl ResultLedger {
    /// (Re)create the ledger and write its header block.
    pub fn create(path: &Path, header: &LedgerHeader) -> ResultsResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, header.render())?;
        tracing::info!(path = %path.display(), "ledger created");
        Ok(Self {
            path: path.to_path_buf(),
            basin_column: header.basin_column,
            rows_written: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    /// Append rows as one write so a trial's basins land together.
    pub fn append(&mut self, rows: &[LedgerRow]) -> ResultsResult<()> {
        let mut text = String::new();
        for row in rows {
            if row.basin.is_some() != self.basin_column {
                return Err(ResultsError::BasinColumn { trial: row.trial });
            }
            text.push_str(&row.to_string());
            text.push('\n');
        }
        let mut file = OpenOptions::new().append(true).open(&self.path)?;
        file.write_all(text.as_bytes())?;
        self.rows_written += rows.len();
        Ok(())
    }
}

fn malformed(line: usize, message: impl Into<String>) -> ResultsError {
    ResultsError::Malformed {
        line,
        message: message.into(),
    }
}

fn parse_curve_number(line: usize, text: &str) -> ResultsResult<u32> {
    text.trim()
        .trim_end_matches('.')
        .parse::<u32>()
        .map_err(|_| malformed(line, format!("'{text}' is not a curve number")))
}

fn parse_real(line: usize, text: &str) -> ResultsResult<f64> {
    text.trim()
        .parse::<f64>()
        .map_err(|_| malformed(line, format!("'{text}' is not a number")))
}

fn parse_row(line: usize, record: &csv::StringRecord, basin_column: bool) -> ResultsResult<LedgerRow> {
    let expected = if basin_column { 11 } else { 10 };
    if record.len() != expected {
        return Err(malformed(
            line,
            format!("{} fields, expected {expected}", record.len()),
        ));
    }
    let field = |idx: usize| record.get(idx).unwrap_or_default();

    let trial = field(0)
        .parse::<u32>()
        .map_err(|_| malformed(line, format!("'{}' is not a trial number", field(0))))?;
    let curve_numbers = CurveNumbers::new(
        parse_curve_number(line, field(1))?,
        parse_curve_number(line, field(2))?,
        parse_curve_number(line, field(3))?,
        parse_curve_number(line, field(4))?,
    )
    .map_err(|e| malformed(line, e.to_string()))?;
    let infiltration_mm_day = parse_real(line, field(5))?;

    let outcome = if field(6) == FAILED_MARKER {
        RowOutcome::Failed
    } else {
        RowOutcome::Scored(LedgerScores {
            nse: parse_real(line, field(6))?,
            pbias: parse_real(line, field(7))?,
            rsr: parse_real(line, field(8))?,
            r2: parse_real(line, field(9))?,
        })
    };

    Ok(LedgerRow {
        trial,
        curve_numbers,
        infiltration_mm_day,
        outcome,
        basin: basin_column.then(|| field(10).to_string()),
    })
}

/// Read a ledger written by [`ResultLedger`].
pub fn read_ledger(path: &Path) -> ResultsResult<Ledger> {
    let content = fs::read_to_string(path)?;
    let mut ledger = Ledger::default();

    let mut header_lines = 0;
    let mut basin_column = None;
    for line in content.lines() {
        header_lines += 1;
        if let Some(site) = line.strip_prefix("Pothole: ") {
            ledger.site = Some(site.to_string());
        } else if let Some(period) = line.strip_prefix("Calibration Time Period: ") {
            ledger.period = Some(period.to_string());
        } else if line.starts_with(COLUMN_HEADER) {
            basin_column = Some(line.len() > COLUMN_HEADER.len());
            break;
        }
    }
    let basin_column = basin_column.ok_or(ResultsError::MissingHeader)?;

    // The units row starts with '#' and is skipped as a comment.
    let body: Vec<&str> = content.lines().skip(header_lines).collect();
    let body = body.join("\n");
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .comment(Some(b'#'))
        .from_reader(body.as_bytes());

    let line_of = |position: Option<&csv::Position>| {
        header_lines + position.map_or(0, |p| p.line() as usize)
    };
    for result in reader.records() {
        let record = result.map_err(|e| malformed(line_of(e.position()), e.to_string()))?;
        ledger
            .rows
            .push(parse_row(line_of(record.position()), &record, basin_column)?);
    }
    Ok(ledger)
}
