//! Ledger header and row types.

use std::fmt;

use chrono::NaiveDateTime;
use pcal_grid::CurveNumbers;
use pcal_stats::FitStatistics;

pub const COLUMN_HEADER: &str =
    "Trial Number, CN_A, CN_B, CN_C, CN_D, Infiltration, NSE, PBIAS, RSR, R2";
pub const BASIN_COLUMN: &str = ", Basin";
pub const UNITS_ROW: &str = "#,-, -, -, -, mm/day";
pub const FAILED_MARKER: &str = "FAILED";

/// Descriptive block written once at the top of the ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerHeader {
    pub started: NaiveDateTime,
    /// Pothole or site name
    pub site: String,
    pub period: String,
    pub field_condition: String,
    /// Rows carry a trailing basin label
    pub basin_column: bool,
}

impl LedgerHeader {
    pub fn render(&self) -> String {
        let mut columns = COLUMN_HEADER.to_string();
        if self.basin_column {
            columns.push_str(BASIN_COLUMN);
        }
        format!(
            "Execution Date and Start Time:\n{}\nPothole: {}\nCalibration Time Period: {}\n\n\
             Assumed Field Conditions:\n{}\n{}\n{}\n",
            self.started.format("%Y-%m-%d %H:%M:%S%.6f"),
            self.site,
            self.period,
            self.field_condition,
            columns,
            UNITS_ROW
        )
    }
}

/// Statistics kept in the ledger.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LedgerScores {
    pub nse: f64,
    pub pbias: f64,
    pub rsr: f64,
    pub r2: f64,
}

impl From<&FitStatistics> for LedgerScores {
    fn from(stats: &FitStatistics) -> Self {
        Self {
            nse: stats.nse,
            pbias: stats.pbias,
            rsr: stats.rsr,
            r2: stats.r2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RowOutcome {
    Scored(LedgerScores),
    /// The trial ran out of attempts or could not be scored
    Failed,
}

/// One trial of one basin.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerRow {
    pub trial: u32,
    pub curve_numbers: CurveNumbers,
    pub infiltration_mm_day: f64,
    pub outcome: RowOutcome,
    pub basin: Option<String>,
}

impl LedgerRow {
    pub fn scores(&self) -> Option<&LedgerScores> {
        match &self.outcome {
            RowOutcome::Scored(scores) => Some(scores),
            RowOutcome::Failed => None,
        }
    }
}

impl fmt::Display for LedgerRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d] = self.curve_numbers.as_array();
        write!(
            f,
            "{},{}.,{}.,{}.,{}.,{}",
            self.trial, a, b, c, d, self.infiltration_mm_day
        )?;
        match &self.outcome {
            RowOutcome::Scored(s) => write!(f, ",{},{},{},{}", s.nse, s.pbias, s.rsr, s.r2)?,
            RowOutcome::Failed => write!(f, ",{FAILED_MARKER},,,")?,
        }
        if let Some(label) = &self.basin {
            write!(f, ",{label}")?;
        }
        Ok(())
    }
}

/// Ledger contents read back from disk.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ledger {
    pub site: Option<String>,
    pub period: Option<String>,
    pub rows: Vec<LedgerRow>,
}

impl Ledger {
    pub fn scored(&self) -> impl Iterator<Item = (&LedgerRow, &LedgerScores)> {
        self.rows.iter().filter_map(|r| r.scores().map(|s| (r, s)))
    }

    pub fn failed_count(&self) -> usize {
        self.rows.iter().filter(|r| r.scores().is_none()).count()
    }
}
