//! pcal-results: calibration summary ledger.

pub mod ledger;
pub mod types;

pub use ledger::{ResultLedger, read_ledger};
pub use types::*;

pub type ResultsResult<T> = Result<T, ResultsError>;

#[derive(thiserror::Error, Debug)]
pub enum ResultsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed ledger line {line}: {message}")]
    Malformed { line: usize, message: String },

    #[error("Ledger has no column header row")]
    MissingHeader,

    #[error("Row for trial {trial} does not match the ledger's basin column")]
    BasinColumn { trial: u32 },
}
