use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FitError {
    #[error("Observed and simulated series differ in length ({observed} observed, {simulated} simulated)")]
    LengthMismatch { observed: usize, simulated: usize },

    #[error("Series too short for fit statistics: {len} values, need at least {min}")]
    TooShort { len: usize, min: usize },

    #[error("Non-finite {series} value at position {index}: {value}")]
    NonFinite {
        series: &'static str,
        index: usize,
        value: f64,
    },

    #[error("Observed series is degenerate: {reason}")]
    DegenerateObserved { reason: &'static str },
}

pub type FitResult<T> = Result<T, FitError>;
