//! Error types for grid construction.

use thiserror::Error;

use crate::SoilGroup;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GridError {
    #[error("Curve number for soil group {group} out of range [0, 99]: {value}")]
    CurveNumberOutOfRange { group: SoilGroup, value: u32 },

    #[error("Invalid infiltration {what}: {value} mm/day")]
    InvalidInfiltration { what: &'static str, value: f64 },

    #[error("{what} step count must be at least 1")]
    ZeroSteps { what: &'static str },

    #[error("Grid has {count} trials, more than a sweep can index")]
    TooManyTrials { count: u64 },
}

pub type GridResult<T> = Result<T, GridError>;
