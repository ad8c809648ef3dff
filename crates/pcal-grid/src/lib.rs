//! Calibration parameter grid and trial enumeration.
//!
//! Provides:
//! - curve numbers per hydrologic soil group with the 99 ceiling
//! - the nested CN-major / infiltration-minor grid
//! - deterministic trial enumeration with 0-based contiguous ids

pub mod curve_number;
pub mod error;
pub mod grid;

pub use curve_number::{CN_CEILING, CurveNumbers, SoilGroup};
pub use error::{GridError, GridResult};
pub use grid::{
    BoundOverrun, CurveNumberSweep, GridBounds, InfiltrationSweep, ParameterGrid, Trial, Trials,
};
