//! Goodness-of-fit statistics for calibration trials.
//!
//! All metrics take observed and simulated slices of equal length. The
//! length check is part of [`evaluate`]; the individual metric functions
//! assume it has already passed.

pub mod error;
pub mod metrics;

pub use error::{FitError, FitResult};
pub use metrics::{FitStatistics, evaluate, nse, pbias, r_squared, rmse, sample_std_dev};
