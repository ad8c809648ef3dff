//! pcal-model: the boundary with the external AnnAGNPS model.
//!
//! Contains:
//! - basin (runtime description of a calibrated wetland)
//! - input_files (wetland and curve number input CSVs, written per trial)
//! - runner (cleanup/execute commands with a timeout)
//! - output_file (tolerant wetland output parsing and per-basin extraction)
//! - series (one-value-per-line observed and simulated series)

pub mod atomic;
pub mod basin;
pub mod error;
pub mod input_files;
pub mod output_file;
pub mod runner;
pub mod series;

pub use atomic::write_atomic;
pub use basin::{Basin, CalibrationWindow};
pub use error::{ModelError, ModelResult};
pub use input_files::{
    CurveNumberRow, LandCover, TrialInputWriter, WetlandInputRow, read_curve_number_input,
    read_wetland_input,
};
pub use output_file::{OutputColumns, OutputExtractor, WetlandOutput, WetlandRecord};
pub use runner::{CommandSpec, ExternalModelRunner, ModelRunner, RunStep};
pub use series::{read_series, write_series};
