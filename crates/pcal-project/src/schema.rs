//! Project schema definitions.

use std::path::PathBuf;

use pcal_core::{CoreResult, GregorianDay, parse_gregorian_day};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Project {
    pub version: u32,
    pub name: String,
    pub paths: PathsDef,
    pub model: ModelDef,
    pub grid: GridDef,
    #[serde(default)]
    pub land_cover: LandCoverDef,
    pub basins: Vec<BasinDef>,
    #[serde(default)]
    pub ledger: LedgerDef,
    #[serde(default)]
    pub output_columns: OutputColumnsDef,
    #[serde(default)]
    pub failure_policy: FailurePolicyDef,
}

/// Sweep-wide file locations. Relative paths are resolved against the
/// directory holding the project file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PathsDef {
    /// AnnAGNPS wetland data section CSV (rewritten every trial)
    pub wetland_input: PathBuf,
    /// Runoff curve number CSV (rewritten every trial)
    pub curve_number_input: PathBuf,
    /// Wetland effects CSV produced by the model
    pub wetland_output: PathBuf,
    /// Calibration summary written by the sweep
    pub ledger: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelDef {
    /// Clears the previous run's output so the model does not prompt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cleanup: Option<CommandDef>,
    pub execute: CommandDef,
    /// Per-command limit in seconds
    #[serde(default = "default_timeout_s")]
    pub timeout_s: f64,
}

fn default_timeout_s() -> f64 {
    3600.0
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommandDef {
    pub program: PathBuf,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct CurveNumbersDef {
    pub a: u32,
    pub b: u32,
    pub c: u32,
    pub d: u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SoilGroupDef {
    A,
    B,
    C,
    D,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GridDef {
    /// Reference curve numbers from the NRCS table for the land cover
    pub cn_reference: CurveNumbersDef,
    /// The sweep starts this far below the reference
    #[serde(default)]
    pub cn_offset_down: u32,
    /// Advisory upper bound above the reference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cn_offset_up: Option<u32>,
    pub cn_steps: u32,
    #[serde(default = "default_cn_increment")]
    pub cn_increment: u8,
    /// Soil groups written at their reference value on every trial
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hold_fixed: Vec<SoilGroupDef>,
    /// mm/day
    pub infiltration_reference: f64,
    #[serde(default)]
    pub infiltration_offset_down: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub infiltration_offset_up: Option<f64>,
    pub infiltration_steps: u32,
    pub infiltration_increment: f64,
}

fn default_cn_increment() -> u8 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LandCoverDef {
    /// Curve number class receiving the trial values
    #[serde(default = "default_calibrated_class")]
    pub calibrated_class: String,
    /// Classes written with fixed values so the model runs cleanly
    #[serde(default = "default_reference_rows")]
    pub reference_rows: Vec<ReferenceRowDef>,
}

fn default_calibrated_class() -> String {
    "Row_Crop_(SR_Poor)".to_string()
}

fn default_reference_rows() -> Vec<ReferenceRowDef> {
    vec![ReferenceRowDef {
        name: "Fallow_(Bare)".to_string(),
        cn: CurveNumbersDef {
            a: 77,
            b: 86,
            c: 91,
            d: 94,
        },
    }]
}

impl Default for LandCoverDef {
    fn default() -> Self {
        Self {
            calibrated_class: default_calibrated_class(),
            reference_rows: default_reference_rows(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReferenceRowDef {
    pub name: String,
    pub cn: CurveNumbersDef,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BasinDef {
    pub id: u32,
    pub reach_id: u32,
    pub label: String,
    pub area_ha: f64,
    pub max_depth_mm: f64,
    #[serde(default)]
    pub initial_depth_mm: f64,
    #[serde(default)]
    pub min_depth_mm: f64,
    #[serde(default = "default_weir_coefficient")]
    pub weir_coefficient: f64,
    #[serde(default = "default_weir_width_m")]
    pub weir_width_m: f64,
    /// Defaults to the maximum depth expressed in meters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weir_height_m: Option<f64>,
    pub windows: Vec<WindowDef>,
    /// Observed series, one value per line
    pub observed: PathBuf,
    /// Extracted simulated series, rewritten every trial
    pub simulated_output: PathBuf,
}

fn default_weir_coefficient() -> f64 {
    2.0
}

fn default_weir_width_m() -> f64 {
    10.0
}

/// Inclusive calibration window.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WindowDef {
    pub start: DayDef,
    pub end: DayDef,
}

/// A day given either as a Gregorian ordinal or an ISO date.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum DayDef {
    Ordinal(GregorianDay),
    Date(String),
}

impl DayDef {
    pub fn to_gregorian_day(&self) -> CoreResult<GregorianDay> {
        match self {
            DayDef::Ordinal(day) => Ok(*day),
            DayDef::Date(text) => parse_gregorian_day(text),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct LedgerDef {
    /// Defaults to the basin labels joined together
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_name: Option<String>,
    #[serde(default)]
    pub period_label: String,
    #[serde(default)]
    pub field_condition: String,
}

/// Column layout of the wetland output file.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct OutputColumnsDef {
    #[serde(default = "default_day_column")]
    pub day: usize,
    #[serde(default = "default_basin_column")]
    pub basin: usize,
    #[serde(default = "default_depth_column")]
    pub depth: usize,
    #[serde(default = "default_min_columns")]
    pub min_columns: usize,
}

fn default_day_column() -> usize {
    0
}

fn default_basin_column() -> usize {
    4
}

fn default_depth_column() -> usize {
    14
}

fn default_min_columns() -> usize {
    32
}

impl Default for OutputColumnsDef {
    fn default() -> Self {
        Self {
            day: default_day_column(),
            basin: default_basin_column(),
            depth: default_depth_column(),
            min_columns: default_min_columns(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum OnFailureDef {
    /// Record a failure row and continue with the next trial
    #[default]
    Skip,
    /// Record a failure row and stop the sweep
    Abort,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct FailurePolicyDef {
    #[serde(default)]
    pub max_retries: u32,
    #[serde(default)]
    pub on_failure: OnFailureDef,
}
