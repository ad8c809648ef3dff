//! AnnAGNPS input files rewritten on every trial.
//!
//! Both files are rendered in memory and swapped in with [`write_atomic`], so
//! the model never reads a half-written parameter set.

use std::fs::File;
use std::path::{Path, PathBuf};

use pcal_core::fmt_model_real;
use pcal_grid::{CurveNumbers, Trial};

use crate::{Basin, ModelError, ModelResult, write_atomic};

const WETLAND_HEADER: &str = "Wetland_ID,Reach_ID,Wetland_Area,Initial_Water_Depth,\
Min_Water_Depth,Max_Water_Depth,Water_Temperature,Potential_Daily_Infiltration,Weir_Coef,\
Weir_Width,Weir_Height,Soluble_N_Conc,Nitrate-N_Loss_Rate,Nitrate-N_Loss_Rate_Coef,\
Temperature_Coef,Weir_Exp,Input_Units_Code";

const CURVE_NUMBER_HEADER: &str = "Curve_Number_ID, CN_A, CN_B, CN_C, CN_D";

const WEIR_EXPONENT: &str = "1.5";
/// Metric units
const INPUT_UNITS_CODE: &str = "1";

/// Curve number classes of the lookup file.
#[derive(Debug, Clone, PartialEq)]
pub struct LandCover {
    /// Receives the trial's curve numbers
    pub calibrated_class: String,
    /// Written unchanged before the calibrated class
    pub reference_rows: Vec<(String, CurveNumbers)>,
}

/// Writes the trial parameters into the model's input files.
#[derive(Debug, Clone)]
pub struct TrialInputWriter {
    wetland_path: PathBuf,
    curve_number_path: PathBuf,
    land_cover: LandCover,
}

impl TrialInputWriter {
    pub fn new(wetland_path: PathBuf, curve_number_path: PathBuf, land_cover: LandCover) -> Self {
        Self {
            wetland_path,
            curve_number_path,
            land_cover,
        }
    }

    pub fn wetland_path(&self) -> &Path {
        &self.wetland_path
    }

    pub fn curve_number_path(&self) -> &Path {
        &self.curve_number_path
    }

    /// Overwrite both input files with the parameters of `trial`.
    pub fn write(&self, trial: &Trial, basins: &[Basin]) -> ModelResult<()> {
        write_atomic(
            &self.wetland_path,
            render_wetland_input(trial, basins).as_bytes(),
        )?;
        write_atomic(
            &self.curve_number_path,
            render_curve_number_input(&self.land_cover, trial.curve_numbers).as_bytes(),
        )?;
        tracing::debug!(
            trial = trial.index(),
            wetland = %self.wetland_path.display(),
            curve_numbers = %self.curve_number_path.display(),
            "input files written"
        );
        Ok(())
    }
}

fn render_wetland_input(trial: &Trial, basins: &[Basin]) -> String {
    let mut out = String::with_capacity(256 + 96 * basins.len());
    out.push_str(WETLAND_HEADER);
    out.push('\n');
    for basin in basins {
        let fields = [
            basin.id.to_string(),
            basin.reach_id.to_string(),
            fmt_model_real(basin.area_ha),
            fmt_model_real(basin.initial_depth_mm),
            fmt_model_real(basin.min_depth_mm),
            fmt_model_real(basin.max_depth_mm),
            String::new(),
            fmt_model_real(trial.infiltration_mm_day),
            fmt_model_real(basin.weir_coefficient),
            fmt_model_real(basin.weir_width_m),
            fmt_model_real(basin.weir_height_m()),
            String::new(),
            String::new(),
            String::new(),
            String::new(),
            WEIR_EXPONENT.to_string(),
            INPUT_UNITS_CODE.to_string(),
        ];
        out.push_str(&fields.join(","));
        out.push('\n');
    }
    out
}

fn curve_number_line(name: &str, cn: CurveNumbers) -> String {
    let [a, b, c, d] = cn.as_array().map(|v| fmt_model_real(f64::from(v)));
    format!("{name},{a},{b},{c},{d}\n")
}

fn render_curve_number_input(land_cover: &LandCover, cn: CurveNumbers) -> String {
    let mut out = String::from(CURVE_NUMBER_HEADER);
    out.push('\n');
    for (name, reference) in &land_cover.reference_rows {
        out.push_str(&curve_number_line(name, *reference));
    }
    out.push_str(&curve_number_line(&land_cover.calibrated_class, cn));
    out
}

/// One data row of the wetland input file, as the model reads it.
#[derive(Debug, Clone, PartialEq)]
pub struct WetlandInputRow {
    pub id: u32,
    pub reach_id: u32,
    pub area_ha: f64,
    pub initial_depth_mm: f64,
    pub min_depth_mm: f64,
    pub max_depth_mm: f64,
    pub infiltration_mm_day: f64,
    pub weir_coefficient: f64,
    pub weir_width_m: f64,
    pub weir_height_m: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CurveNumberRow {
    pub name: String,
    pub curve_numbers: CurveNumbers,
}

fn open_strict(path: &Path) -> ModelResult<csv::Reader<File>> {
    let file = File::open(path).map_err(|e| ModelError::io(path, e))?;
    Ok(csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(file))
}

fn malformed(path: &Path, message: impl Into<String>) -> ModelError {
    ModelError::Malformed {
        path: path.to_path_buf(),
        message: message.into(),
    }
}

fn field<'r>(path: &Path, record: &'r csv::StringRecord, idx: usize) -> ModelResult<&'r str> {
    record
        .get(idx)
        .ok_or_else(|| malformed(path, format!("row has no column {idx}")))
}

fn real_field(path: &Path, record: &csv::StringRecord, idx: usize) -> ModelResult<f64> {
    let text = field(path, record, idx)?;
    text.parse::<f64>()
        .map_err(|_| malformed(path, format!("column {idx}: '{text}' is not a number")))
}

fn int_field(path: &Path, record: &csv::StringRecord, idx: usize) -> ModelResult<u32> {
    let text = field(path, record, idx)?;
    text.parse::<u32>()
        .map_err(|_| malformed(path, format!("column {idx}: '{text}' is not an integer")))
}

/// Read the wetland input file back.
pub fn read_wetland_input(path: &Path) -> ModelResult<Vec<WetlandInputRow>> {
    let mut reader = open_strict(path)?;
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| malformed(path, e.to_string()))?;
        rows.push(WetlandInputRow {
            id: int_field(path, &record, 0)?,
            reach_id: int_field(path, &record, 1)?,
            area_ha: real_field(path, &record, 2)?,
            initial_depth_mm: real_field(path, &record, 3)?,
            min_depth_mm: real_field(path, &record, 4)?,
            max_depth_mm: real_field(path, &record, 5)?,
            infiltration_mm_day: real_field(path, &record, 7)?,
            weir_coefficient: real_field(path, &record, 8)?,
            weir_width_m: real_field(path, &record, 9)?,
            weir_height_m: real_field(path, &record, 10)?,
        });
    }
    Ok(rows)
}

/// Read the curve number lookup file back.
pub fn read_curve_number_input(path: &Path) -> ModelResult<Vec<CurveNumberRow>> {
    let mut reader = open_strict(path)?;
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| malformed(path, e.to_string()))?;
        let mut values = [0_u32; 4];
        for (slot, idx) in values.iter_mut().zip(1..) {
            let v = real_field(path, &record, idx)?;
            if v.fract() != 0.0 || !(0.0..=f64::from(u8::MAX)).contains(&v) {
                return Err(malformed(path, format!("column {idx}: {v} is not a curve number")));
            }
            *slot = v as u32;
        }
        let [a, b, c, d] = values;
        let curve_numbers =
            CurveNumbers::new(a, b, c, d).map_err(|e| malformed(path, e.to_string()))?;
        rows.push(CurveNumberRow {
            name: field(path, &record, 0)?.to_string(),
            curve_numbers,
        });
    }
    Ok(rows)
}
