//! Runtime description of a calibrated wetland basin.

use std::fmt;
use std::path::PathBuf;

use pcal_core::{Area, GregorianDay, Volume, date_from_gregorian_day, ha, mm, ponded_volume};

/// Inclusive range of Gregorian days compared against observations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalibrationWindow {
    pub start: GregorianDay,
    pub end: GregorianDay,
}

impl CalibrationWindow {
    pub fn new(start: GregorianDay, end: GregorianDay) -> Self {
        Self { start, end }
    }

    /// Output days are read as reals; fractional days are compared as-is.
    pub fn contains(&self, day: f64) -> bool {
        day >= self.start as f64 && day <= self.end as f64
    }

    pub fn len_days(&self) -> i64 {
        self.end - self.start + 1
    }
}

impl fmt::Display for CalibrationWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (
            date_from_gregorian_day(self.start),
            date_from_gregorian_day(self.end),
        ) {
            (Some(start), Some(end)) => write!(f, "{start} to {end}"),
            _ => write!(f, "day {} to {}", self.start, self.end),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Basin {
    /// Wetland id written to the input file and matched in the output
    pub id: u32,
    pub reach_id: u32,
    /// Ledger tag
    pub label: String,
    pub area_ha: f64,
    pub initial_depth_mm: f64,
    pub min_depth_mm: f64,
    pub max_depth_mm: f64,
    pub weir_coefficient: f64,
    pub weir_width_m: f64,
    pub weir_height_override_m: Option<f64>,
    /// Concatenated in order
    pub windows: Vec<CalibrationWindow>,
    pub observed_path: PathBuf,
    pub simulated_path: PathBuf,
}

impl Basin {
    pub fn area(&self) -> Area {
        ha(self.area_ha)
    }

    /// Weir crest height; the maximum depth unless overridden.
    pub fn weir_height_m(&self) -> f64 {
        self.weir_height_override_m
            .unwrap_or(self.max_depth_mm / 1000.0)
    }

    /// Stored volume at a simulated ponded depth.
    pub fn volume_at(&self, depth_mm: f64) -> Volume {
        ponded_volume(mm(depth_mm), self.area())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use pcal_core::volume_m3;

    pub(crate) fn basin(id: u32, label: &str, area_ha: f64, max_depth_mm: f64) -> Basin {
        Basin {
            id,
            reach_id: 2,
            label: label.to_string(),
            area_ha,
            initial_depth_mm: 0.0,
            min_depth_mm: 0.0,
            max_depth_mm,
            weir_coefficient: 2.0,
            weir_width_m: 10.0,
            weir_height_override_m: None,
            windows: vec![CalibrationWindow::new(150, 250)],
            observed_path: PathBuf::from(format!("obs_{label}.txt")),
            simulated_path: PathBuf::from(format!("sim_{label}.txt")),
        }
    }

    #[test]
    fn weir_height_defaults_to_max_depth() {
        let mut b = basin(1, "Hen", 0.35, 520.0);
        assert_eq!(b.weir_height_m(), 0.52);
        b.weir_height_override_m = Some(1.0);
        assert_eq!(b.weir_height_m(), 1.0);
    }

    #[test]
    fn volume_uses_area_in_square_meters() {
        let b = basin(1, "One", 1.0, 500.0);
        assert_relative_eq!(volume_m3(b.volume_at(500.0)), 5_000.0, epsilon = 1e-9);
    }

    #[test]
    fn windows_are_inclusive() {
        let w = CalibrationWindow::new(150, 250);
        assert!(w.contains(150.0));
        assert!(w.contains(250.0));
        assert!(!w.contains(251.0));
        assert_eq!(w.len_days(), 101);
    }

    #[test]
    fn window_displays_as_dates() {
        let w = CalibrationWindow::new(736_838, 736_988);
        assert_eq!(w.to_string(), "2018-05-24 to 2018-10-21");
    }
}
