//! Nested calibration grid.
//!
//! The outer loop raises the curve numbers, the inner loop walks the
//! infiltration rate up from its floor. Infiltration restarts at the floor on
//! every outer step, so the grid is CN-major.

use std::fmt;

use pcal_core::TrialId;

use crate::{CurveNumbers, GridError, GridResult, SoilGroup};

/// Outer (curve number) sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct CurveNumberSweep {
    /// Values used on the first outer step
    pub start: CurveNumbers,
    /// Number of outer steps
    pub steps: u32,
    /// Amount added to every non-held group per outer step
    pub increment: u8,
    /// Groups kept at their start value
    pub held: Vec<SoilGroup>,
}

/// Inner (infiltration) sweep, mm/day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InfiltrationSweep {
    pub floor_mm_day: f64,
    pub steps: u32,
    pub increment_mm_day: f64,
}

/// Upper bounds a sweep was planned against.
///
/// Bounds are advisory: the grid is always enumerated in full and overruns
/// are only reported through [`ParameterGrid::bound_overruns`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GridBounds {
    pub curve_numbers_max: Option<CurveNumbers>,
    pub infiltration_max_mm_day: Option<f64>,
}

/// One planned value that lands above its bound.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundOverrun {
    pub parameter: String,
    pub planned_max: f64,
    pub bound: f64,
}

impl fmt::Display for BoundOverrun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} reaches {} but its bound is {}",
            self.parameter, self.planned_max, self.bound
        )
    }
}

/// One point of the grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trial {
    pub id: TrialId,
    pub curve_numbers: CurveNumbers,
    pub infiltration_mm_day: f64,
}

impl Trial {
    pub fn index(&self) -> u32 {
        self.id.index()
    }
}

impl fmt::Display for Trial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "trial {} ({}, infiltration={} mm/day)",
            self.id, self.curve_numbers, self.infiltration_mm_day
        )
    }
}

/// Complete search space of a calibration sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterGrid {
    curve_numbers: CurveNumberSweep,
    infiltration: InfiltrationSweep,
    bounds: GridBounds,
}

impl ParameterGrid {
    pub fn new(curve_numbers: CurveNumberSweep, infiltration: InfiltrationSweep) -> GridResult<Self> {
        if curve_numbers.steps == 0 {
            return Err(GridError::ZeroSteps {
                what: "Curve number",
            });
        }
        if infiltration.steps == 0 {
            return Err(GridError::ZeroSteps {
                what: "Infiltration",
            });
        }
        if !infiltration.floor_mm_day.is_finite() || infiltration.floor_mm_day < 0.0 {
            return Err(GridError::InvalidInfiltration {
                what: "floor",
                value: infiltration.floor_mm_day,
            });
        }
        if !infiltration.increment_mm_day.is_finite() || infiltration.increment_mm_day < 0.0 {
            return Err(GridError::InvalidInfiltration {
                what: "increment",
                value: infiltration.increment_mm_day,
            });
        }

        let count = u64::from(curve_numbers.steps) * u64::from(infiltration.steps);
        if count >= u64::from(u32::MAX) {
            return Err(GridError::TooManyTrials { count });
        }

        Ok(Self {
            curve_numbers,
            infiltration,
            bounds: GridBounds::default(),
        })
    }

    pub fn with_bounds(mut self, bounds: GridBounds) -> Self {
        self.bounds = bounds;
        self
    }

    pub fn infiltration_sweep(&self) -> &InfiltrationSweep {
        &self.infiltration
    }

    pub fn outer_steps(&self) -> u32 {
        self.curve_numbers.steps
    }

    pub fn inner_steps(&self) -> u32 {
        self.infiltration.steps
    }

    pub fn trial_count(&self) -> u32 {
        self.outer_steps() * self.inner_steps()
    }

    /// Curve numbers used on outer step `outer`.
    pub fn curve_numbers_at(&self, outer: u32) -> CurveNumbers {
        let sweep = &self.curve_numbers;
        sweep.start.raised(outer, sweep.increment, &sweep.held)
    }

    /// Infiltration used on inner step `inner`.
    pub fn infiltration_at(&self, inner: u32) -> f64 {
        // Multiply rather than accumulate so long sweeps do not drift.
        self.infiltration.floor_mm_day + f64::from(inner) * self.infiltration.increment_mm_day
    }

    /// Trial with the given index, if it is inside the grid.
    pub fn trial(&self, index: u32) -> Option<Trial> {
        if index >= self.trial_count() {
            return None;
        }
        let outer = index / self.inner_steps();
        let inner = index % self.inner_steps();
        Some(Trial {
            id: TrialId::from_index(index)?,
            curve_numbers: self.curve_numbers_at(outer),
            infiltration_mm_day: self.infiltration_at(inner),
        })
    }

    /// All trials in emission order.
    pub fn trials(&self) -> Trials<'_> {
        Trials {
            grid: self,
            next: 0,
        }
    }

    /// Planned values that exceed the configured bounds.
    pub fn bound_overruns(&self) -> Vec<BoundOverrun> {
        let mut overruns = Vec::new();
        let last_outer = self.outer_steps() - 1;
        let last_inner = self.inner_steps() - 1;

        if let Some(max) = self.bounds.curve_numbers_max {
            let planned = self.curve_numbers_at(last_outer);
            for group in SoilGroup::ALL {
                if planned.get(group) > max.get(group) {
                    overruns.push(BoundOverrun {
                        parameter: format!("CN_{}", group),
                        planned_max: f64::from(planned.get(group)),
                        bound: f64::from(max.get(group)),
                    });
                }
            }
        }

        if let Some(max) = self.bounds.infiltration_max_mm_day {
            let planned = self.infiltration_at(last_inner);
            if planned > max {
                overruns.push(BoundOverrun {
                    parameter: "Infiltration".to_string(),
                    planned_max: planned,
                    bound: max,
                });
            }
        }

        overruns
    }
}

impl fmt::Display for ParameterGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Grid {} CN steps (+{} from {}) x {} infiltration steps (+{} from {} mm/day)",
            self.curve_numbers.steps,
            self.curve_numbers.increment,
            self.curve_numbers.start,
            self.infiltration.steps,
            self.infiltration.increment_mm_day,
            self.infiltration.floor_mm_day
        )
    }
}

/// Iterator over the trials of a grid.
#[derive(Debug, Clone)]
pub struct Trials<'a> {
    grid: &'a ParameterGrid,
    next: u32,
}

impl Iterator for Trials<'_> {
    type Item = Trial;

    fn next(&mut self) -> Option<Trial> {
        let trial = self.grid.trial(self.next)?;
        self.next += 1;
        Some(trial)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.grid.trial_count().saturating_sub(self.next) as usize;
        (left, Some(left))
    }
}

impl ExactSizeIterator for Trials<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(cn_steps: u32, inf_steps: u32, floor: f64, inc: f64) -> ParameterGrid {
        ParameterGrid::new(
            CurveNumberSweep {
                start: CurveNumbers::new(72, 81, 88, 91).unwrap(),
                steps: cn_steps,
                increment: 1,
                held: vec![],
            },
            InfiltrationSweep {
                floor_mm_day: floor,
                steps: inf_steps,
                increment_mm_day: inc,
            },
        )
        .unwrap()
    }

    #[test]
    fn single_outer_step_walks_infiltration() {
        let g = grid(1, 3, 10.0, 5.0);
        let trials: Vec<Trial> = g.trials().collect();

        assert_eq!(trials.len(), 3);
        let inf: Vec<f64> = trials.iter().map(|t| t.infiltration_mm_day).collect();
        assert_eq!(inf, vec![10.0, 15.0, 20.0]);
        assert!(trials.iter().all(|t| t.curve_numbers == trials[0].curve_numbers));
        let idx: Vec<u32> = trials.iter().map(|t| t.index()).collect();
        assert_eq!(idx, vec![0, 1, 2]);
    }

    #[test]
    fn outer_steps_raise_curve_numbers() {
        let g = grid(3, 2, 62.0, 2.0);
        let trials: Vec<Trial> = g.trials().collect();

        assert_eq!(trials.len(), 6);
        assert_eq!(trials[0].curve_numbers.as_array(), [72, 81, 88, 91]);
        assert_eq!(trials[2].curve_numbers.as_array(), [73, 82, 89, 92]);
        assert_eq!(trials[4].curve_numbers.as_array(), [74, 83, 90, 93]);
        assert_eq!(trials[2].infiltration_mm_day, 62.0);
        assert_eq!(trials[5].infiltration_mm_day, 64.0);
    }

    #[test]
    fn random_access_matches_iteration() {
        let g = grid(4, 5, 0.0, 10.0);
        for t in g.trials() {
            assert_eq!(g.trial(t.index()), Some(t));
        }
        assert_eq!(g.trial(g.trial_count()), None);
    }

    #[test]
    fn reject_zero_steps() {
        let err = ParameterGrid::new(
            CurveNumberSweep {
                start: CurveNumbers::new(72, 81, 88, 91).unwrap(),
                steps: 0,
                increment: 1,
                held: vec![],
            },
            InfiltrationSweep {
                floor_mm_day: 0.0,
                steps: 1,
                increment_mm_day: 1.0,
            },
        )
        .unwrap_err();
        assert!(matches!(err, GridError::ZeroSteps { .. }));
    }

    #[test]
    fn reject_negative_floor() {
        let err = ParameterGrid::new(
            CurveNumberSweep {
                start: CurveNumbers::new(72, 81, 88, 91).unwrap(),
                steps: 1,
                increment: 1,
                held: vec![],
            },
            InfiltrationSweep {
                floor_mm_day: -1.0,
                steps: 1,
                increment_mm_day: 1.0,
            },
        )
        .unwrap_err();
        assert!(matches!(err, GridError::InvalidInfiltration { what: "floor", .. }));
    }

    #[test]
    fn overruns_are_reported_not_enforced() {
        let g = grid(5, 25, 0.0, 10.0).with_bounds(GridBounds {
            curve_numbers_max: Some(CurveNumbers::new(74, 83, 90, 93).unwrap()),
            infiltration_max_mm_day: Some(200.0),
        });

        assert_eq!(g.trial_count(), 125);
        let overruns = g.bound_overruns();
        let names: Vec<&str> = overruns.iter().map(|o| o.parameter.as_str()).collect();
        assert_eq!(names, vec!["CN_A", "CN_B", "CN_C", "CN_D", "Infiltration"]);
        assert_eq!(overruns[4].planned_max, 240.0);
    }

    #[test]
    fn no_overruns_without_bounds() {
        assert!(grid(5, 5, 0.0, 1.0).bound_overruns().is_empty());
    }
}
