//! Project definition to runnable sweep.

use std::path::{Path, PathBuf};
use std::time::Duration;

use pcal_grid::{
    CN_CEILING, CurveNumberSweep, CurveNumbers, GridBounds, InfiltrationSweep, ParameterGrid,
    SoilGroup,
};
use pcal_model::{
    Basin, CalibrationWindow, CommandSpec, ExternalModelRunner, LandCover, OutputColumns,
    OutputExtractor, TrialInputWriter,
};
use pcal_project::schema::{
    BasinDef, CommandDef, CurveNumbersDef, GridDef, OnFailureDef, Project, SoilGroupDef,
};

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnFailure {
    Skip,
    Abort,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailurePolicy {
    /// Extra attempts after a failed model run
    pub max_retries: u32,
    pub on_failure: OnFailure,
}

/// Everything a sweep needs, with paths resolved.
#[derive(Debug, Clone)]
pub struct CompiledProject {
    pub name: String,
    pub grid: ParameterGrid,
    pub basins: Vec<Basin>,
    pub input_writer: TrialInputWriter,
    pub extractor: OutputExtractor,
    pub cleanup: Option<CommandSpec>,
    pub execute: CommandSpec,
    pub timeout: Duration,
    pub wetland_output: PathBuf,
    pub ledger_path: PathBuf,
    pub site_name: String,
    pub period_label: String,
    pub field_condition: String,
    pub failure_policy: FailurePolicy,
}

impl CompiledProject {
    pub fn runner(&self) -> ExternalModelRunner {
        ExternalModelRunner::new(self.cleanup.clone(), self.execute.clone(), self.timeout)
    }

    /// Ledger rows are tagged with the basin label only when basins share the sweep.
    pub fn is_multi_basin(&self) -> bool {
        self.basins.len() > 1
    }
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Bare program names are looked up on PATH; anything with a directory
/// part is taken relative to the project.
fn resolve_program(base: &Path, program: &Path) -> PathBuf {
    if program.components().count() > 1 {
        resolve(base, program)
    } else {
        program.to_path_buf()
    }
}

fn compile_command(base: &Path, def: &CommandDef) -> CommandSpec {
    CommandSpec {
        program: resolve_program(base, &def.program),
        args: def.args.clone(),
        working_dir: def.working_dir.as_deref().map(|dir| resolve(base, dir)),
    }
}

fn soil_group(def: SoilGroupDef) -> SoilGroup {
    match def {
        SoilGroupDef::A => SoilGroup::A,
        SoilGroupDef::B => SoilGroup::B,
        SoilGroupDef::C => SoilGroup::C,
        SoilGroupDef::D => SoilGroup::D,
    }
}

fn curve_numbers(def: &CurveNumbersDef) -> AppResult<CurveNumbers> {
    Ok(CurveNumbers::new(def.a, def.b, def.c, def.d)?)
}

/// Swept groups start `cn_offset_down` below the reference; held groups
/// stay at the reference.
pub fn compile_grid(def: &GridDef) -> AppResult<ParameterGrid> {
    let reference = curve_numbers(&def.cn_reference)?;
    let held: Vec<SoilGroup> = def.hold_fixed.iter().copied().map(soil_group).collect();

    let start_of = |group: SoilGroup| -> AppResult<u32> {
        let value = u32::from(reference.get(group));
        if held.contains(&group) {
            return Ok(value);
        }
        value.checked_sub(def.cn_offset_down).ok_or_else(|| {
            AppError::InvalidInput(format!(
                "CN_{group} reference {value} is below cn_offset_down {}",
                def.cn_offset_down
            ))
        })
    };
    let start = CurveNumbers::new(
        start_of(SoilGroup::A)?,
        start_of(SoilGroup::B)?,
        start_of(SoilGroup::C)?,
        start_of(SoilGroup::D)?,
    )?;

    let curve_numbers_max = match def.cn_offset_up {
        Some(up) => {
            let cap = |v: u8| (u32::from(v) + up).min(u32::from(CN_CEILING));
            let [a, b, c, d] = reference.as_array().map(cap);
            Some(CurveNumbers::new(a, b, c, d)?)
        }
        None => None,
    };

    let grid = ParameterGrid::new(
        CurveNumberSweep {
            start,
            steps: def.cn_steps,
            increment: def.cn_increment,
            held,
        },
        InfiltrationSweep {
            floor_mm_day: def.infiltration_reference - def.infiltration_offset_down,
            steps: def.infiltration_steps,
            increment_mm_day: def.infiltration_increment,
        },
    )?
    .with_bounds(GridBounds {
        curve_numbers_max,
        infiltration_max_mm_day: def
            .infiltration_offset_up
            .map(|up| def.infiltration_reference + up),
    });
    Ok(grid)
}

fn compile_basin(base: &Path, def: &BasinDef) -> AppResult<Basin> {
    let mut windows = Vec::with_capacity(def.windows.len());
    for window in &def.windows {
        let day = |d: &pcal_project::schema::DayDef| {
            d.to_gregorian_day()
                .map_err(|e| AppError::InvalidInput(format!("basin {}: {e}", def.label)))
        };
        windows.push(CalibrationWindow::new(day(&window.start)?, day(&window.end)?));
    }

    Ok(Basin {
        id: def.id,
        reach_id: def.reach_id,
        label: def.label.clone(),
        area_ha: def.area_ha,
        initial_depth_mm: def.initial_depth_mm,
        min_depth_mm: def.min_depth_mm,
        max_depth_mm: def.max_depth_mm,
        weir_coefficient: def.weir_coefficient,
        weir_width_m: def.weir_width_m,
        weir_height_override_m: def.weir_height_m,
        windows,
        observed_path: resolve(base, &def.observed),
        simulated_path: resolve(base, &def.simulated_output),
    })
}

/// Compile a validated project. Relative paths are taken from `base_dir`,
/// normally the directory holding the project file.
pub fn compile_project(project: &Project, base_dir: &Path) -> AppResult<CompiledProject> {
    let grid = compile_grid(&project.grid)?;
    let basins = project
        .basins
        .iter()
        .map(|b| compile_basin(base_dir, b))
        .collect::<AppResult<Vec<_>>>()?;

    let mut reference_rows = Vec::with_capacity(project.land_cover.reference_rows.len());
    for row in &project.land_cover.reference_rows {
        reference_rows.push((row.name.clone(), curve_numbers(&row.cn)?));
    }
    let land_cover = LandCover {
        calibrated_class: project.land_cover.calibrated_class.clone(),
        reference_rows,
    };

    let cols = project.output_columns;
    let extractor = OutputExtractor::new(OutputColumns {
        day: cols.day,
        basin: cols.basin,
        depth: cols.depth,
        min_columns: cols.min_columns,
    });

    let site_name = project
        .ledger
        .site_name
        .clone()
        .unwrap_or_else(|| basins.iter().map(|b| b.label.as_str()).collect());

    let paths = &project.paths;
    Ok(CompiledProject {
        name: project.name.clone(),
        grid,
        input_writer: TrialInputWriter::new(
            resolve(base_dir, &paths.wetland_input),
            resolve(base_dir, &paths.curve_number_input),
            land_cover,
        ),
        extractor,
        cleanup: project
            .model
            .cleanup
            .as_ref()
            .map(|c| compile_command(base_dir, c)),
        execute: compile_command(base_dir, &project.model.execute),
        timeout: Duration::try_from_secs_f64(project.model.timeout_s).map_err(|_| {
            AppError::InvalidInput(format!("model timeout {} s", project.model.timeout_s))
        })?,
        wetland_output: resolve(base_dir, &paths.wetland_output),
        ledger_path: resolve(base_dir, &paths.ledger),
        site_name,
        period_label: project.ledger.period_label.clone(),
        field_condition: project.ledger.field_condition.clone(),
        failure_policy: FailurePolicy {
            max_retries: project.failure_policy.max_retries,
            on_failure: match project.failure_policy.on_failure {
                OnFailureDef::Skip => OnFailure::Skip,
                OnFailureDef::Abort => OnFailure::Abort,
            },
        },
        basins,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pcal_project::schema::GridDef;

    fn grid_def() -> GridDef {
        GridDef {
            cn_reference: CurveNumbersDef {
                a: 72,
                b: 81,
                c: 88,
                d: 91,
            },
            cn_offset_down: 2,
            cn_offset_up: Some(2),
            cn_steps: 5,
            cn_increment: 1,
            hold_fixed: vec![SoilGroupDef::A, SoilGroupDef::D],
            infiltration_reference: 70.0,
            infiltration_offset_down: 8.0,
            infiltration_offset_up: Some(10.0),
            infiltration_steps: 10,
            infiltration_increment: 2.0,
        }
    }

    #[test]
    fn held_groups_stay_at_reference() {
        let grid = compile_grid(&grid_def()).unwrap();
        assert_eq!(grid.trial_count(), 50);

        let first = grid.trial(0).unwrap();
        assert_eq!(first.curve_numbers.as_array(), [72, 79, 86, 91]);
        assert_eq!(first.infiltration_mm_day, 62.0);

        let last = grid.trial(49).unwrap();
        assert_eq!(last.curve_numbers.as_array(), [72, 83, 90, 91]);
        assert_eq!(last.infiltration_mm_day, 80.0);
        assert!(grid.bound_overruns().is_empty());
    }

    #[test]
    fn overruns_are_reported_not_enforced() {
        let mut def = grid_def();
        def.cn_steps = 8;
        def.infiltration_steps = 12;
        let grid = compile_grid(&def).unwrap();

        assert_eq!(grid.trial_count(), 96);
        let overruns = grid.bound_overruns();
        let names: Vec<&str> = overruns.iter().map(|o| o.parameter.as_str()).collect();
        assert_eq!(names, vec!["CN_B", "CN_C", "Infiltration"]);
    }

    #[test]
    fn relative_paths_follow_the_project_directory() {
        let base = Path::new("/data/henplume");
        assert_eq!(
            resolve(base, Path::new("out/stats.csv")),
            PathBuf::from("/data/henplume/out/stats.csv")
        );
        assert_eq!(resolve(base, Path::new("/abs/x.csv")), PathBuf::from("/abs/x.csv"));
        assert_eq!(resolve_program(base, Path::new("sh")), PathBuf::from("sh"));
        assert_eq!(
            resolve_program(base, Path::new("bin/run.bat")),
            PathBuf::from("/data/henplume/bin/run.bat")
        );
    }
}
