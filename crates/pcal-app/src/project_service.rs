//! Project loading, compilation and planning.

use std::path::Path;

use pcal_project::schema::Project;
use serde::Serialize;

use crate::compile::{CompiledProject, compile_project};
use crate::error::AppResult;

/// Load and validate a project file (YAML, or JSON by extension).
pub fn load_project(path: &Path) -> AppResult<Project> {
    Ok(pcal_project::load_project_file(path)?)
}

/// Load a project and compile it against its own directory.
pub fn load_and_compile(path: &Path) -> AppResult<CompiledProject> {
    let project = load_project(path)?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    compile_project(&project, base_dir)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedTrial {
    pub index: u32,
    pub cn_a: u8,
    pub cn_b: u8,
    pub cn_c: u8,
    pub cn_d: u8,
    pub infiltration_mm_day: f64,
}

/// The trial grid of a project, without running anything.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepPlan {
    pub name: String,
    pub basins: Vec<String>,
    pub outer_steps: u32,
    pub inner_steps: u32,
    pub trial_count: u32,
    pub overruns: Vec<String>,
    pub trials: Vec<PlannedTrial>,
}

pub fn plan(project: &CompiledProject) -> SweepPlan {
    let grid = &project.grid;
    SweepPlan {
        name: project.name.clone(),
        basins: project.basins.iter().map(|b| b.label.clone()).collect(),
        outer_steps: grid.outer_steps(),
        inner_steps: grid.inner_steps(),
        trial_count: grid.trial_count(),
        overruns: grid.bound_overruns().iter().map(|o| o.to_string()).collect(),
        trials: grid
            .trials()
            .map(|t| {
                let [cn_a, cn_b, cn_c, cn_d] = t.curve_numbers.as_array();
                PlannedTrial {
                    index: t.index(),
                    cn_a,
                    cn_b,
                    cn_c,
                    cn_d,
                    infiltration_mm_day: t.infiltration_mm_day,
                }
            })
            .collect(),
    }
}
