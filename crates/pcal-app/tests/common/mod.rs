//! Fixture project and a fake model for sweep tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use pcal_app::{CompiledProject, compile_project};
use pcal_grid::Trial;
use pcal_model::{ModelError, ModelResult, ModelRunner, RunStep};
use pcal_project::schema::Project;

/// Days 150..=154 are calibrated; the fake model also writes days outside.
pub const FIRST_DAY: u32 = 148;
pub const LAST_DAY: u32 = 156;

pub fn fixture_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("pcal_app_{name}"));
    if dir.exists() {
        std::fs::remove_dir_all(&dir).unwrap();
    }
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

/// Depth the fake model simulates on `day` for `infiltration` (mm).
pub fn fake_depth_mm(infiltration: f64, day: u32) -> f64 {
    infiltration + 10.0 * f64::from(day - FIRST_DAY)
}

pub fn project_yaml(basins: usize) -> String {
    let mut yaml = String::from(
        r#"
version: 1
name: Fixture
paths:
  wetland_input: wetland.csv
  curve_number_input: rcn.csv
  wetland_output: wetland_effects.csv
  ledger: out/stats.csv
model:
  execute:
    program: annagnps
grid:
  cn_reference: { a: 72, b: 81, c: 88, d: 91 }
  cn_steps: 2
  infiltration_reference: 10
  infiltration_steps: 3
  infiltration_increment: 5
ledger:
  period_label: "2018"
  field_condition: Straight Row Crop Poor
basins:
"#,
    );
    for (id, label) in [(1, "Hen"), (2, "Plume")].into_iter().take(basins) {
        yaml.push_str(&format!(
            r#"  - id: {id}
    reach_id: 9
    label: {label}
    area_ha: 1.0
    max_depth_mm: 600
    windows:
      - {{ start: 150, end: 154 }}
    observed: obs_{label}.txt
    simulated_output: sim_{label}.txt
"#
        ));
    }
    yaml
}

/// Observed volumes matching the fake model at `infiltration` (area 1 ha).
pub fn write_observed(dir: &Path, label: &str, infiltration: f64) {
    let values: Vec<String> = (150..=154)
        .map(|day| (fake_depth_mm(infiltration, day) * 10.0).to_string())
        .collect();
    std::fs::write(
        dir.join(format!("obs_{label}.txt")),
        format!("# {label} volume, m3\n{}\n", values.join("\n")),
    )
    .unwrap();
}

pub fn compile(dir: &Path, yaml: &str) -> CompiledProject {
    let project: Project = serde_yaml::from_str(yaml).unwrap();
    pcal_project::validate_project(&project).unwrap();
    compile_project(&project, dir).unwrap()
}

pub fn output_row(day: u32, basin: u32, depth_mm: f64) -> String {
    let mut fields = vec!["0.".to_string(); 34];
    fields[0] = day.to_string();
    fields[4] = basin.to_string();
    fields[14] = depth_mm.to_string();
    fields.join(",")
}

/// Writes a synthetic wetland effects file instead of running AnnAGNPS.
pub struct FakeModel {
    pub output: PathBuf,
    pub basin_ids: Vec<u32>,
    /// Trials that fail on every attempt
    pub always_fail: Vec<u32>,
    /// Remaining failures per trial before it succeeds
    pub fail_times: HashMap<u32, u32>,
    /// Trials that exceed the model timeout on every attempt
    pub time_out: Vec<u32>,
    pub calls: Vec<u32>,
}

impl FakeModel {
    pub fn new(project: &CompiledProject) -> Self {
        Self {
            output: project.wetland_output.clone(),
            basin_ids: project.basins.iter().map(|b| b.id).collect(),
            always_fail: Vec::new(),
            fail_times: HashMap::new(),
            time_out: Vec::new(),
            calls: Vec::new(),
        }
    }

    fn failure() -> ModelError {
        ModelError::CommandFailed {
            step: RunStep::Execute,
            program: "annagnps".to_string(),
            status: "exit status: 1".to_string(),
        }
    }
}

impl ModelRunner for FakeModel {
    fn run(&mut self, trial: &Trial) -> ModelResult<()> {
        let index = trial.index();
        self.calls.push(index);
        if self.always_fail.contains(&index) {
            let _ = std::fs::remove_file(&self.output);
            return Err(Self::failure());
        }
        if self.time_out.contains(&index) {
            let _ = std::fs::remove_file(&self.output);
            return Err(ModelError::Timeout {
                step: RunStep::Execute,
                program: "annagnps".to_string(),
                timeout_s: 1800.0,
            });
        }
        if let Some(left) = self.fail_times.get_mut(&index) {
            if *left > 0 {
                *left -= 1;
                return Err(Self::failure());
            }
        }

        let mut text = String::from("Day,Month,Year,Reach_ID,Wetland_ID\n");
        for day in FIRST_DAY..=LAST_DAY {
            for id in &self.basin_ids {
                text.push_str(&output_row(day, *id, fake_depth_mm(trial.infiltration_mm_day, day)));
                text.push('\n');
            }
        }
        text.push_str("Totals,,,\n");
        std::fs::write(&self.output, text).unwrap();
        Ok(())
    }
}
