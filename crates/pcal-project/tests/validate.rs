use pcal_project::schema::*;
use pcal_project::{ValidationError, validate_project};

const BASE: &str = r#"
version: 1
name: Validation
paths:
  wetland_input: w.csv
  curve_number_input: cn.csv
  wetland_output: out.csv
  ledger: stats.csv
model:
  execute:
    program: run.bat
grid:
  cn_reference: { a: 72, b: 81, c: 88, d: 91 }
  cn_steps: 2
  infiltration_reference: 10
  infiltration_steps: 3
  infiltration_increment: 5
basins:
  - id: 1
    reach_id: 2
    label: One
    area_ha: 1.0
    max_depth_mm: 500
    windows:
      - { start: 150, end: 250 }
    observed: obs.txt
    simulated_output: sim.txt
"#;

fn base() -> Project {
    serde_yaml::from_str(BASE).unwrap()
}

#[test]
fn base_project_is_valid() {
    validate_project(&base()).unwrap();
}

#[test]
fn rejects_duplicate_basin_ids() {
    let mut project = base();
    let mut twin = project.basins[0].clone();
    twin.label = "Two".to_string();
    project.basins.push(twin);

    let err = validate_project(&project).unwrap_err();
    assert!(matches!(err, ValidationError::DuplicateId { .. }));
}

#[test]
fn rejects_curve_number_above_99() {
    let mut project = base();
    project.grid.cn_reference.d = 100;
    let err = validate_project(&project).unwrap_err();
    assert!(err.to_string().contains("grid.cn_reference.d"));
}

#[test]
fn rejects_negative_infiltration_floor() {
    let mut project = base();
    project.grid.infiltration_offset_down = 11.0;
    let err = validate_project(&project).unwrap_err();
    assert!(err.to_string().contains("infiltration floor"));
}

#[test]
fn rejects_zero_steps() {
    let mut project = base();
    project.grid.infiltration_steps = 0;
    assert!(validate_project(&project).is_err());
}

#[test]
fn rejects_inverted_window() {
    let mut project = base();
    project.basins[0].windows[0] = WindowDef {
        start: DayDef::Ordinal(300),
        end: DayDef::Ordinal(200),
    };
    let err = validate_project(&project).unwrap_err();
    assert!(err.to_string().contains("end precedes start"));
}

#[test]
fn rejects_malformed_window_date() {
    let mut project = base();
    project.basins[0].windows[0].start = DayDef::Date("24/05/2018".to_string());
    assert!(validate_project(&project).is_err());
}

#[test]
fn rejects_non_positive_area_and_timeout() {
    let mut project = base();
    project.basins[0].area_ha = 0.0;
    assert!(validate_project(&project).is_err());

    let mut project = base();
    project.model.timeout_s = 0.0;
    assert!(validate_project(&project).is_err());
}

#[test]
fn rejects_future_version() {
    let mut project = base();
    project.version = 2;
    assert!(matches!(
        validate_project(&project).unwrap_err(),
        ValidationError::UnsupportedVersion { version: 2 }
    ));
}

#[test]
fn rejects_depth_column_outside_row() {
    let mut project = base();
    project.output_columns.depth = 40;
    assert!(validate_project(&project).is_err());
}
