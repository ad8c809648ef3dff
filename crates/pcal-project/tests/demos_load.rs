use std::path::Path;

use pcal_project::schema::*;
use pcal_project::load_yaml;

fn demo(name: &str) -> std::path::PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../../demos/projects")
        .join(name)
}

#[test]
fn single_basin_demo_loads() {
    let project = load_yaml(&demo("bunny_volume.yaml")).expect("demo should load");

    assert_eq!(project.basins.len(), 1);
    let basin = &project.basins[0];
    assert_eq!(basin.label, "Bunny");
    assert_eq!(basin.windows.len(), 2);
    assert_eq!(basin.windows[0].start.to_gregorian_day().unwrap(), 736_458);
    assert_eq!(basin.windows[1].start, DayDef::Ordinal(736_838));
    assert_eq!(basin.weir_coefficient, 2.0);
    assert_eq!(project.grid.cn_increment, 1);
    assert_eq!(project.land_cover, LandCoverDef::default());
    assert_eq!(project.output_columns, OutputColumnsDef::default());
    assert_eq!(project.failure_policy.on_failure, OnFailureDef::Skip);
    assert_eq!(project.model.timeout_s, 1800.0);
}

#[test]
fn multi_basin_demo_loads() {
    let project = load_yaml(&demo("henplume.yaml")).expect("demo should load");

    let labels: Vec<&str> = project.basins.iter().map(|b| b.label.as_str()).collect();
    assert_eq!(labels, vec!["Hen", "Plume"]);
    assert_eq!(project.grid.hold_fixed, vec![SoilGroupDef::A, SoilGroupDef::D]);
    assert_eq!(project.grid.cn_offset_down, 2);
    assert_eq!(project.ledger.site_name.as_deref(), Some("HenPlume"));
    assert_eq!(project.ledger.period_label, "2018");
    assert_eq!(project.failure_policy.max_retries, 1);
    assert_eq!(project.model.timeout_s, 3600.0);
}
