//! Project validation logic.

use std::collections::HashSet;

use crate::schema::{BasinDef, CurveNumbersDef, GridDef, LandCoverDef, ModelDef, Project};

#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("Duplicate ID: {id} in {context}")]
    DuplicateId { id: String, context: String },

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing {what}")]
    Missing { what: String },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

fn invalid(field: impl Into<String>, value: impl ToString, reason: &str) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.into(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

pub fn validate_project(project: &Project) -> Result<(), ValidationError> {
    if project.version == 0 || project.version > crate::LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: project.version,
        });
    }

    validate_model(&project.model)?;
    validate_grid(&project.grid)?;
    validate_land_cover(&project.land_cover)?;

    if project.basins.is_empty() {
        return Err(ValidationError::Missing {
            what: "basins: at least one basin is required".to_string(),
        });
    }

    let mut basin_ids = HashSet::new();
    let mut labels = HashSet::new();
    for basin in &project.basins {
        if !basin_ids.insert(basin.id) {
            return Err(ValidationError::DuplicateId {
                id: basin.id.to_string(),
                context: "basins".to_string(),
            });
        }
        if !labels.insert(basin.label.as_str()) {
            return Err(ValidationError::DuplicateId {
                id: basin.label.clone(),
                context: "basin labels".to_string(),
            });
        }
        validate_basin(basin)?;
    }

    let cols = &project.output_columns;
    let widest = cols.day.max(cols.basin).max(cols.depth);
    if widest >= cols.min_columns {
        return Err(invalid(
            "output_columns.min_columns",
            cols.min_columns,
            "must exceed every column index in use",
        ));
    }

    Ok(())
}

fn validate_model(model: &ModelDef) -> Result<(), ValidationError> {
    if !(model.timeout_s.is_finite() && model.timeout_s > 0.0) {
        return Err(invalid("model.timeout_s", model.timeout_s, "must be positive"));
    }
    if model.execute.program.as_os_str().is_empty() {
        return Err(ValidationError::Missing {
            what: "model.execute.program".to_string(),
        });
    }
    if let Some(cleanup) = &model.cleanup {
        if cleanup.program.as_os_str().is_empty() {
            return Err(ValidationError::Missing {
                what: "model.cleanup.program".to_string(),
            });
        }
    }
    Ok(())
}

fn validate_curve_numbers(field: &str, cn: &CurveNumbersDef) -> Result<(), ValidationError> {
    for (group, value) in [("a", cn.a), ("b", cn.b), ("c", cn.c), ("d", cn.d)] {
        if value > 99 {
            return Err(invalid(format!("{field}.{group}"), value, "must be in [0, 99]"));
        }
    }
    Ok(())
}

fn validate_grid(grid: &GridDef) -> Result<(), ValidationError> {
    validate_curve_numbers("grid.cn_reference", &grid.cn_reference)?;

    let lowest = grid
        .cn_reference
        .a
        .min(grid.cn_reference.b)
        .min(grid.cn_reference.c)
        .min(grid.cn_reference.d);
    if grid.cn_offset_down > lowest {
        return Err(invalid(
            "grid.cn_offset_down",
            grid.cn_offset_down,
            "would start a curve number below 0",
        ));
    }
    if grid.cn_steps == 0 {
        return Err(invalid("grid.cn_steps", grid.cn_steps, "must be at least 1"));
    }
    if grid.infiltration_steps == 0 {
        return Err(invalid(
            "grid.infiltration_steps",
            grid.infiltration_steps,
            "must be at least 1",
        ));
    }

    let floor = grid.infiltration_reference - grid.infiltration_offset_down;
    if !floor.is_finite() || floor < 0.0 {
        return Err(invalid(
            "grid.infiltration_offset_down",
            grid.infiltration_offset_down,
            "infiltration floor must be non-negative",
        ));
    }
    if !grid.infiltration_increment.is_finite() || grid.infiltration_increment < 0.0 {
        return Err(invalid(
            "grid.infiltration_increment",
            grid.infiltration_increment,
            "must be non-negative",
        ));
    }
    if let Some(up) = grid.infiltration_offset_up {
        if !up.is_finite() || up < 0.0 {
            return Err(invalid("grid.infiltration_offset_up", up, "must be non-negative"));
        }
    }

    let trials = u64::from(grid.cn_steps) * u64::from(grid.infiltration_steps);
    if trials >= u64::from(u32::MAX) {
        return Err(invalid("grid", trials, "too many trials"));
    }
    Ok(())
}

fn validate_land_cover(land_cover: &LandCoverDef) -> Result<(), ValidationError> {
    if land_cover.calibrated_class.trim().is_empty() {
        return Err(ValidationError::Missing {
            what: "land_cover.calibrated_class".to_string(),
        });
    }
    let mut names = HashSet::new();
    names.insert(land_cover.calibrated_class.as_str());
    for row in &land_cover.reference_rows {
        if !names.insert(row.name.as_str()) {
            return Err(ValidationError::DuplicateId {
                id: row.name.clone(),
                context: "land_cover classes".to_string(),
            });
        }
        if row.name.contains(',') {
            return Err(invalid("land_cover.reference_rows.name", &row.name, "must not contain ','"));
        }
        validate_curve_numbers(&format!("land_cover.{}", row.name), &row.cn)?;
    }
    if land_cover.calibrated_class.contains(',') {
        return Err(invalid(
            "land_cover.calibrated_class",
            &land_cover.calibrated_class,
            "must not contain ','",
        ));
    }
    Ok(())
}

fn validate_basin(basin: &BasinDef) -> Result<(), ValidationError> {
    let ctx = |field: &str| format!("basins[{}].{}", basin.label, field);

    if basin.label.trim().is_empty() || basin.label.contains(',') {
        return Err(invalid(ctx("label"), &basin.label, "must be non-empty without ','"));
    }
    if !(basin.area_ha.is_finite() && basin.area_ha > 0.0) {
        return Err(invalid(ctx("area_ha"), basin.area_ha, "must be positive"));
    }
    if !(basin.max_depth_mm.is_finite() && basin.max_depth_mm > 0.0) {
        return Err(invalid(ctx("max_depth_mm"), basin.max_depth_mm, "must be positive"));
    }
    for (field, value) in [
        ("initial_depth_mm", basin.initial_depth_mm),
        ("min_depth_mm", basin.min_depth_mm),
        ("weir_coefficient", basin.weir_coefficient),
        ("weir_width_m", basin.weir_width_m),
    ] {
        if !(value.is_finite() && value >= 0.0) {
            return Err(invalid(ctx(field), value, "must be non-negative"));
        }
    }
    if basin.min_depth_mm > basin.max_depth_mm || basin.initial_depth_mm > basin.max_depth_mm {
        return Err(invalid(
            ctx("max_depth_mm"),
            basin.max_depth_mm,
            "must be at least the initial and minimum depth",
        ));
    }
    if let Some(h) = basin.weir_height_m {
        if !(h.is_finite() && h >= 0.0) {
            return Err(invalid(ctx("weir_height_m"), h, "must be non-negative"));
        }
    }

    if basin.windows.is_empty() {
        return Err(ValidationError::Missing {
            what: ctx("windows"),
        });
    }
    for (i, window) in basin.windows.iter().enumerate() {
        let start = window
            .start
            .to_gregorian_day()
            .map_err(|e| invalid(ctx(&format!("windows[{i}].start")), e, "invalid day"))?;
        let end = window
            .end
            .to_gregorian_day()
            .map_err(|e| invalid(ctx(&format!("windows[{i}].end")), e, "invalid day"))?;
        if end < start {
            return Err(invalid(
                ctx(&format!("windows[{i}]")),
                format!("{start}..{end}"),
                "end precedes start",
            ));
        }
    }

    if basin.observed.as_os_str().is_empty() {
        return Err(ValidationError::Missing {
            what: ctx("observed"),
        });
    }
    if basin.simulated_output.as_os_str().is_empty() {
        return Err(ValidationError::Missing {
            what: ctx("simulated_output"),
        });
    }
    Ok(())
}
