//! Offline re-scoring of the current model output.

use pcal_grid::Trial;
use pcal_model::{read_series, write_series};
use pcal_stats::{FitError, FitStatistics, evaluate};

use crate::compile::CompiledProject;
use crate::error::{AppError, AppResult};

/// Statistics of one basin, or why it could not be scored.
#[derive(Debug, Clone, PartialEq)]
pub struct BasinRescore {
    pub basin: String,
    pub simulated_len: usize,
    pub observed_len: usize,
    pub result: Result<FitStatistics, FitError>,
}

/// Re-scored output, with the grid point it was produced for.
#[derive(Debug, Clone, PartialEq)]
pub struct TrialRescore {
    pub trial: Trial,
    pub basins: Vec<BasinRescore>,
}

/// Re-extract the wetland output left by the last model run and score it
/// again, without touching the input files or the ledger. The output is
/// attributed to the parameters of `trial_index`.
pub fn rescore(project: &CompiledProject, trial_index: u32) -> AppResult<TrialRescore> {
    let trial = project
        .grid
        .trial(trial_index)
        .ok_or(AppError::TrialOutOfRange {
            index: trial_index,
            count: project.grid.trial_count(),
        })?;
    tracing::info!(%trial, output = %project.wetland_output.display(), "re-scoring model output");

    let output = project.extractor.read(&project.wetland_output)?;
    let mut basins = Vec::with_capacity(project.basins.len());
    for basin in &project.basins {
        let observed = read_series(&basin.observed_path).map_err(|e| AppError::Observed {
            path: basin.observed_path.clone(),
            reason: e.to_string(),
        })?;
        write_series(&basin.simulated_path, &output.basin_series(basin))?;
        let simulated = read_series(&basin.simulated_path)?;

        basins.push(BasinRescore {
            basin: basin.label.clone(),
            simulated_len: simulated.len(),
            observed_len: observed.len(),
            result: evaluate(&observed, &simulated),
        });
    }
    Ok(TrialRescore { trial, basins })
}
