//! Error types for the pcal-app service layer.

use std::path::PathBuf;

/// Application error wrapping the backend crates.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Project error: {0}")]
    Project(#[from] pcal_project::ProjectError),

    #[error("Grid error: {0}")]
    Grid(#[from] pcal_grid::GridError),

    #[error("Model error: {0}")]
    Model(#[from] pcal_model::ModelError),

    #[error("Ledger error: {0}")]
    Results(#[from] pcal_results::ResultsError),

    #[error("Observed series {path} is unusable: {reason}")]
    Observed { path: PathBuf, reason: String },

    #[error("Trial {index} is outside the grid of {count} trials")]
    TrialOutOfRange { index: u32, count: u32 },

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for pcal-app operations.
pub type AppResult<T> = Result<T, AppError>;
