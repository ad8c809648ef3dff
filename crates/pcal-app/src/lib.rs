//! Shared application service layer for potholecal.
//!
//! Turns a project file into a runnable sweep and provides the operations
//! used by the CLI: planning, running, offline re-scoring and ledger queries.

pub mod compile;
pub mod error;
pub mod progress;
pub mod project_service;
pub mod query;
pub mod rescore;
pub mod sweep_service;

pub use compile::{CompiledProject, FailurePolicy, OnFailure, compile_project};
pub use error::{AppError, AppResult};
pub use progress::{SweepProgressEvent, SweepStage};
pub use project_service::{load_and_compile, load_project, plan, PlannedTrial, SweepPlan};
pub use query::{BasinRanking, best_trials};
pub use rescore::{BasinRescore, TrialRescore, rescore};
pub use sweep_service::{
    CancelToken, FailureKind, SweepController, SweepSummary, TrialFailure, run_sweep,
};
