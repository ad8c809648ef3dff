use std::path::PathBuf;

use thiserror::Error;

use crate::runner::RunStep;

pub type ModelResult<T> = Result<T, ModelError>;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("{step} command '{program}' failed with {status}")]
    CommandFailed {
        step: RunStep,
        program: String,
        status: String,
    },

    #[error("{step} command '{program}' timed out after {timeout_s} s")]
    Timeout {
        step: RunStep,
        program: String,
        timeout_s: f64,
    },

    #[error("Failed to start {step} command '{program}': {source}")]
    Spawn {
        step: RunStep,
        program: String,
        source: std::io::Error,
    },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{path}:{line}: '{text}' is not a number")]
    SeriesParse {
        path: PathBuf,
        line: usize,
        text: String,
    },

    #[error("Malformed model file {path}: {message}")]
    Malformed { path: PathBuf, message: String },
}

impl ModelError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ModelError::Io {
            path: path.into(),
            source,
        }
    }

    /// Failures of the external model itself. These end the current trial
    /// and may be retried; everything else points at the environment.
    pub fn is_trial_fatal(&self) -> bool {
        matches!(
            self,
            ModelError::CommandFailed { .. } | ModelError::Timeout { .. } | ModelError::Spawn { .. }
        )
    }
}
