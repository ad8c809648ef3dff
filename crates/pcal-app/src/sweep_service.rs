//! Calibration sweep execution.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use pcal_grid::Trial;
use pcal_model::{ModelError, ModelRunner, WetlandOutput, read_series, write_series};
use pcal_results::{LedgerHeader, LedgerRow, LedgerScores, ResultLedger, RowOutcome};
use pcal_stats::{FitError, evaluate};

use crate::compile::{CompiledProject, OnFailure};
use crate::error::{AppError, AppResult};
use crate::progress::{SweepProgressEvent, SweepStage};
use crate::project_service;

/// Cooperative cancellation flag, checked between trials.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Cleanup or execute failed to start or exited non-zero
    ModelRun,
    Timeout,
    /// The model finished but its output file could not be read
    MissingOutput,
    LengthMismatch,
    /// Series the statistics cannot be computed on
    Statistics,
}

impl FailureKind {
    fn of_model_error(err: &ModelError) -> Self {
        match err {
            ModelError::Timeout { .. } => FailureKind::Timeout,
            _ => FailureKind::ModelRun,
        }
    }
}

/// A trial (or one basin of it) that was recorded with a failure marker.
#[derive(Debug, Clone, PartialEq)]
pub struct TrialFailure {
    pub trial: u32,
    /// `None` when every basin of the trial failed together
    pub basin: Option<String>,
    pub kind: FailureKind,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct SweepSummary {
    pub trial_count: u32,
    pub trials_run: u32,
    pub rows_scored: usize,
    pub rows_failed: usize,
    pub retries: u32,
    pub cancelled: bool,
    pub aborted: bool,
    pub failures: Vec<TrialFailure>,
    pub elapsed_wall_s: f64,
}

struct Progress<'a> {
    cb: Option<&'a mut dyn FnMut(SweepProgressEvent)>,
    started: Instant,
    trial_count: u32,
}

impl Progress<'_> {
    fn emit(&mut self, stage: SweepStage, trial: Option<u32>, message: Option<String>) {
        if let Some(cb) = self.cb.as_deref_mut() {
            cb(SweepProgressEvent {
                stage,
                trial,
                trial_count: self.trial_count,
                elapsed_wall_s: self.started.elapsed().as_secs_f64(),
                message,
            });
        }
    }
}

/// Owns the grid walk, the shared model files and the ledger for one sweep.
pub struct SweepController<R: ModelRunner> {
    project: CompiledProject,
    runner: R,
    cancel: CancelToken,
    stop_file: Option<PathBuf>,
}

impl<R: ModelRunner> SweepController<R> {
    pub fn new(project: CompiledProject, runner: R) -> Self {
        Self {
            project,
            runner,
            cancel: CancelToken::new(),
            stop_file: None,
        }
    }

    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    /// The sweep stops before the next trial once this file exists.
    pub fn with_stop_file(mut self, path: PathBuf) -> Self {
        self.stop_file = Some(path);
        self
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn project(&self) -> &CompiledProject {
        &self.project
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    fn should_stop(&self) -> bool {
        if self.cancel.is_cancelled() {
            return true;
        }
        match &self.stop_file {
            Some(path) if path.exists() => {
                tracing::info!(path = %path.display(), "stop file found");
                self.cancel.cancel();
                true
            }
            _ => false,
        }
    }

    fn load_observed(&self) -> AppResult<Vec<Vec<f64>>> {
        let mut all = Vec::with_capacity(self.project.basins.len());
        for basin in &self.project.basins {
            let observed =
                read_series(&basin.observed_path).map_err(|e| AppError::Observed {
                    path: basin.observed_path.clone(),
                    reason: e.to_string(),
                })?;
            let window_days: i64 = basin.windows.iter().map(|w| w.len_days()).sum();
            if window_days != observed.len() as i64 {
                tracing::warn!(
                    basin = %basin.label,
                    observed = observed.len(),
                    window_days,
                    "observed series length differs from the calibration window days"
                );
            }
            all.push(observed);
        }
        Ok(all)
    }

    fn ledger_header(&self) -> LedgerHeader {
        LedgerHeader {
            started: chrono::Local::now().naive_local(),
            site: self.project.site_name.clone(),
            period: self.project.period_label.clone(),
            field_condition: self.project.field_condition.clone(),
            basin_column: self.project.is_multi_basin(),
        }
    }

    fn row(&self, trial: &Trial, outcome: RowOutcome, label: &str) -> LedgerRow {
        LedgerRow {
            trial: trial.index(),
            curve_numbers: trial.curve_numbers,
            infiltration_mm_day: trial.infiltration_mm_day,
            outcome,
            basin: self.project.is_multi_basin().then(|| label.to_string()),
        }
    }

    /// Run the model, retrying trial-fatal failures per the policy. The
    /// outer error is sweep-fatal, the inner one ends only this trial.
    fn run_model(
        &mut self,
        trial: &Trial,
        summary: &mut SweepSummary,
        progress: &mut Progress<'_>,
    ) -> AppResult<Result<(), ModelError>> {
        let max_retries = self.project.failure_policy.max_retries;
        let mut attempt = 0;
        loop {
            progress.emit(SweepStage::RunningModel { attempt }, Some(trial.index()), None);
            match self.runner.run(trial) {
                Ok(()) => return Ok(Ok(())),
                Err(err) if !err.is_trial_fatal() => return Err(err.into()),
                Err(err) if attempt < max_retries => {
                    attempt += 1;
                    summary.retries += 1;
                    tracing::warn!(
                        trial = trial.index(),
                        attempt,
                        error = %err,
                        "model run failed, retrying"
                    );
                }
                Err(err) => return Ok(Err(err)),
            }
        }
    }

    fn score_basins(
        &self,
        trial: &Trial,
        output: &WetlandOutput,
        observed: &[Vec<f64>],
        summary: &mut SweepSummary,
    ) -> AppResult<Vec<LedgerRow>> {
        let mut rows = Vec::with_capacity(self.project.basins.len());
        for (basin, observed) in self.project.basins.iter().zip(observed) {
            write_series(&basin.simulated_path, &output.basin_series(basin))?;
            let simulated = read_series(&basin.simulated_path)?;

            let outcome = match evaluate(observed, &simulated) {
                Ok(stats) => {
                    tracing::debug!(
                        trial = trial.index(),
                        basin = %basin.label,
                        nse = stats.nse,
                        pbias = stats.pbias,
                        "trial scored"
                    );
                    RowOutcome::Scored(LedgerScores::from(&stats))
                }
                Err(err) => {
                    let kind = match err {
                        FitError::LengthMismatch { .. } => FailureKind::LengthMismatch,
                        _ => FailureKind::Statistics,
                    };
                    tracing::warn!(
                        trial = trial.index(),
                        basin = %basin.label,
                        error = %err,
                        "basin could not be scored"
                    );
                    summary.failures.push(TrialFailure {
                        trial: trial.index(),
                        basin: Some(basin.label.clone()),
                        kind,
                        message: err.to_string(),
                    });
                    RowOutcome::Failed
                }
            };
            rows.push(self.row(trial, outcome, &basin.label));
        }
        Ok(rows)
    }

    pub fn run(&mut self) -> AppResult<SweepSummary> {
        self.run_with_progress(None)
    }

    /// Walk the whole grid, recording one ledger row per trial per basin.
    pub fn run_with_progress(
        &mut self,
        progress_cb: Option<&mut dyn FnMut(SweepProgressEvent)>,
    ) -> AppResult<SweepSummary> {
        let grid = self.project.grid.clone();
        let mut progress = Progress {
            cb: progress_cb,
            started: Instant::now(),
            trial_count: grid.trial_count(),
        };
        let mut summary = SweepSummary {
            trial_count: grid.trial_count(),
            ..SweepSummary::default()
        };

        progress.emit(SweepStage::Preparing, None, Some(grid.to_string()));
        for overrun in grid.bound_overruns() {
            tracing::warn!(%overrun, "planned grid exceeds its configured bound");
        }
        let observed = self.load_observed()?;
        let mut ledger = ResultLedger::create(&self.project.ledger_path, &self.ledger_header())?;
        tracing::info!(
            project = %self.project.name,
            trials = grid.trial_count(),
            basins = self.project.basins.len(),
            "starting calibration sweep"
        );

        for trial in grid.trials() {
            if self.should_stop() {
                summary.cancelled = true;
                tracing::info!(next_trial = trial.index(), "sweep cancelled");
                progress.emit(SweepStage::Cancelled, Some(trial.index()), None);
                break;
            }
            let index = trial.index();

            progress.emit(SweepStage::WritingInputs, Some(index), Some(trial.to_string()));
            self.project
                .input_writer
                .write(&trial, &self.project.basins)?;

            let output = match self.run_model(&trial, &mut summary, &mut progress)? {
                Ok(()) => {
                    progress.emit(SweepStage::Extracting, Some(index), None);
                    self.project
                        .extractor
                        .read(&self.project.wetland_output)
                        .map_err(|err| (FailureKind::MissingOutput, err))
                }
                Err(err) => Err((FailureKind::of_model_error(&err), err)),
            };

            let mut trial_failed = false;
            let rows = match output {
                Ok(output) => {
                    progress.emit(SweepStage::Scoring, Some(index), None);
                    self.score_basins(&trial, &output, &observed, &mut summary)?
                }
                Err((kind, err)) => {
                    trial_failed = true;
                    tracing::warn!(trial = index, error = %err, "trial failed");
                    summary.failures.push(TrialFailure {
                        trial: index,
                        basin: None,
                        kind,
                        message: err.to_string(),
                    });
                    self.project
                        .basins
                        .iter()
                        .map(|b| self.row(&trial, RowOutcome::Failed, &b.label))
                        .collect()
                }
            };

            progress.emit(SweepStage::Recording, Some(index), None);
            ledger.append(&rows)?;
            summary.trials_run += 1;
            for row in &rows {
                match row.outcome {
                    RowOutcome::Scored(_) => summary.rows_scored += 1,
                    RowOutcome::Failed => summary.rows_failed += 1,
                }
            }

            if trial_failed && self.project.failure_policy.on_failure == OnFailure::Abort {
                summary.aborted = true;
                tracing::warn!(trial = index, "sweep aborted by failure policy");
                progress.emit(SweepStage::Aborted, Some(index), None);
                break;
            }
        }

        summary.elapsed_wall_s = progress.started.elapsed().as_secs_f64();
        if !summary.cancelled && !summary.aborted {
            progress.emit(SweepStage::Completed, None, None);
        }
        tracing::info!(
            trials_run = summary.trials_run,
            scored = summary.rows_scored,
            failed = summary.rows_failed,
            retries = summary.retries,
            elapsed_s = summary.elapsed_wall_s,
            "sweep finished"
        );
        Ok(summary)
    }
}

/// Load a project and run its sweep against the configured model commands.
pub fn run_sweep(
    project_path: &Path,
    stop_file: Option<PathBuf>,
    progress_cb: Option<&mut dyn FnMut(SweepProgressEvent)>,
) -> AppResult<SweepSummary> {
    let project = project_service::load_and_compile(project_path)?;
    let runner = project.runner();
    let mut controller = SweepController::new(project, runner);
    if let Some(path) = stop_file {
        controller = controller.with_stop_file(path);
    }
    controller.run_with_progress(progress_cb)
}
