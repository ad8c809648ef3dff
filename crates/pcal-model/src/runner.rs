//! Execution of the external model.

use std::fmt;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use pcal_grid::Trial;

use crate::{ModelError, ModelResult};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Produces the wetland output file for the parameters already written to
/// the input files.
pub trait ModelRunner {
    fn run(&mut self, trial: &Trial) -> ModelResult<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStep {
    Cleanup,
    Execute,
}

impl fmt::Display for RunStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStep::Cleanup => f.write_str("cleanup"),
            RunStep::Execute => f.write_str("execute"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommandSpec {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub working_dir: Option<PathBuf>,
}

impl CommandSpec {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    fn display_program(&self) -> String {
        self.program.display().to_string()
    }
}

/// Start the step in its own process group so a timeout can take down
/// anything a wrapper script launched.
#[cfg(unix)]
fn own_process_group(command: &mut Command) {
    use std::os::unix::process::CommandExt;
    command.process_group(0);
}

#[cfg(not(unix))]
fn own_process_group(_command: &mut Command) {}

#[cfg(unix)]
fn kill_tree(child: &mut Child) {
    use nix::sys::signal::{Signal, killpg};
    use nix::unistd::Pid;

    if let Ok(pid) = i32::try_from(child.id()) {
        if let Err(errno) = killpg(Pid::from_raw(pid), Signal::SIGKILL) {
            tracing::debug!(pid, %errno, "could not signal model process group");
        }
    }
    let _ = child.kill();
    let _ = child.wait();
}

#[cfg(windows)]
fn kill_tree(child: &mut Child) {
    let pid = child.id().to_string();
    let status = Command::new("taskkill")
        .args(["/T", "/F", "/PID", pid.as_str()])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();
    if let Err(e) = status {
        tracing::debug!(%pid, error = %e, "taskkill failed");
    }
    let _ = child.kill();
    let _ = child.wait();
}

#[cfg(not(any(unix, windows)))]
fn kill_tree(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

/// Runs the optional cleanup command, then the model itself. Each step is
/// bounded by the same timeout.
#[derive(Debug, Clone)]
pub struct ExternalModelRunner {
    cleanup: Option<CommandSpec>,
    execute: CommandSpec,
    timeout: Duration,
}

impl ExternalModelRunner {
    pub fn new(cleanup: Option<CommandSpec>, execute: CommandSpec, timeout: Duration) -> Self {
        Self {
            cleanup,
            execute,
            timeout,
        }
    }

    fn run_step(&self, step: RunStep, spec: &CommandSpec) -> ModelResult<()> {
        let program = spec.display_program();
        let mut command = Command::new(&spec.program);
        command.args(&spec.args).stdin(Stdio::null());
        if let Some(dir) = &spec.working_dir {
            command.current_dir(dir);
        }
        own_process_group(&mut command);

        tracing::debug!(%step, %program, "starting model command");
        let started = Instant::now();
        let mut child = command.spawn().map_err(|source| ModelError::Spawn {
            step,
            program: program.clone(),
            source,
        })?;

        loop {
            match child.try_wait() {
                Ok(Some(status)) if status.success() => {
                    tracing::debug!(
                        %step,
                        elapsed_s = started.elapsed().as_secs_f64(),
                        "model command finished"
                    );
                    return Ok(());
                }
                Ok(Some(status)) => {
                    return Err(ModelError::CommandFailed {
                        step,
                        program,
                        status: status.to_string(),
                    });
                }
                Ok(None) if started.elapsed() >= self.timeout => {
                    kill_tree(&mut child);
                    tracing::warn!(%step, %program, "model command timed out and was killed");
                    return Err(ModelError::Timeout {
                        step,
                        program,
                        timeout_s: self.timeout.as_secs_f64(),
                    });
                }
                Ok(None) => thread::sleep(POLL_INTERVAL),
                Err(e) => {
                    kill_tree(&mut child);
                    return Err(ModelError::io(&spec.program, e));
                }
            }
        }
    }
}

impl ModelRunner for ExternalModelRunner {
    fn run(&mut self, trial: &Trial) -> ModelResult<()> {
        if let Some(cleanup) = &self.cleanup {
            self.run_step(RunStep::Cleanup, cleanup)?;
        }
        self.run_step(RunStep::Execute, &self.execute)?;
        tracing::debug!(trial = trial.index(), "model run complete");
        Ok(())
    }
}
