use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;
use pcal_app::{
    AppError, AppResult, SweepProgressEvent, SweepStage, best_trials, load_and_compile, plan,
    rescore, run_sweep,
};
use pcal_results::{RowOutcome, read_ledger};

#[derive(Parser)]
#[command(name = "pcal-cli")]
#[command(about = "potholecal - curve number and infiltration calibration for AnnAGNPS wetlands", long_about = None)]
struct Cli {
    /// Log debug detail (skipped rows, commands, per-basin scores)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate project file syntax and structure
    Validate {
        /// Path to the project YAML file
        project_path: PathBuf,
    },
    /// List the trial grid without running the model
    Plan {
        /// Path to the project YAML file
        project_path: PathBuf,
        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
    },
    /// Run the calibration sweep
    Run {
        /// Path to the project YAML file
        project_path: PathBuf,
        /// Stop before the next trial once this file exists
        #[arg(long)]
        stop_file: Option<PathBuf>,
    },
    /// Score the current model output again without running the model
    Rescore {
        /// Path to the project YAML file
        project_path: PathBuf,
        /// Trial the output belongs to
        trial_index: u32,
    },
    /// Show the best scored trials of the ledger
    Best {
        /// Path to the project YAML file
        project_path: PathBuf,
        /// Rows per basin
        #[arg(long, default_value_t = 5)]
        top: usize,
    },
}

fn main() -> AppResult<ExitCode> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Commands::Validate { project_path } => cmd_validate(&project_path),
        Commands::Plan { project_path, json } => cmd_plan(&project_path, json),
        Commands::Run {
            project_path,
            stop_file,
        } => cmd_run(&project_path, stop_file),
        Commands::Rescore {
            project_path,
            trial_index,
        } => cmd_rescore(&project_path, trial_index),
        Commands::Best { project_path, top } => cmd_best(&project_path, top),
    }
}

fn cmd_validate(project_path: &Path) -> AppResult<ExitCode> {
    println!("Validating project: {}", project_path.display());
    let project = load_and_compile(project_path)?;
    println!("✓ Project is valid");
    println!("  Name: {}", project.name);
    println!("  Basins: {}", project.basins.len());
    for basin in &project.basins {
        let windows: Vec<String> = basin.windows.iter().map(ToString::to_string).collect();
        println!("    {} (id {}): {}", basin.label, basin.id, windows.join(", "));
    }
    println!("  Trials: {}", project.grid.trial_count());
    Ok(ExitCode::SUCCESS)
}

fn cmd_plan(project_path: &Path, json: bool) -> AppResult<ExitCode> {
    let project = load_and_compile(project_path)?;
    let plan = plan(&project);

    if json {
        let text = serde_json::to_string_pretty(&plan)
            .map_err(|e| AppError::InvalidInput(format!("Failed to serialize plan: {e}")))?;
        println!("{text}");
        return Ok(ExitCode::SUCCESS);
    }

    println!("{}", project.grid);
    println!(
        "  {} trials ({} CN steps x {} infiltration steps), basins: {}",
        plan.trial_count,
        plan.outer_steps,
        plan.inner_steps,
        plan.basins.join(", ")
    );
    for overrun in &plan.overruns {
        println!("  ! {overrun}");
    }
    println!("Trial, CN_A, CN_B, CN_C, CN_D, Infiltration");
    for t in &plan.trials {
        println!(
            "{}, {}, {}, {}, {}, {}",
            t.index, t.cn_a, t.cn_b, t.cn_c, t.cn_d, t.infiltration_mm_day
        );
    }
    Ok(ExitCode::SUCCESS)
}

fn cmd_run(project_path: &Path, stop_file: Option<PathBuf>) -> AppResult<ExitCode> {
    println!("Running calibration sweep: {}", project_path.display());

    let mut last_emit = Instant::now();
    let mut last_stage = None;
    let summary = run_sweep(
        project_path,
        stop_file,
        Some(&mut |event: SweepProgressEvent| {
            let emit_now = last_stage != Some(event.stage) || last_emit.elapsed().as_millis() >= 100;
            if emit_now {
                render_cli_progress(&event);
                last_stage = Some(event.stage);
                last_emit = Instant::now();
            }
        }),
    )?;
    clear_progress_line();

    if summary.cancelled {
        println!("■ Sweep cancelled after {} of {} trials", summary.trials_run, summary.trial_count);
    } else if summary.aborted {
        println!("✗ Sweep aborted after {} of {} trials", summary.trials_run, summary.trial_count);
    } else {
        println!("✓ Sweep completed: {} trials", summary.trials_run);
    }
    println!("  Scored rows: {}", summary.rows_scored);
    println!("  Failed rows: {}", summary.rows_failed);
    println!("  Retries: {}", summary.retries);
    println!("  Elapsed: {:.1} s", summary.elapsed_wall_s);
    for failure in &summary.failures {
        let basin = failure.basin.as_deref().unwrap_or("all basins");
        println!(
            "  trial {} ({basin}): {:?}: {}",
            failure.trial, failure.kind, failure.message
        );
    }

    Ok(if summary.aborted {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn cmd_rescore(project_path: &Path, trial_index: u32) -> AppResult<ExitCode> {
    let project = load_and_compile(project_path)?;
    let rescored = rescore(&project, trial_index)?;
    let trial = &rescored.trial;
    println!(
        "Trial {}: CN {}  infiltration {} mm/day",
        trial.index(),
        trial.curve_numbers,
        trial.infiltration_mm_day
    );

    let mut all_scored = true;
    for r in &rescored.basins {
        match &r.result {
            Ok(s) => println!(
                "{}: NSE={:.4} PBIAS={:.2} RMSE={:.3} RSR={:.4} R2={:.4} ({} values)",
                r.basin, s.nse, s.pbias, s.rmse, s.rsr, s.r2, r.simulated_len
            ),
            Err(e) => {
                all_scored = false;
                println!("{}: ✗ {}", r.basin, e);
            }
        }
    }
    Ok(if all_scored {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn cmd_best(project_path: &Path, top: usize) -> AppResult<ExitCode> {
    let project = load_and_compile(project_path)?;
    let ledger = read_ledger(&project.ledger_path)?;
    let rankings = best_trials(&ledger, top);

    if rankings.is_empty() {
        println!("No scored trials in {}", project.ledger_path.display());
        return Ok(ExitCode::SUCCESS);
    }
    println!(
        "{} scored, {} failed rows in {}",
        ledger.scored().count(),
        ledger.failed_count(),
        project.ledger_path.display()
    );
    for ranking in rankings {
        println!("{}:", ranking.basin.as_deref().unwrap_or(&project.site_name));
        for row in &ranking.rows {
            if let RowOutcome::Scored(s) = row.outcome {
                println!(
                    "  trial {:>4}  CN {}  inf {:>6} mm/day  NSE={:.4} PBIAS={:.2} RSR={:.4} R2={:.4}",
                    row.trial, row.curve_numbers, row.infiltration_mm_day, s.nse, s.pbias, s.rsr, s.r2
                );
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn clear_progress_line() {
    print!("\r{}\r", " ".repeat(120));
    let _ = io::stdout().flush();
}

fn render_cli_progress(event: &SweepProgressEvent) {
    let width = 28usize;
    let fraction = event.fraction_complete();
    let filled = ((fraction * width as f64).round() as usize).min(width);
    let bar = format!(
        "{}{}",
        "#".repeat(filled),
        "-".repeat(width.saturating_sub(filled))
    );
    let mut line = format!(
        "\r[{}] {:>6.2}%  phase={}  elapsed={:.1}s",
        bar,
        fraction * 100.0,
        event.stage.label(),
        event.elapsed_wall_s
    );
    if let Some(trial) = event.trial {
        line.push_str(&format!("  trial={}/{}", trial, event.trial_count));
    }
    if let SweepStage::RunningModel { attempt } = event.stage {
        if attempt > 0 {
            line.push_str(&format!("  retry={attempt}"));
        }
    }
    print!("{line}");
    let _ = io::stdout().flush();
}
