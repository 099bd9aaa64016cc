//! Spinner, colored step output, and the final report.

use crate::config::RunConfig;
use crate::constants::PROGRESS_TICK_MS;
use crate::sync::{RunOutcome, StashState, SyncCallbacks, SyncReport, SyncStep};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;

/// No-op callbacks for when progress tracking is not needed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoOpCallbacks;

impl SyncCallbacks for NoOpCallbacks {
    fn on_step(&self, _step: &SyncStep) {}
}

/// Spinner shown while the sync runs in normal verbosity.
/// Uses `Option` to avoid allocation when progress is hidden (quiet/verbose modes).
pub struct SyncProgress {
    spinner: Option<ProgressBar>,
}

impl SyncProgress {
    pub fn update(&self, step: &SyncStep) {
        if let Some(spinner) = &self.spinner {
            spinner.set_message(format_step_message(step));
        }
    }

    /// Runs `f` with the spinner hidden so plain output does not get overdrawn.
    pub fn suspend<F: FnOnce()>(&self, f: F) {
        match &self.spinner {
            Some(spinner) => spinner.suspend(f),
            None => f(),
        }
    }

    pub fn finish(&self) {
        if let Some(spinner) = &self.spinner {
            spinner.finish_and_clear();
        }
    }
}

/// Creates the spinner for a sync run.
/// Returns a hidden tracker in quiet or verbose mode.
#[must_use]
pub fn create_sync_progress(config: &RunConfig) -> SyncProgress {
    let spinner = if config.is_quiet() || config.is_verbose() {
        None
    } else {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
                .template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.enable_steady_tick(Duration::from_millis(PROGRESS_TICK_MS));
        Some(spinner)
    };

    SyncProgress { spinner }
}

/// Terminal callbacks: spinner in normal mode, one line per step in verbose mode.
pub struct ConsoleCallbacks {
    progress: SyncProgress,
    config: RunConfig,
}

impl ConsoleCallbacks {
    pub fn new(progress: SyncProgress, config: RunConfig) -> Self {
        Self { progress, config }
    }

    /// Clears the spinner before the report is printed.
    pub fn finish(&self) {
        self.progress.finish();
    }
}

impl SyncCallbacks for ConsoleCallbacks {
    fn on_step(&self, step: &SyncStep) {
        self.progress.update(step);
        print_step(&self.config, step);
    }

    fn on_warning(&self, message: &str) {
        self.progress.suspend(|| print_warning(message));
    }
}

/// Prints a step progress message in verbose mode.
pub fn print_step(config: &RunConfig, step: &SyncStep) {
    if !config.is_verbose() {
        return;
    }
    eprintln!("  {}...", step.to_string().dimmed());
}

/// Warnings are shown in every verbosity; they describe skipped best-effort work.
pub fn print_warning(message: &str) {
    eprintln!("{} {}", "warning:".yellow().bold(), message);
}

pub fn print_working_dir(path: &Path, config: &RunConfig) {
    if config.is_quiet() {
        return;
    }
    println!(
        "{} {}",
        "Working in:".cyan(),
        path.display().to_string().white().bold()
    );
}

pub fn print_plan(config: &RunConfig) {
    if config.is_quiet() {
        return;
    }
    println!(
        "{}",
        format!(
            "Syncing {} from {} ({})",
            config.branch,
            config.upstream_ref(),
            config.strategy
        )
        .dimmed()
    );
}

pub fn print_report(report: &SyncReport, config: &RunConfig) {
    if config.is_quiet() {
        print_quiet_report(report);
    } else {
        print_normal_report(report);
    }
}

fn print_quiet_report(report: &SyncReport) {
    if report.outcome.is_success() {
        println!("{}", report.outcome.summary());
    } else {
        eprintln!("error: {}", report.outcome.summary());
        if let RunOutcome::ConflictsRemain { files } = &report.outcome {
            print_conflicts(files);
        }
    }
}

fn print_normal_report(report: &SyncReport) {
    println!();
    match &report.outcome {
        RunOutcome::Success => {
            println!("{} {}", "✓".green(), report.outcome.summary().green().bold());
        }
        RunOutcome::SuccessWithAutoResolve { resolved } => {
            println!("{} {}", "✓".green(), report.outcome.summary().green().bold());
            for file in resolved {
                println!("  {} {}", "took upstream".dimmed(), file.white());
            }
        }
        RunOutcome::ConflictsRemain { files } => {
            eprintln!("{} {}", "✗".red(), report.outcome.summary().red().bold());
            print_conflicts(files);
        }
        RunOutcome::PreconditionFailed { .. } | RunOutcome::UnknownFailure { .. } => {
            eprintln!("{} {}", "✗".red(), report.outcome.summary().red());
        }
    }

    if let Some(backup) = &report.backup {
        println!("  {} {}", "backup:".dimmed(), backup.cyan());
    }
    if report.stash == StashState::Stashed {
        println!(
            "  {} {}",
            "stash:".dimmed(),
            "local changes are still stashed, run `git stash pop` when ready".yellow()
        );
    }
    println!(
        "  {} {}",
        "took:".dimmed(),
        format_duration(report.duration).dimmed()
    );
}

fn print_conflicts(files: &[String]) {
    for file in files {
        eprintln!("  {} {}", "C".red().bold(), file);
    }
    eprintln!();
    eprintln!("Resolve the conflicts manually:");
    eprintln!("  1. edit the files listed above");
    eprintln!("  2. git add <file>...");
    eprintln!("  3. git commit (merge) or git rebase --continue (rebase)");
    eprintln!("Or abandon the update with git merge --abort / git rebase --abort.");
}

fn format_duration(duration: Duration) -> String {
    format!("{:.2}s", duration.as_secs_f32())
}

fn format_step_message(step: &SyncStep) -> String {
    match step {
        SyncStep::Completed => step.to_string(),
        _ => format!("{}...", step),
    }
}
