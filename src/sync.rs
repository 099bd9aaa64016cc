//! The sync flow: validate, fetch, back up, update, and resolve what can be resolved.

use crate::config::{RunConfig, Strategy};
use crate::conflict::{self, ConflictSet};
use crate::constants::{
    BACKUP_PREFIX, BACKUP_TIMESTAMP_FORMAT, EXIT_CONFLICTS, EXIT_PRECONDITION, EXIT_SUCCESS,
    EXIT_UNKNOWN, PUSH_REMOTE, STASH_MESSAGE,
};
use crate::git::{self, GitRunner};
use chrono::{DateTime, TimeZone};
use std::fmt;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncStep {
    LocatingRepository,
    CheckingRemote { remote: String },
    CheckingChanges,
    Stashing,
    Fetching,
    CreatingBackup { name: String },
    CheckingOut { branch: String },
    Updating { strategy: Strategy, upstream: String },
    CollectingConflicts,
    ResolvingConflicts { count: usize },
    Concluding,
    Pushing { remote: String, branch: String },
    PoppingStash,
    Completed,
}

impl fmt::Display for SyncStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncStep::LocatingRepository => write!(f, "Locating repository root"),
            SyncStep::CheckingRemote { remote } => write!(f, "Checking remote '{}'", remote),
            SyncStep::CheckingChanges => write!(f, "Checking for uncommitted changes"),
            SyncStep::Stashing => write!(f, "Stashing uncommitted changes"),
            SyncStep::Fetching => write!(f, "Fetching all remotes"),
            SyncStep::CreatingBackup { name } => write!(f, "Creating backup branch {}", name),
            SyncStep::CheckingOut { branch } => write!(f, "Checking out {}", branch),
            SyncStep::Updating { strategy, upstream } => match strategy {
                Strategy::Merge => write!(f, "Merging {}", upstream),
                Strategy::Rebase => write!(f, "Rebasing onto {}", upstream),
            },
            SyncStep::CollectingConflicts => write!(f, "Collecting conflicted files"),
            SyncStep::ResolvingConflicts { count } => {
                write!(f, "Resolving {} conflicted file(s) from upstream", count)
            }
            SyncStep::Concluding => write!(f, "Committing resolution"),
            SyncStep::Pushing { remote, branch } => write!(f, "Pushing {} to {}", branch, remote),
            SyncStep::PoppingStash => write!(f, "Restoring stashed changes"),
            SyncStep::Completed => write!(f, "Completed"),
        }
    }
}

/// How a run ended. Each variant maps to one process exit code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Success,
    SuccessWithAutoResolve { resolved: Vec<String> },
    ConflictsRemain { files: Vec<String> },
    PreconditionFailed { reason: String },
    UnknownFailure { code: i32, detail: String },
}

impl RunOutcome {
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            RunOutcome::Success | RunOutcome::SuccessWithAutoResolve { .. } => EXIT_SUCCESS,
            RunOutcome::PreconditionFailed { .. } => EXIT_PRECONDITION,
            RunOutcome::ConflictsRemain { .. } => EXIT_CONFLICTS,
            RunOutcome::UnknownFailure { code, .. } => *code,
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            RunOutcome::Success | RunOutcome::SuccessWithAutoResolve { .. }
        )
    }

    #[must_use]
    pub fn summary(&self) -> String {
        match self {
            RunOutcome::Success => "Sync completed".to_string(),
            RunOutcome::SuccessWithAutoResolve { resolved } => format!(
                "Sync completed, {} conflicted file(s) resolved from upstream",
                resolved.len()
            ),
            RunOutcome::ConflictsRemain { files } => {
                format!("{} file(s) need manual conflict resolution", files.len())
            }
            RunOutcome::PreconditionFailed { reason } => reason.clone(),
            RunOutcome::UnknownFailure { code, detail } => {
                format!("{} (exit code {})", detail, code)
            }
        }
    }
}

/// What happened to local changes stashed by `--stash-if-dirty`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StashState {
    #[default]
    NotCreated,
    /// Still sitting in the stash list.
    Stashed,
    Restored,
}

#[derive(Debug)]
pub struct SyncReport {
    pub outcome: RunOutcome,
    /// Name of the backup branch, if one was created.
    pub backup: Option<String>,
    pub stash: StashState,
    pub duration: Duration,
}

/// Receives progress notifications from [`sync`].
pub trait SyncCallbacks {
    fn on_step(&self, step: &SyncStep);

    /// A best-effort step failed and the run carries on.
    fn on_warning(&self, _message: &str) {}
}

/// Backup branch name for `branch` at `now`, e.g. `backup/main-20240131-235959`.
pub fn backup_branch_name<Tz>(branch: &str, now: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    format!(
        "{}{}-{}",
        BACKUP_PREFIX,
        branch,
        now.format(BACKUP_TIMESTAMP_FORMAT)
    )
}

/// Runs one sync of `config.branch` from `config.remote`.
///
/// Never panics on git failures; every way the run can end is described by
/// the returned report's [`RunOutcome`].
pub fn sync<G: GitRunner>(
    git: &G,
    config: &RunConfig,
    callbacks: &dyn SyncCallbacks,
) -> SyncReport {
    let start = Instant::now();
    let mut run = SyncRun {
        config,
        callbacks,
        backup: None,
        stash: StashState::NotCreated,
    };

    let outcome = match run.execute(git) {
        Ok(outcome) | Err(outcome) => outcome,
    };

    SyncReport {
        outcome,
        backup: run.backup,
        stash: run.stash,
        duration: start.elapsed(),
    }
}

/// Turns an unexpected git failure into the outcome that ends the run.
fn at_step<T>(step: &SyncStep, result: anyhow::Result<T>) -> Result<T, RunOutcome> {
    result.map_err(|e| RunOutcome::UnknownFailure {
        code: git::failed_exit_code(&e).unwrap_or(EXIT_UNKNOWN),
        detail: format!("{} failed: {:#}", step, e),
    })
}

struct SyncRun<'a> {
    config: &'a RunConfig,
    callbacks: &'a dyn SyncCallbacks,
    backup: Option<String>,
    stash: StashState,
}

impl SyncRun<'_> {
    fn step(&self, step: SyncStep) -> SyncStep {
        self.callbacks.on_step(&step);
        step
    }

    /// `Err` aborts the run early; both sides carry the final outcome.
    fn execute<G: GitRunner>(&mut self, git: &G) -> Result<RunOutcome, RunOutcome> {
        let config = self.config;

        self.step(SyncStep::LocatingRepository);
        let root = git::repo_root(git).map_err(|_| RunOutcome::PreconditionFailed {
            reason: "Not inside a git repository".to_string(),
        })?;
        let git = &git.in_dir(&root);

        let step = self.step(SyncStep::CheckingRemote {
            remote: config.remote.clone(),
        });
        let remotes = at_step(&step, git::list_remotes(git))?;
        if !remotes.contains(&config.remote) {
            let available = if remotes.is_empty() {
                "(none)".to_string()
            } else {
                remotes.join(", ")
            };
            return Err(RunOutcome::PreconditionFailed {
                reason: format!(
                    "Remote '{}' not found. Available remotes: {}",
                    config.remote, available
                ),
            });
        }

        let step = self.step(SyncStep::CheckingChanges);
        let status = at_step(&step, git::status_porcelain(git))?;
        if !status.is_empty() {
            if !config.stash_if_dirty {
                return Err(RunOutcome::PreconditionFailed {
                    reason: format!(
                        "Working tree has uncommitted changes (use --stash-if-dirty):\n{}",
                        status
                    ),
                });
            }
            let step = self.step(SyncStep::Stashing);
            if at_step(&step, git::stash_push(git, STASH_MESSAGE))? {
                self.stash = StashState::Stashed;
            }
        }

        let step = self.step(SyncStep::Fetching);
        at_step(&step, git::fetch_all_prune(git))?;

        if !config.no_backup {
            let name = backup_branch_name(&config.branch, &chrono::Local::now());
            self.step(SyncStep::CreatingBackup { name: name.clone() });
            match git::create_branch(git, &name, &config.branch) {
                Ok(()) => self.backup = Some(name),
                Err(e) => self
                    .callbacks
                    .on_warning(&format!("Could not create backup branch: {:#}", e)),
            }
        }

        let step = self.step(SyncStep::CheckingOut {
            branch: config.branch.clone(),
        });
        at_step(&step, git::checkout(git, &config.branch))?;

        let upstream = config.upstream_ref();
        let step = self.step(SyncStep::Updating {
            strategy: config.strategy,
            upstream: upstream.clone(),
        });
        let update = match config.strategy {
            Strategy::Merge => git::merge(git, &upstream),
            Strategy::Rebase => git::rebase(git, &upstream),
        };
        let update = at_step(&step, update)?;

        if update.success() {
            return self.finish(git, RunOutcome::Success);
        }
        self.resolve_conflicts(git, update.exit_code())
    }

    /// The conflict cascade after a failed merge or rebase.
    fn resolve_conflicts<G: GitRunner>(
        &mut self,
        git: &G,
        update_code: i32,
    ) -> Result<RunOutcome, RunOutcome> {
        let config = self.config;
        let upstream = config.upstream_ref();

        let step = self.step(SyncStep::CollectingConflicts);
        let conflicts = at_step(&step, ConflictSet::collect(git))?;
        if conflicts.is_empty() {
            return Err(RunOutcome::UnknownFailure {
                code: update_code,
                detail: format!(
                    "{} with {} failed without reporting conflicted files",
                    config.strategy, upstream
                ),
            });
        }

        let (candidates, message) = if config.auto_theirs {
            (
                conflicts.files().to_vec(),
                format!("Auto-resolve conflicts by accepting {}", upstream),
            )
        } else {
            (
                conflicts.lockfiles(),
                format!("Auto-resolve lockfile conflicts from {}", upstream),
            )
        };
        if candidates.is_empty() {
            return Ok(RunOutcome::ConflictsRemain {
                files: conflicts.into_files(),
            });
        }

        self.step(SyncStep::ResolvingConflicts {
            count: candidates.len(),
        });
        let resolution = conflict::accept_upstream(git, config.strategy, &candidates);
        for (file, reason) in &resolution.failed {
            self.callbacks
                .on_warning(&format!("Could not take upstream version of {}: {}", file, reason));
        }

        let remaining = at_step(&step, ConflictSet::collect(git))?;
        if !remaining.is_empty() {
            return Ok(RunOutcome::ConflictsRemain {
                files: remaining.into_files(),
            });
        }

        let step = self.step(SyncStep::Concluding);
        let concluded = match config.strategy {
            Strategy::Merge => git::commit(git, &message),
            Strategy::Rebase => git::rebase_continue(git),
        };
        if let Err(e) = concluded {
            // A rebase can stop again on a later commit.
            let after = at_step(&step, ConflictSet::collect(git))?;
            if !after.is_empty() {
                return Ok(RunOutcome::ConflictsRemain {
                    files: after.into_files(),
                });
            }
            return at_step(&step, Err(e));
        }

        self.finish(
            git,
            RunOutcome::SuccessWithAutoResolve {
                resolved: resolution.resolved,
            },
        )
    }

    /// Push and restore the stash after the branch is up to date.
    fn finish<G: GitRunner>(
        &mut self,
        git: &G,
        outcome: RunOutcome,
    ) -> Result<RunOutcome, RunOutcome> {
        let config = self.config;

        if config.push {
            let step = self.step(SyncStep::Pushing {
                remote: PUSH_REMOTE.to_string(),
                branch: config.branch.clone(),
            });
            at_step(&step, git::push(git, PUSH_REMOTE, &config.branch))?;
        }

        if self.stash == StashState::Stashed {
            self.step(SyncStep::PoppingStash);
            match git::stash_pop(git) {
                Ok(()) => self.stash = StashState::Restored,
                Err(e) => self
                    .callbacks
                    .on_warning(&format!("Could not restore stashed changes: {:#}", e)),
            }
        }

        self.step(SyncStep::Completed);
        Ok(outcome)
    }
}
