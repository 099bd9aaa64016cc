//! Git command wrappers.
//!
//! This module provides a thin wrapper around git CLI commands,
//! handling command execution and error formatting. Every invocation goes
//! through the [`GitRunner`] trait so the sync flow can be exercised against a
//! scripted runner instead of a real repository.

use crate::constants::{EXIT_UNKNOWN, NO_LOCAL_CHANGES};
use anyhow::Context;
use colored::Colorize;
use std::path::{Path, PathBuf};

/// Callback invoked with the arguments of every git command before it runs.
pub type GitLogger = fn(&[&str]);

/// Echoes each git command to stderr.
pub fn verbose_logger(args: &[&str]) {
    eprintln!("    {}", format!("$ git {}", args.join(" ")).dimmed());
}

pub fn no_op_logger(_args: &[&str]) {}

/// Captured result of a single git invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GitOutput {
    /// Exit code, `None` when the process was terminated by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl GitOutput {
    #[must_use]
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Exit code suitable for handing back to the shell.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        self.code.unwrap_or(EXIT_UNKNOWN)
    }
}

/// A git command that ran but exited non-zero.
#[derive(Debug, thiserror::Error)]
#[error("git {command} failed: {stderr}")]
pub struct GitCommandError {
    pub command: String,
    pub code: i32,
    pub stderr: String,
}

/// The external-tool boundary: run `git <args>` and report what happened.
///
/// `run` only fails when git could not be started at all; a non-zero exit is
/// reported through [`GitOutput::code`].
pub trait GitRunner {
    fn run(&self, args: &[&str]) -> anyhow::Result<GitOutput>;

    /// Returns a runner that executes commands from `dir`.
    fn in_dir(&self, dir: &Path) -> Self
    where
        Self: Sized;
}

/// Runs the `git` binary found on `PATH`.
#[derive(Debug, Clone)]
pub struct SystemGit {
    dir: PathBuf,
    logger: GitLogger,
}

impl SystemGit {
    pub fn new(dir: impl Into<PathBuf>, logger: GitLogger) -> Self {
        Self {
            dir: dir.into(),
            logger,
        }
    }
}

impl GitRunner for SystemGit {
    fn run(&self, args: &[&str]) -> anyhow::Result<GitOutput> {
        (self.logger)(args);

        // Never block on an editor: merge/rebase messages are always supplied.
        let output = std::process::Command::new("git")
            .current_dir(&self.dir)
            .env("GIT_EDITOR", "true")
            .args(args)
            .output()
            .context("Failed to spawn git command")?;

        Ok(GitOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    fn in_dir(&self, dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
            logger: self.logger,
        }
    }
}

/// Runs a git command and returns its trimmed stdout, failing on non-zero exit.
pub fn run_git(git: &impl GitRunner, args: &[&str]) -> anyhow::Result<String> {
    run_git_raw(git, args).map(|stdout| stdout.trim().to_string())
}

/// Like [`run_git`], but leaves stdout untouched for column- or NUL-delimited output.
pub fn run_git_raw(git: &impl GitRunner, args: &[&str]) -> anyhow::Result<String> {
    let output = git.run(args)?;

    if output.success() {
        Ok(output.stdout)
    } else {
        Err(GitCommandError {
            command: args.join(" "),
            code: output.exit_code(),
            stderr: output.stderr.trim().to_string(),
        }
        .into())
    }
}

/// Exit code of the failed git command behind `err`, if there was one.
#[must_use]
pub fn failed_exit_code(err: &anyhow::Error) -> Option<i32> {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<GitCommandError>())
        .map(|failure| failure.code)
}

fn validate_name(kind: &str, name: &str) -> anyhow::Result<()> {
    if name.is_empty() || name.contains('\0') || name.contains('\n') || name.starts_with('-') {
        anyhow::bail!("Invalid {} name: {:?}", kind, name);
    }
    Ok(())
}

/// Which side of a conflicted path to take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictSide {
    Ours,
    Theirs,
}

impl ConflictSide {
    fn flag(self) -> &'static str {
        match self {
            ConflictSide::Ours => "--ours",
            ConflictSide::Theirs => "--theirs",
        }
    }

    /// Index stage holding this side of an unmerged path.
    fn stage(self) -> &'static str {
        match self {
            ConflictSide::Ours => "2",
            ConflictSide::Theirs => "3",
        }
    }
}

/// Splits `-z` output into its non-empty records.
fn split_nul(output: &str) -> impl Iterator<Item = &str> {
    output.split('\0').filter(|record| !record.is_empty())
}

pub fn repo_root(git: &impl GitRunner) -> anyhow::Result<PathBuf> {
    run_git(git, &["rev-parse", "--show-toplevel"])
        .map(PathBuf::from)
        .context("Not inside a git repository")
}

pub fn list_remotes(git: &impl GitRunner) -> anyhow::Result<Vec<String>> {
    let output = run_git(git, &["remote"]).context("Failed to list remotes")?;
    Ok(output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect())
}

/// Porcelain status with each line's leading status column intact.
pub fn status_porcelain(git: &impl GitRunner) -> anyhow::Result<String> {
    run_git_raw(git, &["status", "--porcelain"])
        .map(|output| output.trim_end().to_string())
        .context("Failed to check for uncommitted changes")
}

/// Stashes tracked and untracked changes. Returns whether an entry was created.
pub fn stash_push(git: &impl GitRunner, message: &str) -> anyhow::Result<bool> {
    let output = run_git(
        git,
        &["stash", "push", "--include-untracked", "-m", message],
    )
    .context("Failed to stash changes")?;
    Ok(!output.contains(NO_LOCAL_CHANGES))
}

pub fn stash_pop(git: &impl GitRunner) -> anyhow::Result<()> {
    run_git(git, &["stash", "pop"]).context("Failed to pop stash")?;
    Ok(())
}

pub fn fetch_all_prune(git: &impl GitRunner) -> anyhow::Result<()> {
    run_git(git, &["fetch", "--all", "--prune"]).context("Failed to fetch from remotes")?;
    Ok(())
}

pub fn create_branch(git: &impl GitRunner, name: &str, start_point: &str) -> anyhow::Result<()> {
    validate_name("branch", name)?;
    validate_name("branch", start_point)?;
    run_git(git, &["branch", name, start_point])
        .with_context(|| format!("Failed to create branch '{}'", name))?;
    Ok(())
}

pub fn checkout(git: &impl GitRunner, branch: &str) -> anyhow::Result<()> {
    validate_name("branch", branch)?;
    run_git(git, &["checkout", branch])
        .with_context(|| format!("Failed to checkout branch '{}'", branch))?;
    Ok(())
}

/// Merges `upstream` into the current branch. The exit status is returned, not raised.
pub fn merge(git: &impl GitRunner, upstream: &str) -> anyhow::Result<GitOutput> {
    validate_name("branch", upstream)?;
    git.run(&["merge", "--no-edit", upstream])
        .with_context(|| format!("Failed to merge '{}'", upstream))
}

/// Rebases the current branch onto `upstream`. The exit status is returned, not raised.
pub fn rebase(git: &impl GitRunner, upstream: &str) -> anyhow::Result<GitOutput> {
    validate_name("branch", upstream)?;
    git.run(&["rebase", upstream])
        .with_context(|| format!("Failed to rebase onto '{}'", upstream))
}

/// Paths git currently reports as unmerged, relative to the repository root.
///
/// Uses `-z` so non-ASCII paths come back verbatim instead of C-quoted.
pub fn unmerged_files(git: &impl GitRunner) -> anyhow::Result<Vec<String>> {
    let output = run_git_raw(git, &["diff", "-z", "--name-only", "--diff-filter=U"])
        .context("Failed to list conflicted files")?;
    Ok(split_nul(&output).map(String::from).collect())
}

/// Whether the index holds `side` for the unmerged `path`.
/// A missing stage means that side deleted the file.
pub fn has_conflict_side(
    git: &impl GitRunner,
    side: ConflictSide,
    path: &str,
) -> anyhow::Result<bool> {
    validate_name("path", path)?;
    let output = run_git_raw(git, &["ls-files", "-u", "-z", "--", path])
        .with_context(|| format!("Failed to read index stages of '{}'", path))?;
    // Each record is "<mode> <object> <stage>\t<path>".
    Ok(split_nul(&output).any(|record| {
        record
            .split('\t')
            .next()
            .and_then(|info| info.split_whitespace().nth(2))
            == Some(side.stage())
    }))
}

pub fn checkout_side(git: &impl GitRunner, side: ConflictSide, path: &str) -> anyhow::Result<()> {
    validate_name("path", path)?;
    run_git(git, &["checkout", side.flag(), "--", path])
        .with_context(|| format!("Failed to check out {} version of '{}'", side.flag(), path))?;
    Ok(())
}

pub fn add(git: &impl GitRunner, path: &str) -> anyhow::Result<()> {
    validate_name("path", path)?;
    run_git(git, &["add", "--", path]).with_context(|| format!("Failed to stage '{}'", path))?;
    Ok(())
}

/// Resolves an unmerged path by deleting it from the index and working tree.
pub fn remove(git: &impl GitRunner, path: &str) -> anyhow::Result<()> {
    validate_name("path", path)?;
    run_git(git, &["rm", "--quiet", "--", path])
        .with_context(|| format!("Failed to remove '{}'", path))?;
    Ok(())
}

pub fn commit(git: &impl GitRunner, message: &str) -> anyhow::Result<()> {
    run_git(git, &["commit", "-m", message]).context("Failed to commit")?;
    Ok(())
}

pub fn rebase_continue(git: &impl GitRunner) -> anyhow::Result<()> {
    run_git(git, &["rebase", "--continue"]).context("Failed to continue rebase")?;
    Ok(())
}

pub fn push(git: &impl GitRunner, remote: &str, branch: &str) -> anyhow::Result<()> {
    validate_name("remote", remote)?;
    validate_name("branch", branch)?;
    run_git(git, &["push", remote, branch])
        .with_context(|| format!("Failed to push '{}' to '{}'", branch, remote))?;
    Ok(())
}
