//! Run configuration derived from CLI arguments.

use crate::constants::{DEFAULT_BRANCH, DEFAULT_REMOTE};
use crate::git::{self, GitLogger};
use std::fmt;

/// How the local branch is brought up to date with its upstream counterpart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Strategy {
    #[default]
    Merge,
    Rebase,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Merge => f.write_str("merge"),
            Strategy::Rebase => f.write_str("rebase"),
        }
    }
}

/// Immutable settings for a single sync run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub remote: String,
    pub branch: String,
    pub strategy: Strategy,
    /// Take the upstream side of every conflicted file.
    pub auto_theirs: bool,
    pub no_backup: bool,
    /// Push the updated branch to `origin` after a successful run.
    pub push: bool,
    /// Stash uncommitted changes instead of refusing to run.
    pub stash_if_dirty: bool,
    /// Controls the verbosity level of CLI output.
    pub verbosity: Verbosity,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            remote: DEFAULT_REMOTE.to_string(),
            branch: DEFAULT_BRANCH.to_string(),
            strategy: Strategy::default(),
            auto_theirs: false,
            no_backup: false,
            push: false,
            stash_if_dirty: false,
            verbosity: Verbosity::default(),
        }
    }
}

impl RunConfig {
    /// The remote-tracking ref the branch is updated from, e.g. `upstream/main`.
    #[must_use]
    pub fn upstream_ref(&self) -> String {
        format!("{}/{}", self.remote, self.branch)
    }

    #[must_use]
    pub fn is_quiet(&self) -> bool {
        self.verbosity == Verbosity::Quiet
    }

    #[must_use]
    pub fn is_verbose(&self) -> bool {
        self.verbosity == Verbosity::Verbose
    }

    /// Returns the appropriate git logger based on verbosity settings.
    ///
    /// Config only picks which logger function to use; the logging itself
    /// lives as callbacks in the git module.
    #[must_use]
    pub fn git_logger(&self) -> GitLogger {
        if self.is_verbose() {
            git::verbose_logger
        } else {
            git::no_op_logger
        }
    }
}

/// Verbosity level for CLI output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    Quiet,
    #[default]
    Normal,
    Verbose,
}
