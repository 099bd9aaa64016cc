//! Command-line argument definitions.

use crate::config::{RunConfig, Strategy, Verbosity};
use crate::constants::{DEFAULT_BRANCH, DEFAULT_REMOTE};
use clap::Parser;

const EXIT_CODES_HELP: &str = "\
Exit codes:
  0  synced (conflicts, if any, were resolved automatically)
  1  not a git repository, remote missing, or dirty working tree
  2  invalid arguments, or conflicts left for manual resolution
  *  exit code of git itself when the failure could not be classified";

/// Fetch an upstream remote and bring a local branch up to date with it.
#[derive(Debug, Parser)]
#[command(name = "git-upstream-sync", version, after_help = EXIT_CODES_HELP)]
pub struct Cli {
    /// Remote to sync from
    #[arg(short, long, value_name = "NAME", default_value = DEFAULT_REMOTE)]
    pub remote: String,

    /// Branch to update
    #[arg(short, long, value_name = "NAME", default_value = DEFAULT_BRANCH)]
    pub branch: String,

    /// Update strategy
    #[arg(short, long, value_enum, default_value_t = Strategy::Merge)]
    pub strategy: Strategy,

    /// Accept the upstream version of every conflicted file
    #[arg(long)]
    pub auto_theirs: bool,

    /// Skip creating a backup branch before updating
    #[arg(long)]
    pub no_backup: bool,

    /// Push the branch to origin after a successful sync
    #[arg(long)]
    pub push: bool,

    /// Stash uncommitted changes before syncing and restore them afterwards
    #[arg(long)]
    pub stash_if_dirty: bool,

    /// Show every git command and step
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only print the final result and errors
    #[arg(short, long)]
    pub quiet: bool,
}

impl Cli {
    #[must_use]
    pub fn into_config(self) -> RunConfig {
        let verbosity = if self.quiet {
            Verbosity::Quiet
        } else if self.verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Normal
        };

        RunConfig {
            remote: self.remote,
            branch: self.branch,
            strategy: self.strategy,
            auto_theirs: self.auto_theirs,
            no_backup: self.no_backup,
            push: self.push,
            stash_if_dirty: self.stash_if_dirty,
            verbosity,
        }
    }
}
