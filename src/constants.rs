//! Application-wide constants.
//!
//! Centralized configuration values to avoid magic numbers throughout the codebase.

/// Remote synced from when `--remote` is not given.
pub const DEFAULT_REMOTE: &str = "upstream";

/// Branch updated when `--branch` is not given.
pub const DEFAULT_BRANCH: &str = "main";

/// Remote the result is pushed to with `--push`.
pub const PUSH_REMOTE: &str = "origin";

/// Prefix of the backup branch created before the update.
pub const BACKUP_PREFIX: &str = "backup/";

/// `chrono` format of the backup branch timestamp (`YYYYMMDD-HHMMSS`).
pub const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

/// Message attached to the stash entry created by `--stash-if-dirty`.
pub const STASH_MESSAGE: &str = "git-upstream-sync: auto-stash before sync";

/// Output of `git stash` when there was nothing to save.
pub const NO_LOCAL_CHANGES: &str = "No local changes to save";

/// Dependency lockfiles whose conflicts are resolved by taking upstream.
/// Matched against the file name only, so nested workspace lockfiles count.
pub const LOCKFILES: &[&str] = &[
    "package-lock.json",
    "npm-shrinkwrap.json",
    "yarn.lock",
    "pnpm-lock.yaml",
    "bun.lockb",
    "Cargo.lock",
    "Gemfile.lock",
    "poetry.lock",
    "Pipfile.lock",
    "uv.lock",
    "composer.lock",
    "go.sum",
    "mix.lock",
    "pubspec.lock",
    "Podfile.lock",
    "flake.lock",
];

/// Progress spinner tick interval in milliseconds.
pub const PROGRESS_TICK_MS: u64 = 80;

/// Process exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_PRECONDITION: i32 = 1;
pub const EXIT_CONFLICTS: i32 = 2;

/// Exit code used when git was killed by a signal and reported none.
pub const EXIT_UNKNOWN: i32 = 1;
