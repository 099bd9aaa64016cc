//! Upstream branch synchronizer library.
//!
//! This crate brings a local branch up to date with an upstream remote by:
//! - Checking the repository, remote, and working tree
//! - Fetching all remotes with prune
//! - Creating a backup branch of the pre-update state
//! - Merging or rebasing onto the upstream branch
//! - Resolving lockfile (or, on request, all) conflicts from upstream
//! - Optionally pushing to origin and restoring stashed changes

pub mod cli;
pub mod config;
pub mod conflict;
pub mod constants;
pub mod git;
pub mod output;
pub mod sync;
