//! Conflicted-file bookkeeping and the upstream-wins resolution passes.

use crate::config::Strategy;
use crate::constants::LOCKFILES;
use crate::git::{self, ConflictSide, GitRunner};
use std::path::Path;

/// Files git reports as unmerged, in the order git lists them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConflictSet {
    files: Vec<String>,
}

impl ConflictSet {
    pub fn new(files: Vec<String>) -> Self {
        Self { files }
    }

    /// Reads the current unmerged paths from the repository.
    pub fn collect(git: &impl GitRunner) -> anyhow::Result<Self> {
        git::unmerged_files(git).map(Self::new)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn files(&self) -> &[String] {
        &self.files
    }

    /// Conflicted files whose name is on the lockfile allow-list.
    #[must_use]
    pub fn lockfiles(&self) -> Vec<String> {
        self.files
            .iter()
            .filter(|path| is_lockfile(path))
            .cloned()
            .collect()
    }

    pub fn into_files(self) -> Vec<String> {
        self.files
    }
}

/// True when the file name of `path` exactly equals an allow-listed lockfile.
#[must_use]
pub fn is_lockfile(path: &str) -> bool {
    Path::new(path)
        .file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| LOCKFILES.contains(&name))
}

/// The checkout side that holds the upstream content for `strategy`.
///
/// During a rebase the roles swap: HEAD is the upstream commit being rebased
/// onto, so upstream is "ours".
#[must_use]
pub fn upstream_side(strategy: Strategy) -> ConflictSide {
    match strategy {
        Strategy::Merge => ConflictSide::Theirs,
        Strategy::Rebase => ConflictSide::Ours,
    }
}

/// What happened to each file handed to [`accept_upstream`].
#[derive(Debug, Default)]
pub struct Resolution {
    pub resolved: Vec<String>,
    /// Files that could not be restored or staged, with the reason.
    pub failed: Vec<(String, String)>,
}

/// Restores every file in `files` to its upstream version and stages it.
/// A file upstream deleted is removed instead.
///
/// Failures are collected rather than raised; the caller re-reads the
/// conflict set afterwards to learn what is still unmerged.
pub fn accept_upstream(git: &impl GitRunner, strategy: Strategy, files: &[String]) -> Resolution {
    let side = upstream_side(strategy);
    let mut resolution = Resolution::default();

    for file in files {
        let staged = git::has_conflict_side(git, side, file).and_then(|present| {
            if present {
                git::checkout_side(git, side, file).and_then(|()| git::add(git, file))
            } else {
                git::remove(git, file)
            }
        });
        match staged {
            Ok(()) => resolution.resolved.push(file.clone()),
            Err(e) => resolution.failed.push((file.clone(), format!("{:#}", e))),
        }
    }

    resolution
}
