//! Test infrastructure for git-upstream-sync integration tests.

#![allow(dead_code)]

use anyhow::Result;
use git_upstream_sync::config::RunConfig;
use git_upstream_sync::git::{self, SystemGit, no_op_logger};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub fn git_at(path: &Path) -> SystemGit {
    SystemGit::new(path, no_op_logger)
}

pub fn run_git(path: &Path, args: &[&str]) -> Result<String> {
    git::run_git(&git_at(path), args)
}

fn configure_identity(path: &Path) -> Result<()> {
    run_git(path, &["config", "user.email", "test@example.com"])?;
    run_git(path, &["config", "user.name", "Test User"])?;
    run_git(path, &["config", "commit.gpgsign", "false"])?;
    Ok(())
}

fn write_file(root: &Path, file: &str, content: &str) -> Result<()> {
    let path = root.join(file);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)?;
    Ok(())
}

fn commit_file(root: &Path, file: &str, content: &str, message: &str) -> Result<()> {
    write_file(root, file, content)?;
    run_git(root, &["add", "--", file])?;
    run_git(root, &["commit", "-m", message])?;
    Ok(())
}

/// A local clone wired to two bare remotes, `upstream` and `origin`, plus a
/// second working copy of upstream used to publish upstream changes.
/// Everything is cleaned up when dropped.
pub struct TestRepo {
    _temp_dir: TempDir,
    path: PathBuf,
    upstream: PathBuf,
    origin: PathBuf,
    contributor: PathBuf,
}

impl TestRepo {
    /// Creates the repositories with a shared initial commit on `main`.
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let base = temp_dir.path();
        let path = base.join("local");
        let upstream = base.join("upstream.git");
        let origin = base.join("origin.git");
        let contributor = base.join("contributor");

        for bare in [&upstream, &origin] {
            std::fs::create_dir_all(bare)?;
            run_git(bare, &["init", "--bare", "-b", "main"])?;
        }

        std::fs::create_dir_all(&path)?;
        run_git(&path, &["init", "-b", "main"])?;
        configure_identity(&path)?;
        commit_file(&path, "README.md", "# Test Repo\n", "Initial commit")?;

        let upstream_url = upstream.to_string_lossy().into_owned();
        let origin_url = origin.to_string_lossy().into_owned();
        run_git(&path, &["remote", "add", "upstream", &upstream_url])?;
        run_git(&path, &["remote", "add", "origin", &origin_url])?;
        run_git(&path, &["push", "upstream", "main"])?;
        run_git(&path, &["push", "origin", "main"])?;
        run_git(&path, &["fetch", "--all"])?;

        run_git(
            base,
            &["clone", &upstream_url, &contributor.to_string_lossy()],
        )?;
        configure_identity(&contributor)?;

        Ok(Self {
            _temp_dir: temp_dir,
            path,
            upstream,
            origin,
            contributor,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn origin(&self) -> &Path {
        &self.origin
    }

    /// Commits `file` on the local `main`.
    pub fn commit_local(&self, file: &str, content: &str) -> Result<()> {
        commit_file(&self.path, file, content, &format!("Local change to {}", file))
    }

    /// Commits several files on the local `main` in a single commit.
    pub fn commit_local_files(&self, files: &[(&str, &str)]) -> Result<()> {
        for (file, content) in files {
            write_file(&self.path, file, content)?;
            run_git(&self.path, &["add", "--", file])?;
        }
        run_git(&self.path, &["commit", "-m", "Local changes"])?;
        Ok(())
    }

    /// Commits `file` on upstream's `main` and publishes it.
    pub fn commit_upstream(&self, file: &str, content: &str) -> Result<()> {
        commit_file(
            &self.contributor,
            file,
            content,
            &format!("Upstream change to {}", file),
        )?;
        run_git(&self.contributor, &["push", "origin", "main"])?;
        Ok(())
    }

    /// Deletes `file` on upstream's `main` and publishes it.
    pub fn delete_upstream(&self, file: &str) -> Result<()> {
        run_git(&self.contributor, &["rm", "--quiet", "--", file])?;
        run_git(
            &self.contributor,
            &["commit", "-m", &format!("Upstream removes {}", file)],
        )?;
        run_git(&self.contributor, &["push", "origin", "main"])?;
        Ok(())
    }

    /// Modifies a tracked file without committing.
    pub fn make_dirty(&self) -> Result<()> {
        write_file(&self.path, "README.md", "# Modified\n")
    }

    pub fn read(&self, file: &str) -> Result<String> {
        Ok(std::fs::read_to_string(self.path.join(file))?)
    }

    pub fn head(&self) -> Result<String> {
        self.rev_parse("HEAD")
    }

    pub fn rev_parse(&self, rev: &str) -> Result<String> {
        run_git(&self.path, &["rev-parse", rev])
    }

    pub fn backup_branches(&self) -> Result<Vec<String>> {
        let output = run_git(
            &self.path,
            &["branch", "--list", "backup/*", "--format=%(refname:short)"],
        )?;
        Ok(output.lines().map(String::from).collect())
    }

    pub fn has_stash(&self) -> Result<bool> {
        let output = run_git(&self.path, &["stash", "list"])?;
        Ok(!output.is_empty())
    }

    pub fn exists(&self, file: &str) -> bool {
        self.path.join(file).exists()
    }

    pub fn rebase_in_progress(&self) -> bool {
        let git_dir = self.path.join(".git");
        git_dir.join("rebase-merge").exists() || git_dir.join("rebase-apply").exists()
    }

    pub fn is_clean(&self) -> Result<bool> {
        Ok(run_git(&self.path, &["status", "--porcelain"])?.is_empty())
    }

    pub fn last_subject(&self) -> Result<String> {
        run_git(&self.path, &["log", "-1", "--format=%s"])
    }
}

/// Default configuration with output silenced.
pub fn test_config() -> RunConfig {
    RunConfig {
        verbosity: git_upstream_sync::config::Verbosity::Quiet,
        ..RunConfig::default()
    }
}
