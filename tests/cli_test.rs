mod common;

use common::TestRepo;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn run_cli(dir: &Path, args: &[&str]) -> std::io::Result<Output> {
    Command::new(env!("CARGO_BIN_EXE_git-upstream-sync"))
        .current_dir(dir)
        .env("GIT_CEILING_DIRECTORIES", dir.parent().unwrap_or(dir))
        .args(args)
        .output()
}

#[test]
fn test_unknown_flag_exits_with_usage() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let output = run_cli(dir.path(), &["--frobnicate"])?;

    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Usage"));
    Ok(())
}

#[test]
fn test_unknown_strategy_exits_with_usage() -> anyhow::Result<()> {
    let repo = TestRepo::new()?;
    let output = run_cli(repo.path(), &["--strategy", "squash"])?;

    assert_eq!(output.status.code(), Some(2));
    assert!(repo.backup_branches()?.is_empty());
    Ok(())
}

#[test]
fn test_help_exits_zero() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let output = run_cli(dir.path(), &["-h"])?;

    assert_eq!(output.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&output.stdout).contains("--auto-theirs"));
    Ok(())
}

#[test]
fn test_outside_repository_exits_one() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let output = run_cli(dir.path(), &["--quiet"])?;

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Not inside a git repository"));
    Ok(())
}

#[test]
fn test_conflicts_exit_two() -> anyhow::Result<()> {
    let repo = TestRepo::new()?;
    repo.commit_upstream("src.txt", "upstream\n")?;
    repo.commit_local("src.txt", "local\n")?;

    let output = run_cli(repo.path(), &["--quiet"])?;

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("src.txt"));
    assert!(stderr.contains("Resolve the conflicts manually"));
    assert!(stderr.contains("git rebase --abort"));
    Ok(())
}

#[test]
fn test_clean_sync_exits_zero() -> anyhow::Result<()> {
    let repo = TestRepo::new()?;
    repo.commit_upstream("feature.txt", "from upstream\n")?;

    let output = run_cli(repo.path(), &["--no-backup", "-q"])?;

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(repo.read("feature.txt")?, "from upstream\n");
    Ok(())
}
