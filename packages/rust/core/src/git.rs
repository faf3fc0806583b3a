//! Git synchronization around a pipeline run.
//!
//! Thin wrapper over the `git` executable. Every operation is a no-op unless
//! the run has git enabled.

use std::path::Path;
use std::process::Command;

use tracing::{debug, info, instrument};

use quantifying_shared::{QuantifyingError, Result};

use crate::context::RunContext;

/// Remote every operation talks to.
const REMOTE: &str = "origin";

/// Branch used when `HEAD` is detached and none was requested.
const DEFAULT_BRANCH: &str = "main";

/// Fetch `origin` and merge `origin/<branch>` into the current branch.
///
/// `branch` defaults to the current branch.
#[instrument(skip_all, fields(repo = %repo.display()))]
pub fn fetch_and_merge(ctx: &RunContext, repo: &Path, branch: Option<&str>) -> Result<()> {
    if !ctx.config.enable_git {
        return Ok(());
    }
    ensure_repository(repo)?;

    let op = "Error during fetch and merge";
    run_git(repo, &["fetch", REMOTE]).map_err(|e| with_context(op, e))?;

    let branch = match branch {
        Some(branch) => branch.to_string(),
        None => current_branch(repo),
    };

    let remote_ref = format!("refs/remotes/{REMOTE}/{branch}");
    if run_git(repo, &["rev-parse", "--verify", "--quiet", remote_ref.as_str()]).is_err() {
        return Err(with_context(
            op,
            QuantifyingError::git(format!(
                "Branch '{branch}' does not exist in remote '{REMOTE}'"
            )),
        ));
    }

    let tracking = format!("{REMOTE}/{branch}");
    run_git(
        repo,
        &["merge", "--allow-unrelated-histories", "--no-edit", tracking.as_str()],
    )
    .map_err(|e| with_context(op, e))?;

    info!("Fetched and merged latest changes from {branch}");
    Ok(())
}

/// Stage `add_path` and commit it with `message`.
///
/// When `add_path` has nothing to commit, the returned context has git
/// disabled so a following push is skipped.
#[instrument(skip_all, fields(repo = %repo.display(), add_path = %add_path.display()))]
pub fn add_and_commit(
    ctx: RunContext,
    repo: &Path,
    add_path: &Path,
    message: &str,
) -> Result<RunContext> {
    if !ctx.config.enable_git {
        return Ok(ctx);
    }
    ensure_repository(repo)?;

    let op = "Error during add and commit";
    let pathspec = add_path.to_string_lossy().into_owned();
    let status = run_git(
        repo,
        &["status", "--porcelain", "--untracked-files=all", "--", pathspec.as_str()],
    )
    .map_err(|e| with_context(op, e))?;

    if status.trim().is_empty() {
        let relative = add_path
            .strip_prefix(repo)
            .map(|p| p.display().to_string())
            .unwrap_or_else(|_| add_path.display().to_string());
        info!("No changes to commit in: {relative}");
        return Ok(ctx.with_git_disabled());
    }

    run_git(repo, &["add", "--", pathspec.as_str()]).map_err(|e| with_context(op, e))?;
    run_git(repo, &["commit", "-m", message]).map_err(|e| with_context(op, e))?;

    info!("Changes committed: {message}");
    Ok(ctx)
}

/// Push the current branch to `origin`.
#[instrument(skip_all, fields(repo = %repo.display()))]
pub fn push_changes(ctx: &RunContext, repo: &Path) -> Result<()> {
    if !ctx.config.enable_git {
        return Ok(());
    }
    ensure_repository(repo)?;

    run_git(repo, &["push", REMOTE]).map_err(|e| with_context("Error during push changes", e))?;

    info!("Changes pushed");
    Ok(())
}

/// Distinguish a missing path from a directory that is not a work tree.
fn ensure_repository(repo: &Path) -> Result<()> {
    if !repo.exists() {
        return Err(QuantifyingError::NoSuchPath {
            path: repo.to_path_buf(),
        });
    }

    match run_git(repo, &["rev-parse", "--is-inside-work-tree"]) {
        Ok(out) if out.trim() == "true" => Ok(()),
        _ => Err(QuantifyingError::InvalidRepository {
            path: repo.to_path_buf(),
        }),
    }
}

/// Short name of the checked-out branch, or the default when detached.
fn current_branch(repo: &Path) -> String {
    match run_git(repo, &["symbolic-ref", "--short", "-q", "HEAD"]) {
        Ok(name) if !name.trim().is_empty() => name.trim().to_string(),
        _ => DEFAULT_BRANCH.to_string(),
    }
}

/// Run `git -C <repo> <args>`, returning stdout on success.
fn run_git(repo: &Path, args: &[&str]) -> Result<String> {
    debug!(?args, "running git");

    let output = Command::new("git")
        .arg("-C")
        .arg(repo)
        .args(args)
        .output()
        .map_err(|e| QuantifyingError::git(format!("failed to run git: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let message = if stderr.is_empty() {
            format!("git {} exited with {}", args.join(" "), output.status)
        } else {
            stderr
        };
        return Err(QuantifyingError::git(message));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Prefix a git failure with the operation it interrupted.
fn with_context(op: &str, err: QuantifyingError) -> QuantifyingError {
    match err {
        QuantifyingError::Git { message, exit_code } => QuantifyingError::Git {
            message: format!("{op}: {message}"),
            exit_code,
        },
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use quantifying_shared::RunConfig;

    use super::*;
    use crate::paths::PathTable;

    fn git_available() -> bool {
        Command::new("git")
            .arg("--version")
            .output()
            .is_ok_and(|o| o.status.success())
    }

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("qc-git-test-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::canonicalize(&dir).unwrap()
    }

    fn git(dir: &Path, args: &[&str]) {
        let status = Command::new("git")
            .arg("-C")
            .arg(dir)
            .args(args)
            .output()
            .unwrap();
        assert!(status.status.success(), "git {args:?} failed: {status:?}");
    }

    fn ctx(repo: &Path, enable_git: bool) -> RunContext {
        let quarter = "2024Q1".parse().unwrap();
        RunContext::new(
            RunConfig {
                enable_save: true,
                enable_git,
            },
            quarter,
            PathTable::setup(repo, "3-report", quarter).unwrap(),
        )
    }

    /// A bare `origin` plus a work tree with one pushed commit on `main`.
    fn repo_with_origin() -> (PathBuf, PathBuf) {
        let root = temp_dir();
        let origin = root.join("origin.git");
        let work = root.join("work");

        git(&root, &["init", "-q", "--bare", "origin.git"]);
        git(&root, &["init", "-q", "-b", "main", "work"]);
        git(&work, &["config", "user.email", "pipeline@example.com"]);
        git(&work, &["config", "user.name", "Pipeline"]);
        std::fs::write(work.join("README.md"), "seed\n").unwrap();
        git(&work, &["add", "README.md"]);
        git(&work, &["commit", "-q", "-m", "seed"]);
        git(&work, &["remote", "add", "origin", origin.to_str().unwrap()]);
        git(&work, &["push", "-q", "-u", "origin", "main"]);

        (root, work)
    }

    #[test]
    fn disabled_git_is_noop_even_for_missing_repo() {
        let root = temp_dir();
        let context = ctx(&root, false);
        let missing = root.join("missing");

        assert!(fetch_and_merge(&context, &missing, None).is_ok());
        assert!(push_changes(&context, &missing).is_ok());
        let back = add_and_commit(context, &missing, &missing, "msg").unwrap();
        assert!(!back.config.enable_git);

        std::fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn missing_and_invalid_repositories_map_to_exit_codes() {
        if !git_available() {
            return;
        }
        let root = temp_dir();
        let context = ctx(&root, true);

        let err = push_changes(&context, &root.join("missing")).unwrap_err();
        assert!(matches!(err, QuantifyingError::NoSuchPath { .. }));
        assert_eq!(err.exit_code(), 3);

        let err = push_changes(&context, &root).unwrap_err();
        assert!(matches!(err, QuantifyingError::InvalidRepository { .. }));
        assert_eq!(err.exit_code(), 2);

        std::fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn commit_without_changes_disables_git() {
        if !git_available() {
            return;
        }
        let (root, work) = repo_with_origin();

        let context = add_and_commit(ctx(&work, true), &work, &work.join("README.md"), "noop")
            .unwrap();
        assert!(!context.config.enable_git);

        std::fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn commit_and_push_new_report() {
        if !git_available() {
            return;
        }
        let (root, work) = repo_with_origin();
        let data = work.join("data");
        std::fs::create_dir_all(&data).unwrap();
        std::fs::write(data.join("report.md"), "new\n").unwrap();

        let context = add_and_commit(ctx(&work, true), &work, &data, "Add report").unwrap();
        assert!(context.config.enable_git);
        push_changes(&context, &work).unwrap();

        let log = run_git(&root.join("origin.git"), &["log", "-1", "--format=%s", "main"]).unwrap();
        assert_eq!(log.trim(), "Add report");

        std::fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn fetch_and_merge_current_and_missing_branch() {
        if !git_available() {
            return;
        }
        let (root, work) = repo_with_origin();
        let context = ctx(&work, true);

        fetch_and_merge(&context, &work, None).unwrap();

        let err = fetch_and_merge(&context, &work, Some("no-such-branch")).unwrap_err();
        assert!(matches!(err, QuantifyingError::Git { exit_code: 1, .. }));
        assert!(err.to_string().contains("does not exist in remote 'origin'"));

        std::fs::remove_dir_all(&root).ok();
    }
}
