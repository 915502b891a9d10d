//! Git operations using a hybrid CLI + libgit2 approach.
//!
//! **CLI (with hardening) for network operations:**
//! - `pull_ff_only` - fast-forward the working tree from a remote
//! - `push_branches` - push local branches to a remote
//!
//! Going through the system git means whatever credential helpers and
//! transports the user already configured are used as-is.
//!
//! **libgit2 for local operations:**
//! - `open_repository`, `workdir`
//! - `stage_path`, `commit_all`

use crate::config::AuthorIdentity;
use git2::{ErrorCode, Oid, Repository, Signature};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use thiserror::Error;

/// Errors returned by git operations.
#[derive(Error, Debug)]
pub enum GitError {
    /// libgit2 reported an error.
    #[error("git operation failed: {0}")]
    Git(#[from] git2::Error),
    /// Repository path does not contain a git repo.
    #[error("repository not found at {0}")]
    NotFound(String),
    /// Repository has no working tree.
    #[error("repository at {0} is bare and has no worktree")]
    BareRepository(String),
    /// A git subprocess exited unsuccessfully.
    #[error("`git {command}` failed: {stderr}")]
    CommandFailed { command: String, stderr: String },
    /// Underlying IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Invalid inputs were provided.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Validate that a remote name is safe to pass on the command line.
///
/// Rejects:
/// - Empty strings
/// - Strings starting with `-` (could be interpreted as flags)
/// - Strings containing null bytes or control characters
fn validate_remote(value: &str) -> Result<(), GitError> {
    if value.is_empty() {
        return Err(GitError::InvalidInput("remote cannot be empty".into()));
    }
    if value.starts_with('-') {
        return Err(GitError::InvalidInput("remote cannot start with '-'".into()));
    }
    if value.bytes().any(|b| b == 0 || b < 0x20) {
        return Err(GitError::InvalidInput(
            "remote cannot contain null or control characters".into(),
        ));
    }
    Ok(())
}

/// Git CLI wrapper with security hardening.
#[derive(Debug, Clone)]
pub struct GitCli {
    git_path: PathBuf,
}

impl Default for GitCli {
    fn default() -> Self {
        Self::new()
    }
}

impl GitCli {
    /// Create a new GitCli instance using the system git.
    pub fn new() -> Self {
        Self::with_path("git")
    }

    /// Create a GitCli instance that runs the given git executable.
    pub fn with_path(git_path: impl Into<PathBuf>) -> Self {
        Self {
            git_path: git_path.into(),
        }
    }

    /// Create a hardened Command with security settings.
    ///
    /// Applies:
    /// - `GIT_LFS_SKIP_SMUDGE=1` - skip LFS file downloads
    /// - `GIT_TERMINAL_PROMPT=0` - disable interactive prompts
    /// - `core.hooksPath=` - disable hooks execution
    fn command(&self, workdir: &Path) -> Command {
        let mut cmd = Command::new(&self.git_path);
        cmd.env("GIT_LFS_SKIP_SMUDGE", "1");
        cmd.env("GIT_TERMINAL_PROMPT", "0");
        cmd.args(["-c", "core.hooksPath="]);
        cmd.arg("-C").arg(workdir);
        cmd.stdin(Stdio::null());
        cmd
    }

    fn run(&self, workdir: &Path, args: &[&str]) -> Result<(), GitError> {
        let output = self.command(workdir).args(args).output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(GitError::CommandFailed {
                command: args.join(" "),
                stderr: stderr.trim().to_string(),
            });
        }

        Ok(())
    }

    /// Pull the remote's HEAD into the current branch, fast-forward only.
    ///
    /// Diverged histories are reported as an error rather than merged.
    pub fn pull_ff_only(&self, workdir: &Path, remote: &str) -> Result<(), GitError> {
        validate_remote(remote)?;
        self.run(workdir, &["pull", "--ff-only", remote, "HEAD"])
    }

    /// Push every local branch to the same-named branch on the remote.
    pub fn push_branches(&self, workdir: &Path, remote: &str) -> Result<(), GitError> {
        validate_remote(remote)?;
        self.run(workdir, &["push", remote, "refs/heads/*:refs/heads/*"])
    }
}

/// Open an existing repository at the given path.
///
/// Parent directories are not searched.
pub fn open_repository(path: &Path) -> Result<Repository, GitError> {
    let repo = Repository::open(path).map_err(|e| {
        if e.code() == ErrorCode::NotFound {
            GitError::NotFound(path.display().to_string())
        } else {
            GitError::Git(e)
        }
    })?;
    Ok(repo)
}

/// Return the working tree root of a repository.
pub fn workdir(repo: &Repository) -> Result<PathBuf, GitError> {
    repo.workdir()
        .map(Path::to_path_buf)
        .ok_or_else(|| GitError::BareRepository(repo.path().display().to_string()))
}

/// Add a single file, relative to the working tree root, to the index.
pub fn stage_path(repo: &Repository, path: &Path) -> Result<(), GitError> {
    let mut index = repo.index()?;
    index.add_path(path)?;
    index.write()?;
    Ok(())
}

/// Commit every tracked change in the working tree on top of `HEAD`.
///
/// Like `git commit -a`: modified and deleted tracked files are staged first,
/// untracked files are left alone. `author` is used as both author and
/// committer. An unborn branch gets a root commit.
pub fn commit_all(
    repo: &Repository,
    author: &AuthorIdentity,
    message: &str,
) -> Result<Oid, GitError> {
    let mut index = repo.index()?;
    index.update_all(["*"], None)?;
    index.write()?;

    let tree_id = index.write_tree()?;
    let tree = repo.find_tree(tree_id)?;

    let parent = match repo.head() {
        Ok(head) => Some(head.peel_to_commit()?),
        Err(e) if e.code() == ErrorCode::UnbornBranch || e.code() == ErrorCode::NotFound => None,
        Err(e) => return Err(e.into()),
    };
    let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();

    let signature = Signature::now(&author.name, &author.email)?;
    let oid = repo.commit(
        Some("HEAD"),
        &signature,
        &signature,
        message,
        &tree,
        &parents,
    )?;
    Ok(oid)
}
