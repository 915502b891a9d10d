//! Pull, write the marker file, commit it, push.
//!
//! Steps run strictly in order. Pull and marker write are best-effort: their
//! errors are logged and the run continues. Every other step stops the run
//! on the first error, leaving the repository as it is.

use crate::config::AuthorIdentity;
use crate::git::{self, GitCli, GitError};
use git2::Oid;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Remote that is pulled from and pushed to.
pub const REMOTE: &str = "origin";
/// Marker file written at the working tree root.
pub const MARKER_FILE: &str = "test.txt";
/// Message of the marker commit.
pub const COMMIT_MESSAGE: &str = "Test commit";
/// Unix mode the marker file is created with.
pub const MARKER_MODE: u32 = 0o644;

/// A step that stopped the run.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("failed to open repository: {0}")]
    Open(GitError),
    #[error("failed to get worktree: {0}")]
    Worktree(GitError),
    #[error("failed to stage test.txt: {0}")]
    Stage(GitError),
    #[error("failed to commit: {0}")]
    Commit(GitError),
    #[error("failed to push to origin: {0}")]
    Push(GitError),
}

/// Outcome of a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    /// The commit that was created and pushed.
    pub commit: Oid,
    /// Whether the pull succeeded.
    pub pulled: bool,
    /// Whether the marker file was written.
    pub marker_written: bool,
}

/// Runs the pull, marker commit and push against one working directory.
pub struct Sequencer {
    workdir: PathBuf,
    identity: AuthorIdentity,
    git: GitCli,
}

impl Sequencer {
    /// Create a sequencer for the repository rooted at `workdir`.
    pub fn new(workdir: impl Into<PathBuf>, identity: AuthorIdentity) -> Self {
        Self {
            workdir: workdir.into(),
            identity,
            git: GitCli::new(),
        }
    }

    /// Use a different git CLI for pull and push.
    pub fn with_git(mut self, git: GitCli) -> Self {
        self.git = git;
        self
    }

    /// Run every step in order.
    pub fn run(&self) -> Result<SyncReport, SyncError> {
        log::debug!("open Git repo in {}", self.workdir.display());
        let repo = git::open_repository(&self.workdir).map_err(SyncError::Open)?;
        let worktree = git::workdir(&repo).map_err(SyncError::Worktree)?;

        let pulled = match self.git.pull_ff_only(&worktree, REMOTE) {
            Ok(()) => true,
            Err(e) => {
                log::error!("error while pulling: {}", e);
                false
            }
        };

        log::debug!("write test file: {}", MARKER_FILE);
        let marker_written = match write_marker(&worktree.join(MARKER_FILE)) {
            Ok(()) => true,
            Err(e) => {
                log::error!("error while writing {}: {}", MARKER_FILE, e);
                false
            }
        };

        git::stage_path(&repo, Path::new(MARKER_FILE)).map_err(SyncError::Stage)?;

        log::debug!("create test commit");
        let result = git::commit_all(&repo, &self.identity, COMMIT_MESSAGE);
        log::debug!(
            "commit hash: {}",
            result.as_ref().map(Oid::to_string).unwrap_or_default()
        );
        let commit = result.map_err(SyncError::Commit)?;

        log::debug!("push commit to {}", REMOTE);
        self.git
            .push_branches(&worktree, REMOTE)
            .map_err(SyncError::Push)?;

        Ok(SyncReport {
            commit,
            pulled,
            marker_written,
        })
    }
}

/// Current local time as marker file content.
fn timestamp() -> String {
    chrono::Local::now().to_string()
}

/// Overwrite `path` with the current timestamp.
fn write_marker(path: &Path) -> std::io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(MARKER_MODE);
    }

    let mut file = options.open(path)?;
    file.write_all(timestamp().as_bytes())?;
    Ok(())
}
