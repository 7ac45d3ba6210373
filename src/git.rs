use anyhow::{Context, Result, anyhow};
use std::fs;
use std::path::PathBuf;
use std::process::Command as GitCommand;

use crate::suggest::tag::CommitType;

/// Read-only view of a repository's staged changes and history.
///
/// Implementations never fail: anything that goes wrong (not a repository,
/// git missing, non-zero exit) comes back as an empty value.
pub trait RepoContext {
    /// Staged file paths as reported by git.
    fn changed_files(&self) -> Vec<String>;

    /// Staged diff with header and hunk metadata removed, cut to `max_chars`.
    fn staged_diff(&self, max_chars: usize) -> String;

    /// The last `n` commit subjects, oldest first.
    fn recent_subjects(&self, n: usize) -> Vec<String>;
}

/// Coarse working-tree state for the status light.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepoStatus {
    Clean,
    Unstaged,
    Staged,
    NotARepository,
}

/// One line of `history` output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub short_hash: String,
    pub subject: String,
    pub tag: Option<CommitType>,
}

/// A git working copy driven through the `git` command line.
#[derive(Debug, Clone)]
pub struct GitRepo {
    path: PathBuf,
}

impl GitRepo {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Run a git command in this repository and capture stdout as String.
    pub fn git_output(&self, args: &[&str]) -> Result<String> {
        let output = GitCommand::new("git")
            .arg("-C")
            .arg(&self.path)
            .args(args)
            .output()
            .with_context(|| format!("failed to run git {:?}", args))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!(
                "git {:?} exited with status {:?}: {}",
                args,
                output.status.code(),
                stderr.trim()
            ));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    /// Like `git_output`, but failures become an empty string.
    fn git_output_or_empty(&self, args: &[&str]) -> String {
        match self.git_output(args) {
            Ok(out) => out,
            Err(e) => {
                log::debug!("Treating git failure as empty result: {e:#}");
                String::new()
            }
        }
    }

    /// Get the path to the Git directory (e.g. .git)
    pub fn git_dir(&self) -> Result<PathBuf> {
        let dir = self.git_output(&["rev-parse", "--git-dir"])?.trim().to_string();
        let dir = PathBuf::from(dir);
        if dir.is_absolute() {
            Ok(dir)
        } else {
            Ok(self.path.join(dir))
        }
    }

    /// Write the commit message into .git/COMMIT_EDITMSG so the next `git commit`
    /// will use it as the default message in the editor.
    pub fn write_commit_editmsg(&self, message: &str) -> Result<PathBuf> {
        let path = self.git_dir()?.join("COMMIT_EDITMSG");
        fs::write(&path, format!("{message}\n"))
            .with_context(|| format!("failed to write commit message to {:?}", path))?;
        Ok(path)
    }

    /// Get the current branch name. Works before the first commit too, when
    /// `rev-parse` cannot resolve HEAD.
    pub fn current_branch(&self) -> Result<String> {
        let name = match self.git_output(&["rev-parse", "--abbrev-ref", "HEAD"]) {
            Ok(out) => out,
            Err(e) => {
                log::debug!("HEAD does not resolve, reading the symbolic ref: {e:#}");
                self.git_output(&["symbolic-ref", "--short", "HEAD"])?
            }
        };
        Ok(name.trim().to_string())
    }

    pub fn status(&self) -> RepoStatus {
        let Ok(porcelain) = self.git_output(&["status", "--porcelain"]) else {
            return RepoStatus::NotARepository;
        };
        if porcelain.trim().is_empty() {
            RepoStatus::Clean
        } else if self.changed_files().is_empty() {
            RepoStatus::Unstaged
        } else {
            RepoStatus::Staged
        }
    }

    /// Last `n` commits, newest first.
    pub fn history(&self, n: usize) -> Vec<HistoryEntry> {
        let count = n.to_string();
        let out = self.git_output_or_empty(&["log", "--pretty=format:%h|%s", "-n", &count]);
        parse_history(&out)
    }

    /// Stage the given paths.
    pub fn stage_paths(&self, paths: &[String]) -> Result<()> {
        if paths.is_empty() {
            return Ok(());
        }
        let mut args = vec!["add", "--"];
        args.extend(paths.iter().map(String::as_str));
        self.git_output(&args)?;
        Ok(())
    }

    /// Stage all new, modified, and deleted files
    pub fn stage_all(&self) -> Result<()> {
        log::warn!("Staging all changes");
        self.git_output(&["add", "-A"])?;
        Ok(())
    }

    /// Create a commit from the index.
    pub fn commit(&self, message: &str) -> Result<String> {
        self.git_output(&["commit", "-m", message])
            .context("failed to commit")
    }
}

impl RepoContext for GitRepo {
    fn changed_files(&self) -> Vec<String> {
        self.git_output_or_empty(&["diff", "--cached", "--name-only"])
            .lines()
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .collect()
    }

    fn staged_diff(&self, max_chars: usize) -> String {
        let raw = self.git_output_or_empty(&["diff", "--cached", "--unified=1", "--no-color"]);
        let stripped = strip_diff_metadata(&raw);
        stripped.chars().take(max_chars).collect()
    }

    fn recent_subjects(&self, n: usize) -> Vec<String> {
        let count = n.to_string();
        let out = self.git_output_or_empty(&["log", "--pretty=format:%s", "-n", &count]);
        let mut subjects: Vec<String> = out
            .lines()
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .collect();
        subjects.reverse();
        subjects
    }
}

/// Drop file headers, index lines and hunk markers, keeping changed content.
pub fn strip_diff_metadata(diff: &str) -> String {
    diff.lines()
        .filter(|line| {
            !(line.starts_with("+++")
                || line.starts_with("---")
                || line.starts_with("@@")
                || line.starts_with("index "))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Summarise file paths as `Changed files: a, b, c` (first 10, then `...`).
pub fn summarize_filenames(files: &[String]) -> String {
    if files.is_empty() {
        return String::new();
    }
    let shown: Vec<&str> = files.iter().take(10).map(String::as_str).collect();
    let more = if files.len() > 10 { ", ..." } else { "" };
    format!("Changed files: {}{more}", shown.join(", "))
}

fn parse_history(log_output: &str) -> Vec<HistoryEntry> {
    log_output
        .lines()
        .filter_map(|line| line.split_once('|'))
        .map(|(hash, subject)| HistoryEntry {
            short_hash: hash.trim().to_string(),
            subject: subject.trim().to_string(),
            tag: CommitType::split_header(subject).map(|(t, _)| t),
        })
        .collect()
}
