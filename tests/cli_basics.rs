use assert_cmd::{cargo}; // handy crate for testing CLIs
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use std::process::Command;

/// Command isolated from the user's config file and environment.
fn isolated_cmd(home: &std::path::Path) -> assert_cmd::Command {
    let mut cmd = cargo::cargo_bin_cmd!();
    cmd.current_dir(home)
        .env("HOME", home)
        .env_remove("COMMITCRAFT_BACKEND")
        .env_remove("COMMITCRAFT_MODEL")
        .env_remove("COMMITCRAFT_BASE_URL")
        .env_remove("COMMITCRAFT_CANDIDATES")
        .env_remove("OPENAI_API_KEY");
    cmd
}

fn git(dir: &Path, args: &[&str]) -> String {
    let out = Command::new("git")
        .arg("-C")
        .arg(dir)
        .args(args)
        .output()
        .expect("git should run");
    assert!(out.status.success(), "git {args:?} failed: {}", String::from_utf8_lossy(&out.stderr));
    String::from_utf8_lossy(&out.stdout).to_string()
}

/// Fresh repository with a local identity, in a `repo/` subdir so the
/// isolated home can sit beside it.
fn init_repo() -> (tempfile::TempDir, std::path::PathBuf) {
    let root = tempfile::tempdir().unwrap();
    let repo = root.path().join("repo");
    fs::create_dir(&repo).unwrap();
    git(&repo, &["init", "-q", "-b", "main"]);
    git(&repo, &["config", "user.name", "Test"]);
    git(&repo, &["config", "user.email", "test@example.com"]);
    git(&repo, &["config", "commit.gpgsign", "false"]);
    (root, repo)
}

#[test]
fn prints_help() {
    let mut cmd = cargo::cargo_bin_cmd!();

    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicates::str::contains("Usage"))
        .stdout(predicates::str::contains("suggest"));
}

#[test]
fn prints_version() {
    let mut cmd = cargo::cargo_bin_cmd!();

    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicates::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn suggest_outside_repo_has_nothing_to_commit() {
    let dir = tempfile::tempdir().unwrap();

    isolated_cmd(dir.path())
        .args(["--no-model", "suggest"])
        .assert()
        .success()
        .stdout(predicates::str::contains("No staged changes to commit."));
}

#[test]
fn suggest_from_stdin_diff_uses_fallback() {
    let dir = tempfile::tempdir().unwrap();

    isolated_cmd(dir.path())
        .args(["--no-model", "suggest", "--diff-file", "-"])
        .write_stdin("+fn main() {}\n")
        .assert()
        .success()
        .stdout(predicates::str::contains("chore: update project files"));
}

#[test]
fn compose_builds_scoped_message() {
    let dir = tempfile::tempdir().unwrap();

    isolated_cmd(dir.path())
        .args(["compose", "--type", "fix", "--scope", "api", "handle", "empty", "body"])
        .assert()
        .success()
        .stdout(predicates::str::diff("fix(api): handle empty body\n"));
}

#[test]
fn compose_requires_description() {
    let dir = tempfile::tempdir().unwrap();

    isolated_cmd(dir.path())
        .args(["compose", "--type", "fix"])
        .assert()
        .failure();
}

#[test]
fn zero_candidates_is_rejected() {
    let dir = tempfile::tempdir().unwrap();

    isolated_cmd(dir.path())
        .args(["suggest", "--candidates", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("candidates"));
}

#[test]
fn status_outside_repo() {
    let dir = tempfile::tempdir().unwrap();

    isolated_cmd(dir.path())
        .arg("status")
        .assert()
        .success()
        .stdout(predicates::str::contains("not a git repository"));
}

#[test]
fn status_in_fresh_repo_with_staged_file() {
    let (root, repo) = init_repo();
    fs::write(repo.join("a.txt"), "hello\n").unwrap();
    git(&repo, &["add", "a.txt"]);

    isolated_cmd(root.path())
        .args(["--repo", repo.to_str().unwrap(), "status"])
        .assert()
        .success()
        .stdout(predicates::str::contains("main"))
        .stdout(predicates::str::contains("staged changes"));
}

#[test]
fn suggest_apply_writes_commit_editmsg() {
    let (root, repo) = init_repo();
    fs::write(repo.join("README.md"), "# demo\n").unwrap();
    git(&repo, &["add", "README.md"]);

    isolated_cmd(root.path())
        .args(["--repo", repo.to_str().unwrap(), "--no-model", "suggest", "--apply"])
        .assert()
        .success()
        .stdout(predicates::str::contains("docs: update documentation"));

    let written = fs::read_to_string(repo.join(".git").join("COMMIT_EDITMSG")).unwrap();
    assert_eq!(written, "docs: update documentation\n");
}

#[test]
fn commit_all_uses_suggested_message() {
    let (root, repo) = init_repo();
    fs::create_dir(repo.join("src")).unwrap();
    fs::write(repo.join("src").join("App.py"), "print('hi')\n").unwrap();

    isolated_cmd(root.path())
        .args(["--repo", repo.to_str().unwrap(), "--no-model", "commit", "--all"])
        .assert()
        .success();

    let subject = git(&repo, &["log", "-1", "--pretty=format:%s"]);
    assert_eq!(subject, "chore: update app.py");
    assert!(git(&repo, &["status", "--porcelain"]).trim().is_empty());
}

#[test]
fn commit_with_explicit_message() {
    let (root, repo) = init_repo();
    fs::write(repo.join("a.txt"), "one\n").unwrap();
    fs::write(repo.join("b.txt"), "two\n").unwrap();

    isolated_cmd(root.path())
        .args(["--repo", repo.to_str().unwrap(), "--no-model", "commit", "-m", "fix: only a", "a.txt"])
        .assert()
        .success();

    assert_eq!(git(&repo, &["log", "-1", "--pretty=format:%s"]), "fix: only a");
    assert_eq!(git(&repo, &["status", "--porcelain"]).trim(), "?? b.txt");
}

#[test]
fn commit_with_nothing_to_stage() {
    let (root, repo) = init_repo();

    isolated_cmd(root.path())
        .args(["--repo", repo.to_str().unwrap(), "--no-model", "commit"])
        .assert()
        .success()
        .stdout(predicates::str::contains("No staged changes to commit."));
}
