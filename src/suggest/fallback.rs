//! Rule-based messages for when the model gives us nothing usable.
//!
//! These are keyword guesses over file names and diff text. They always
//! produce a well-formed message but say nothing about whether it is an
//! accurate description of the change.

use std::path::Path;

use super::extract::truncate_chars;
use super::tag::CommitType;

pub const DEFAULT_MESSAGE: &str = "chore: update project files";

const DEPENDENCY_MANIFESTS: &[&str] = &[
    "package.json",
    "package-lock.json",
    "yarn.lock",
    "pnpm-lock.yaml",
    "requirements",
    "pipfile",
    "pyproject.toml",
    "poetry.lock",
    "cargo.toml",
    "cargo.lock",
    "go.mod",
    "go.sum",
    "gemfile",
    "composer.json",
    "pom.xml",
    "build.gradle",
];

/// Derive a message from the changed file list alone. First matching rule wins.
pub fn fallback_message(changed_files: &[String], max_len: usize) -> String {
    let lower = changed_files.join("\n").to_lowercase();

    if lower.contains("readme") || lower.contains("doc") {
        return "docs: update documentation".to_string();
    }
    if lower.contains("test") {
        return "test: update tests".to_string();
    }
    if DEPENDENCY_MANIFESTS.iter().any(|m| lower.contains(m)) {
        return "chore: update dependencies".to_string();
    }

    let names: Vec<&str> = lower
        .lines()
        .map(base_name)
        .filter(|n| !n.is_empty())
        .take(3)
        .collect();
    if names.is_empty() {
        return DEFAULT_MESSAGE.to_string();
    }

    let message = format!("chore: update {}", names.join(", "));
    truncate_chars(&message, max_len).trim_end().to_string()
}

/// Best-effort type guess from raw diff text keywords.
pub fn guess_type(diff_text: &str) -> CommitType {
    let lower = diff_text.to_lowercase();
    let has = |words: &[&str]| words.iter().any(|w| lower.contains(w));

    if has(&["fix", "bug", "error"]) {
        CommitType::Fix
    } else if has(&["test", "assert"]) {
        CommitType::Test
    } else if has(&["perf", "optimiz"]) {
        CommitType::Perf
    } else if has(&["doc", "readme"]) {
        CommitType::Docs
    } else if has(&["refactor", "cleanup"]) {
        CommitType::Refactor
    } else if has(&["style", "lint", "format"]) {
        CommitType::Style
    } else if has(&["dependenc", "version"]) {
        CommitType::Chore
    } else {
        CommitType::DEFAULT
    }
}

fn base_name(path: &str) -> &str {
    let trimmed = path.trim().trim_end_matches('/');
    Path::new(trimmed)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn files(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn readme_means_docs() {
        assert_eq!(
            fallback_message(&files(&["README.md"]), 80),
            "docs: update documentation"
        );
        assert_eq!(
            fallback_message(&files(&["site/docs/intro.md", "src/main.rs"]), 80),
            "docs: update documentation"
        );
    }

    #[test]
    fn tests_before_manifests() {
        assert_eq!(
            fallback_message(&files(&["tests/cli.rs", "Cargo.toml"]), 80),
            "test: update tests"
        );
    }

    #[test]
    fn manifests_mean_dependencies() {
        assert_eq!(
            fallback_message(&files(&["Cargo.lock"]), 80),
            "chore: update dependencies"
        );
        assert_eq!(
            fallback_message(&files(&["requirements.txt"]), 80),
            "chore: update dependencies"
        );
    }

    #[test]
    fn otherwise_names_up_to_three_files() {
        assert_eq!(
            fallback_message(&files(&["src/app.py", "src/util.py"]), 80),
            "chore: update app.py, util.py"
        );
        assert_eq!(
            fallback_message(&files(&["a.c", "b/b.c", "c.c", "d.c"]), 80),
            "chore: update a.c, b.c, c.c"
        );
    }

    #[test]
    fn names_are_lowercased() {
        assert_eq!(
            fallback_message(&files(&["Src/App.PY", "LICENSE"]), 80),
            "chore: update app.py, license"
        );
    }

    #[test]
    fn long_names_are_truncated() {
        let long = format!("src/{}.rs", "x".repeat(120));
        let msg = fallback_message(&files(&[&long]), 80);
        assert!(msg.starts_with("chore: update x"));
        assert_eq!(msg.chars().count(), 80);
    }

    #[test]
    fn nothing_changed_uses_default() {
        assert_eq!(fallback_message(&[], 80), DEFAULT_MESSAGE);
    }

    #[test]
    fn guess_type_keywords() {
        assert_eq!(guess_type("+ // fix off-by-one"), CommitType::Fix);
        assert_eq!(guess_type("+ assert_eq!(a, b);"), CommitType::Test);
        assert_eq!(guess_type("optimize the loop"), CommitType::Perf);
        assert_eq!(guess_type("README wording"), CommitType::Docs);
        assert_eq!(guess_type("cleanup helpers"), CommitType::Refactor);
        assert_eq!(guess_type("rustfmt lint"), CommitType::Style);
        assert_eq!(guess_type("bump version"), CommitType::Chore);
        assert_eq!(guess_type("add new widget"), CommitType::Feat);
    }
}
