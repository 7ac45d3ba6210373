use anyhow::{Result, bail};

use crate::suggest::tag::CommitType;

/// Parts of a hand-written Conventional Commit message.
#[derive(Debug, Clone)]
pub struct Composition<'a> {
    pub commit_type: CommitType,
    pub scope: Option<&'a str>,
    pub description: &'a str,
    pub breaking: bool,
}

/// Render `type(scope)!: description`, plus a `BREAKING CHANGE:` footer when
/// the change is breaking.
pub fn build_message(parts: &Composition<'_>) -> Result<String> {
    let description = parts.description.trim();
    if description.is_empty() {
        bail!("Description cannot be empty");
    }

    let scope = parts
        .scope
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| format!("({s})"))
        .unwrap_or_default();
    let bang = if parts.breaking { "!" } else { "" };

    let mut message = format!("{}{scope}{bang}: {description}", parts.commit_type);
    if parts.breaking {
        message.push_str(&format!("\n\nBREAKING CHANGE: {description}"));
    }
    Ok(message)
}
