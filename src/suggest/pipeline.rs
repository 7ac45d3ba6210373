use anyhow::{Result, bail};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::git::{RepoContext, summarize_filenames};
use crate::llm::prompt_builder::PromptBuilder;
use crate::llm::{Decoding, Generator, SamplingParams, truncate_for_log};

use super::extract::extract;
use super::fallback::fallback_message;
use super::rank::{dedupe, rank};

/// Lines of explicit diff text used as the change summary when no file
/// names are available.
const DIFF_SUMMARY_LINES: usize = 20;

/// Tunable limits for one suggestion run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Limits {
    pub history_count: usize,
    pub max_examples: usize,
    pub max_context_tokens: usize,
    pub max_new_tokens: u32,
    pub max_commit_length: usize,
    pub temperature: f32,
    pub top_p: f32,
    pub include_diff: bool,
    pub diff_chars: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            history_count: 5,
            max_examples: 3,
            max_context_tokens: 2000,
            max_new_tokens: 120,
            max_commit_length: 80,
            temperature: 0.6,
            top_p: 0.9,
            include_diff: false,
            diff_chars: 1500,
        }
    }
}

/// Shared flag that stops a run from requesting further completions.
/// The run still selects a message from whatever was generated before.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Where the selected message came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Model,
    Fallback,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub message: String,
    pub origin: Origin,
    /// Every cleaned, deduplicated candidate, in generation order.
    pub candidates: Vec<String>,
    /// Completion slots that failed and were treated as empty.
    pub failed_slots: usize,
    /// Completion slots never requested because the run was cancelled.
    pub skipped_slots: usize,
    pub prompt_shrunk: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Suggestion {
    Selected(Selection),
    /// No staged changes and no diff text to work from.
    NothingToCommit,
}

/// Runs the suggestion pipeline against a repository and a generator.
pub struct Suggester<'a> {
    repo: &'a dyn RepoContext,
    generator: &'a dyn Generator,
    limits: Limits,
    style_examples: Option<Vec<String>>,
    cancel: CancelToken,
}

impl<'a> Suggester<'a> {
    pub fn new(repo: &'a dyn RepoContext, generator: &'a dyn Generator, limits: Limits) -> Self {
        Self {
            repo,
            generator,
            limits,
            style_examples: None,
            cancel: CancelToken::new(),
        }
    }

    /// Use these lines as prompt style examples instead of git history.
    pub fn with_style_examples(mut self, examples: Vec<String>) -> Self {
        if !examples.is_empty() {
            self.style_examples = Some(examples);
        }
        self
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Suggest one commit message from `candidate_count` completions.
    ///
    /// `explicit_diff` stands in for staged changes when the caller already
    /// has diff text. Generation failures never surface as errors; only a
    /// zero candidate count does.
    pub fn suggest(&self, explicit_diff: Option<&str>, candidate_count: usize) -> Result<Suggestion> {
        if candidate_count == 0 {
            bail!("candidate count must be at least 1");
        }

        let files = self.repo.changed_files();
        let explicit_diff = explicit_diff.filter(|d| !d.trim().is_empty());
        if files.is_empty() && explicit_diff.is_none() {
            log::info!("No staged changes and no diff text supplied");
            return Ok(Suggestion::NothingToCommit);
        }

        let files_summary = summarize_filenames(&files);
        let change_summary = match explicit_diff {
            Some(diff) if files_summary.is_empty() => diff
                .lines()
                .take(DIFF_SUMMARY_LINES)
                .collect::<Vec<_>>()
                .join("\n"),
            _ => files_summary.clone(),
        };

        let history = self.repo.recent_subjects(self.limits.history_count);
        let examples = self.style_examples.as_deref().unwrap_or(&history);

        let diff_text = self.limits.include_diff.then(|| match explicit_diff {
            Some(diff) => diff.chars().take(self.limits.diff_chars).collect(),
            None => self.repo.staged_diff(self.limits.diff_chars),
        });

        let builder = PromptBuilder::new(self.limits.max_examples, self.limits.max_context_tokens);
        let prompt = builder.build_within_budget(
            examples,
            &change_summary,
            &files_summary,
            diff_text.as_deref(),
            candidate_count,
            |text| self.generator.count_tokens(text),
        );

        log::trace!("Prompt:\n{}", prompt.text);
        log::debug!("Prompt token estimate: {}", prompt.tokens);

        let mut raw_outputs = Vec::with_capacity(candidate_count);
        let mut failed_slots = 0;
        for slot in 0..candidate_count {
            if self.cancel.is_cancelled() {
                log::info!("Cancelled after {slot} completion(s), selecting from what we have");
                break;
            }

            let params = self.params_for_slot(slot);
            let out = match self.generator.generate(&prompt.text, &params) {
                Ok(text) => text,
                Err(e) => {
                    log::warn!("Generation slot {slot} failed: {e:#}");
                    failed_slots += 1;
                    String::new()
                }
            };
            log::trace!("Raw output {slot}:\n{}", truncate_for_log(&out, 2000));
            raw_outputs.push(out);
        }

        let candidates = dedupe(
            raw_outputs
                .iter()
                .filter(|out| !out.trim().is_empty())
                .flat_map(|out| extract(out, self.limits.max_commit_length))
                .collect(),
        );
        let skipped_slots = candidate_count - raw_outputs.len();
        log::debug!("Cleaned candidates: {candidates:?}");

        let (message, origin) = match rank(&candidates, &history, &files.join("\n")) {
            Some(best) => (best.to_string(), Origin::Model),
            None => {
                log::info!("No usable candidates, using rule-based fallback");
                (
                    fallback_message(&files, self.limits.max_commit_length),
                    Origin::Fallback,
                )
            }
        };
        log::info!("Selected: {message}");

        Ok(Suggestion::Selected(Selection {
            message,
            origin,
            candidates,
            failed_slots,
            skipped_slots,
            prompt_shrunk: prompt.shrunk,
        }))
    }

    /// The first slot decodes greedily; the rest sample for variety.
    fn params_for_slot(&self, slot: usize) -> SamplingParams {
        let decoding = if slot == 0 {
            Decoding::Deterministic
        } else {
            Decoding::Sampled {
                temperature: self.limits.temperature,
                top_p: self.limits.top_p,
            }
        };
        SamplingParams {
            max_new_tokens: self.limits.max_new_tokens,
            decoding,
        }
    }
}
