use crate::llm::prompts;

/// A prompt ready to send, with the token estimate it was checked against.
#[derive(Debug, Clone)]
pub struct BuiltPrompt {
    pub text: String,
    pub tokens: usize,
    /// True when the first draft was over budget and had to be rebuilt.
    pub shrunk: bool,
}

/// Assembles the candidate-generation prompt.
#[derive(Debug, Clone, Copy)]
pub struct PromptBuilder {
    pub max_examples: usize,
    pub max_context_tokens: usize,
}

impl PromptBuilder {
    pub fn new(max_examples: usize, max_context_tokens: usize) -> Self {
        Self {
            max_examples,
            max_context_tokens,
        }
    }

    /// Build the prompt text. Uses the last `max_examples` history lines as
    /// style examples, or a fixed default example when history is empty.
    pub fn build(
        &self,
        history: &[String],
        change_summary: &str,
        diff_text: Option<&str>,
        candidate_count: usize,
    ) -> String {
        let start = history.len().saturating_sub(self.max_examples);
        let examples = if history.is_empty() {
            prompts::DEFAULT_EXAMPLE.to_string()
        } else {
            history[start..].join("\n")
        };

        let mut prompt = format!(
            "Example commits:\n{examples}\n\n{rules}\n\n\
             Write {candidate_count} different Conventional Commit messages summarizing these changes:\n\
             {change_summary}\n",
            rules = prompts::RULES,
        );

        if let Some(diff) = diff_text.filter(|d| !d.trim().is_empty()) {
            prompt.push_str("\nDiff:\n");
            prompt.push_str(diff.trim_end());
            prompt.push('\n');
        }

        prompt.push('\n');
        prompt.push_str(prompts::MESSAGES_MARKER);
        prompt
    }

    /// Build the prompt and, if it is over the token ceiling, rebuild it once
    /// with only the most recent history line, the filenames-only summary and
    /// no diff. A summary that still does not fit is cut down until it does.
    pub fn build_within_budget<F>(
        &self,
        history: &[String],
        change_summary: &str,
        files_summary: &str,
        diff_text: Option<&str>,
        candidate_count: usize,
        count_tokens: F,
    ) -> BuiltPrompt
    where
        F: Fn(&str) -> usize,
    {
        let text = self.build(history, change_summary, diff_text, candidate_count);
        let tokens = count_tokens(&text);
        if tokens <= self.max_context_tokens {
            return BuiltPrompt {
                text,
                tokens,
                shrunk: false,
            };
        }

        log::debug!(
            "Prompt is {tokens} tokens (ceiling {}), rebuilding with reduced context",
            self.max_context_tokens
        );

        let mut recent = history.last().map(std::slice::from_ref).unwrap_or(&[]);
        if count_tokens(&self.build(recent, "", None, candidate_count)) > self.max_context_tokens {
            recent = &[];
        }
        let summary = if files_summary.is_empty() {
            change_summary
        } else {
            files_summary
        };

        let build_with = |summary: &str| self.build(recent, summary, None, candidate_count);
        let mut text = build_with(summary);
        let mut tokens = count_tokens(&text);

        if tokens > self.max_context_tokens {
            // Longest char prefix of the summary that still fits.
            let cuts: Vec<usize> = summary
                .char_indices()
                .map(|(i, _)| i)
                .chain(std::iter::once(summary.len()))
                .collect();
            let (mut lo, mut hi) = (0, cuts.len() - 1);
            while lo < hi {
                let mid = (lo + hi).div_ceil(2);
                if count_tokens(&build_with(&summary[..cuts[mid]])) <= self.max_context_tokens {
                    lo = mid;
                } else {
                    hi = mid - 1;
                }
            }
            let kept = summary[..cuts[lo]].trim_end();
            log::debug!(
                "Change summary cut from {} to {} chars to fit the budget",
                summary.chars().count(),
                kept.chars().count()
            );
            text = build_with(kept);
            tokens = count_tokens(&text);
        }

        if tokens > self.max_context_tokens {
            log::warn!(
                "Prompt scaffolding alone is {tokens} tokens, over the {} token ceiling",
                self.max_context_tokens
            );
        }

        BuiltPrompt {
            text,
            tokens,
            shrunk: true,
        }
    }
}
