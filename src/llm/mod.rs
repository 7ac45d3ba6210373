pub mod ollama;
pub mod openai;
pub mod prompt_builder;
pub mod prompts;
pub mod tokens;

use anyhow::{Result, anyhow};

/// How a single completion is decoded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Decoding {
    /// Greedy decoding; the same prompt always yields the same text.
    Deterministic,
    Sampled { temperature: f32, top_p: f32 },
}

/// Parameters for one completion request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingParams {
    pub max_new_tokens: u32,
    pub decoding: Decoding,
}

/// A text-generation backend.
///
/// Implementations are built once by the composition root and reused for
/// every completion in a run. Any call may fail; callers treat a failure as
/// an empty completion.
pub trait Generator {
    /// Produce a continuation of `prompt`.
    fn generate(&self, prompt: &str, params: &SamplingParams) -> Result<String>;

    /// Estimated token count of `text`, for prompt budget checks.
    fn count_tokens(&self, text: &str) -> usize {
        tokens::estimate_tokens(text)
    }

    /// Short human-readable backend description for logs.
    fn describe(&self) -> String;

    /// Release backend resources. Called once when the client is no longer needed.
    fn shutdown(&self) -> Result<()> {
        Ok(())
    }
}

/// Stand-in used when no model is configured or the backend could not be set up.
/// Every call fails, which sends the pipeline to its rule-based fallback.
pub struct UnavailableGenerator {
    reason: String,
}

impl UnavailableGenerator {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl Generator for UnavailableGenerator {
    fn generate(&self, _prompt: &str, _params: &SamplingParams) -> Result<String> {
        Err(anyhow!("generation backend unavailable: {}", self.reason))
    }

    fn describe(&self) -> String {
        format!("unavailable ({})", self.reason)
    }
}

/// Truncate long strings for debug logging.
pub fn truncate_for_log(s: &str, max_chars: usize) -> String {
    let total = s.chars().count();
    if total <= max_chars {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_chars).collect();
        format!("{head}...\n[truncated {} chars]", total - max_chars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unavailable_always_fails() {
        let g = UnavailableGenerator::new("no model");
        let params = SamplingParams {
            max_new_tokens: 10,
            decoding: Decoding::Deterministic,
        };
        let err = g.generate("prompt", &params).unwrap_err();
        assert!(err.to_string().contains("no model"));
        assert!(g.shutdown().is_ok());
    }

    #[test]
    fn truncate_for_log_marks_cut() {
        assert_eq!(truncate_for_log("short", 10), "short");
        let cut = truncate_for_log("abcdefghij", 4);
        assert!(cut.starts_with("abcd..."));
        assert!(cut.ends_with("[truncated 6 chars]"));
    }
}
