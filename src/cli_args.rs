use clap::{ArgAction, ArgGroup, Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::BackendKind;

/// CLI options
#[derive(Parser, Debug)]
#[command(
    name = "commitcraft",
    version,
    about = "Conventional Commit message suggestions for your staged changes"
)]
#[command(group(
    ArgGroup::new("model_group")
        .args(["model", "no_model"])
        .multiple(false)
))]
pub struct Cli {
    /// Repository to work in
    #[arg(long, global = true, default_value = ".")]
    pub repo: PathBuf,

    /// Log verbosity: -v info, -vv debug, -vvv trace (prompts and raw model output)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Append logs to this file instead of printing them
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Generation backend
    #[arg(long, value_enum, global = true)]
    pub backend: Option<BackendKind>,

    /// Model name (e.g. qwen2.5-coder:1.5b or gpt-4o-mini). If 'none', acts like --no-model.
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Disable model calls; messages come from the rule-based fallback
    #[arg(long, global = true)]
    pub no_model: bool,

    /// Backend base URL
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// API key for the OpenAI backend
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true, global = true)]
    pub api_key: Option<String>,

    /// Subcommand; defaults to `suggest`
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Options shared by every command that generates a suggestion.
#[derive(Args, Debug, Clone, Default)]
pub struct GenerationArgs {
    /// Number of completions to request
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub candidates: Option<u32>,

    /// Add the staged diff to the prompt, not just file names
    #[arg(long)]
    pub include_diff: bool,

    /// Stop requesting completions after this many seconds
    #[arg(long, value_name = "SECS")]
    pub time_budget: Option<u64>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct SuggestArgs {
    #[command(flatten)]
    pub generation: GenerationArgs,

    /// Use this diff instead of the staged changes ('-' reads stdin)
    #[arg(long, value_name = "PATH")]
    pub diff_file: Option<PathBuf>,

    /// Also list every cleaned candidate
    #[arg(long)]
    pub show_candidates: bool,

    /// Write the message into .git/COMMIT_EDITMSG (no commit is created)
    #[arg(long)]
    pub apply: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Suggest a commit message for the staged changes
    Suggest(SuggestArgs),

    /// Build a Conventional Commit message by hand
    Compose {
        /// Commit type (feat, fix, docs, style, refactor, test, chore, perf);
        /// guessed from the staged diff when omitted
        #[arg(long = "type")]
        commit_type: Option<String>,

        /// Optional scope, e.g. api
        #[arg(long)]
        scope: Option<String>,

        /// Mark as a breaking change
        #[arg(long)]
        breaking: bool,

        /// Short description
        #[arg(required = true, num_args = 1..)]
        description: Vec<String>,
    },

    /// Stage changes and commit with a given or suggested message
    Commit {
        /// Commit message; suggested when omitted
        #[arg(short, long)]
        message: Option<String>,

        /// Stage all changes first
        #[arg(long, conflicts_with = "paths")]
        all: bool,

        /// Paths to stage before committing
        paths: Vec<String>,

        #[command(flatten)]
        generation: GenerationArgs,
    },

    /// Show the current branch and a status light
    Status,

    /// Show recent commit subjects
    History {
        /// Number of commits to show
        #[arg(short = 'n', long, default_value_t = 10)]
        count: usize,
    },
}
