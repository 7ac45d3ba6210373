mod cli_args;
mod compose;
mod config;
mod git;
mod llm;
mod logging;
mod setup;
mod suggest;

use anyhow::{Context, Result, bail};
use clap::Parser;
use colored::{ColoredString, Colorize};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::io::{self, Read};
use std::path::Path;
use std::thread;
use std::time::Duration;

use crate::cli_args::{Cli, Command, GenerationArgs, SuggestArgs};
use crate::compose::{Composition, build_message};
use crate::config::Config;
use crate::git::{GitRepo, RepoContext, RepoStatus};
use crate::llm::Generator;
use crate::suggest::tag::CommitType;
use crate::suggest::{CancelToken, Origin, Suggester, Suggestion};

const NOTHING_TO_COMMIT: &str = "No staged changes to commit.";

/// Read a diff from a file, or from stdin when the path is `-`.
fn read_diff_file(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read diff from stdin")?;
        Ok(buf)
    } else {
        fs::read_to_string(path).with_context(|| format!("failed to read diff file {:?}", path))
    }
}

/// Run the suggestion pipeline behind a spinner, honoring `--time-budget`.
fn generate_suggestion(
    cfg: &Config,
    repo: &GitRepo,
    generator: &dyn Generator,
    args: &GenerationArgs,
    explicit_diff: Option<&str>,
) -> Result<Suggestion> {
    let mut limits = cfg.limits;
    limits.include_diff |= args.include_diff;
    let candidates = args
        .candidates
        .map(|c| c as usize)
        .unwrap_or(cfg.candidates);

    let cancel = CancelToken::new();
    if let Some(secs) = args.time_budget {
        let deadline = cancel.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_secs(secs));
            log::info!("Time budget of {secs}s used up");
            deadline.cancel();
        });
    }

    let suggester = Suggester::new(repo, generator, limits)
        .with_style_examples(cfg.style_examples())
        .with_cancel_token(cancel);

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "✓"])
            .template("{spinner} {msg}")?,
    );
    spinner.set_message(format!("asking {} for suggestions...", generator.describe()));
    spinner.enable_steady_tick(Duration::from_millis(120));

    let result = suggester.suggest(explicit_diff, candidates);
    spinner.finish_and_clear();

    if let Ok(Suggestion::Selected(sel)) = &result {
        if sel.failed_slots > 0 {
            log::info!("{} of {candidates} completions failed", sel.failed_slots);
        }
        if sel.skipped_slots > 0 {
            log::info!("{} completions skipped by the time budget", sel.skipped_slots);
        }
        if sel.prompt_shrunk {
            log::info!("Prompt was shortened to fit the context budget");
        }
    }
    result
}

fn shutdown(generator: &dyn Generator) {
    if let Err(e) = generator.shutdown() {
        log::warn!("Backend shutdown failed: {e:#}");
    }
}

fn run_suggest(cfg: &Config, repo: &GitRepo, args: &SuggestArgs) -> Result<()> {
    let explicit_diff = args.diff_file.as_deref().map(read_diff_file).transpose()?;

    let generator = setup::build_generator(cfg);
    let result = generate_suggestion(
        cfg,
        repo,
        generator.as_ref(),
        &args.generation,
        explicit_diff.as_deref(),
    );
    shutdown(generator.as_ref());

    let selection = match result? {
        Suggestion::NothingToCommit => {
            println!("{NOTHING_TO_COMMIT}");
            return Ok(());
        }
        Suggestion::Selected(sel) => sel,
    };

    println!("{}", selection.message);

    if args.show_candidates {
        println!();
        if selection.candidates.is_empty() {
            println!("{}", "(no usable model candidates)".bright_black());
        }
        for candidate in &selection.candidates {
            let marker = if *candidate == selection.message { "*" } else { " " };
            println!("{marker} {candidate}");
        }
        if selection.origin == Origin::Fallback {
            println!("{}", "(selected by fallback rules)".bright_black());
        }
    }

    if args.apply {
        let path = repo.write_commit_editmsg(&selection.message)?;
        eprintln!("{} {}", "Wrote".green(), path.display());
    }

    Ok(())
}

fn run_compose(
    cfg: &Config,
    repo: &GitRepo,
    commit_type: Option<&str>,
    scope: Option<&str>,
    breaking: bool,
    description: &[String],
) -> Result<()> {
    let commit_type = match commit_type {
        Some(word) => {
            if CommitType::lookup(word).is_none() {
                log::warn!("Unknown commit type '{word}', using '{}'", CommitType::DEFAULT);
            }
            CommitType::parse(word)
        }
        None => {
            let guessed = suggest::fallback::guess_type(&repo.staged_diff(cfg.limits.diff_chars));
            log::info!("No --type given, guessed '{guessed}' from the staged diff");
            guessed
        }
    };

    let description = description.join(" ");
    let message = build_message(&Composition {
        commit_type,
        scope,
        description: &description,
        breaking,
    })?;
    println!("{message}");
    Ok(())
}

fn run_commit(
    cfg: &Config,
    repo: &GitRepo,
    message: Option<&str>,
    all: bool,
    paths: &[String],
    generation: &GenerationArgs,
) -> Result<()> {
    if all || (paths.is_empty() && repo.changed_files().is_empty()) {
        repo.stage_all()?;
    } else {
        repo.stage_paths(paths)?;
    }

    if repo.changed_files().is_empty() {
        println!("{NOTHING_TO_COMMIT}");
        return Ok(());
    }

    let message = match message {
        Some(m) => m.trim().to_string(),
        None => {
            let generator = setup::build_generator(cfg);
            let result = generate_suggestion(cfg, repo, generator.as_ref(), generation, None);
            shutdown(generator.as_ref());
            match result? {
                Suggestion::Selected(sel) => sel.message,
                Suggestion::NothingToCommit => {
                    println!("{NOTHING_TO_COMMIT}");
                    return Ok(());
                }
            }
        }
    };

    if message.is_empty() {
        bail!("Commit message cannot be empty");
    }

    let output = repo.commit(&message).context("Commit failed")?;
    println!("{}", output.trim_end());
    Ok(())
}

fn run_status(repo: &GitRepo) -> Result<()> {
    let (light, label) = match repo.status() {
        RepoStatus::Clean => ("●".green(), "clean"),
        RepoStatus::Unstaged => ("●".truecolor(255, 165, 0), "unstaged changes"),
        RepoStatus::Staged => ("●".red(), "staged changes"),
        RepoStatus::NotARepository => {
            println!("{} not a git repository", "●".bright_black());
            return Ok(());
        }
    };

    let branch = repo.current_branch()?;
    println!("{light} {} ({label})", branch.bold());
    Ok(())
}

fn colored_subject(subject: &str, tag: Option<CommitType>) -> ColoredString {
    match tag {
        Some(CommitType::Feat) => subject.green(),
        Some(CommitType::Fix) => subject.red(),
        Some(CommitType::Docs) => subject.blue(),
        Some(CommitType::Refactor) => subject.cyan(),
        Some(CommitType::Test) => subject.magenta(),
        Some(CommitType::Perf) => subject.yellow(),
        Some(CommitType::Style) | Some(CommitType::Chore) => subject.white(),
        None => subject.normal(),
    }
}

fn run_history(repo: &GitRepo, count: usize) -> Result<()> {
    let entries = repo.history(count);
    if entries.is_empty() {
        println!("No commits found.");
        return Ok(());
    }
    for entry in entries {
        println!(
            "{} {}",
            entry.short_hash.bright_black(),
            colored_subject(&entry.subject, entry.tag)
        );
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logger(cli.verbose, cli.log_file.as_deref())?;

    let cfg = Config::from_sources(&cli)?;
    log::debug!("Resolved config: backend={:?} model={}", cfg.backend, cfg.model);

    let repo = GitRepo::new(&cli.repo);
    let command = cli
        .command
        .clone()
        .unwrap_or_else(|| Command::Suggest(SuggestArgs::default()));

    match &command {
        Command::Suggest(args) => run_suggest(&cfg, &repo, args),
        Command::Compose {
            commit_type,
            scope,
            breaking,
            description,
        } => run_compose(
            &cfg,
            &repo,
            commit_type.as_deref(),
            scope.as_deref(),
            *breaking,
            description,
        ),
        Command::Commit {
            message,
            all,
            paths,
            generation,
        } => run_commit(&cfg, &repo, message.as_deref(), *all, paths, generation),
        Command::Status => run_status(&repo),
        Command::History { count } => run_history(&repo, *count),
    }
}
