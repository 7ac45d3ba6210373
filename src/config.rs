use crate::cli_args::Cli;
use crate::suggest::Limits;
use anyhow::{Context, Result, bail};
use clap::ValueEnum;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Which generation backend to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Ollama,
    Openai,
    None,
}

impl BackendKind {
    fn default_model(&self) -> &'static str {
        match self {
            BackendKind::Ollama => "qwen2.5-coder:1.5b",
            BackendKind::Openai => "gpt-4o-mini",
            BackendKind::None => "none",
        }
    }

    fn default_base_url(&self) -> &'static str {
        match self {
            BackendKind::Ollama => "http://localhost:11434",
            BackendKind::Openai => "https://api.openai.com",
            BackendKind::None => "",
        }
    }
}

/// Final resolved configuration for commitcraft.
#[derive(Debug, Clone)]
pub struct Config {
    pub backend: BackendKind,
    pub model: String,
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
    pub candidates: usize,
    pub limits: Limits,
    pub examples_file: Option<PathBuf>,
    pub unload_on_exit: bool,
}

impl Config {
    /// Build the final config from CLI flags, environment, TOML file, and defaults.
    ///
    /// Precedence:
    ///   1. CLI flags (`--backend`, `--model`, `--base-url`, `--api-key`)
    ///   2. Env vars `COMMITCRAFT_BACKEND`, `COMMITCRAFT_MODEL`,
    ///      `COMMITCRAFT_BASE_URL`, `COMMITCRAFT_CANDIDATES`, `OPENAI_API_KEY`
    ///   3. TOML `~/.config/commitcraft.toml`
    ///   4. Hardcoded defaults
    pub fn from_sources(cli: &Cli) -> Result<Self> {
        let file_cfg = load_file_config().unwrap_or_default();
        resolve(cli, |key| env::var(key).ok(), file_cfg)
    }

    /// Seed examples from `examples_file`: the first 10 non-empty lines.
    /// An unreadable file is logged and treated as empty.
    pub fn style_examples(&self) -> Vec<String> {
        let Some(path) = &self.examples_file else {
            return Vec::new();
        };
        match fs::read_to_string(path) {
            Ok(data) => {
                let lines: Vec<String> = data
                    .lines()
                    .map(str::trim)
                    .filter(|l| !l.is_empty())
                    .take(10)
                    .map(str::to_string)
                    .collect();
                log::info!("Loaded {} seed examples from {:?}", lines.len(), path);
                lines
            }
            Err(e) => {
                log::warn!("Failed to read seed examples {:?}: {e}", path);
                Vec::new()
            }
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    backend: Option<BackendKind>,
    model: Option<String>,
    base_url: Option<String>,
    openai_api_key: Option<String>,
    timeout_secs: Option<u64>,
    candidates: Option<usize>,
    history_count: Option<usize>,
    max_examples: Option<usize>,
    max_context_tokens: Option<usize>,
    max_new_tokens: Option<u32>,
    max_commit_length: Option<usize>,
    temperature: Option<f32>,
    top_p: Option<f32>,
    include_diff: Option<bool>,
    diff_chars: Option<usize>,
    examples_file: Option<PathBuf>,
    unload_on_exit: Option<bool>,
}

fn resolve<E>(cli: &Cli, env_var: E, file_cfg: FileConfig) -> Result<Config>
where
    E: Fn(&str) -> Option<String>,
{
    let backend_env = env_var("COMMITCRAFT_BACKEND")
        .map(|v| BackendKind::from_str(&v, true).map_err(anyhow::Error::msg))
        .transpose()
        .context("invalid COMMITCRAFT_BACKEND")?;

    let model = cli
        .model
        .clone()
        .or_else(|| env_var("COMMITCRAFT_MODEL"))
        .or(file_cfg.model);

    let disabled = cli.no_model
        || model
            .as_deref()
            .is_some_and(|m| m.eq_ignore_ascii_case("none"));

    let backend = if disabled {
        BackendKind::None
    } else {
        cli.backend
            .or(backend_env)
            .or(file_cfg.backend)
            .unwrap_or(BackendKind::Ollama)
    };

    let model = model.unwrap_or_else(|| backend.default_model().to_string());
    let base_url = cli
        .base_url
        .clone()
        .or_else(|| env_var("COMMITCRAFT_BASE_URL"))
        .or(file_cfg.base_url)
        .unwrap_or_else(|| backend.default_base_url().to_string());
    let api_key = cli
        .api_key
        .clone()
        .or_else(|| env_var("OPENAI_API_KEY"))
        .or(file_cfg.openai_api_key);

    let candidates_env = env_var("COMMITCRAFT_CANDIDATES")
        .map(|v| v.trim().parse::<usize>())
        .transpose()
        .context("invalid COMMITCRAFT_CANDIDATES")?;
    let candidates = candidates_env.or(file_cfg.candidates).unwrap_or(3);

    let defaults = Limits::default();
    let limits = Limits {
        history_count: file_cfg.history_count.unwrap_or(defaults.history_count),
        max_examples: file_cfg.max_examples.unwrap_or(defaults.max_examples),
        max_context_tokens: file_cfg
            .max_context_tokens
            .unwrap_or(defaults.max_context_tokens),
        max_new_tokens: file_cfg.max_new_tokens.unwrap_or(defaults.max_new_tokens),
        max_commit_length: file_cfg
            .max_commit_length
            .unwrap_or(defaults.max_commit_length),
        temperature: file_cfg.temperature.unwrap_or(defaults.temperature),
        top_p: file_cfg.top_p.unwrap_or(defaults.top_p),
        include_diff: file_cfg.include_diff.unwrap_or(defaults.include_diff),
        diff_chars: file_cfg.diff_chars.unwrap_or(defaults.diff_chars),
    };

    if candidates == 0 {
        bail!("candidates must be at least 1");
    }
    if limits.max_commit_length < 20 {
        bail!(
            "max_commit_length must be at least 20, got {}",
            limits.max_commit_length
        );
    }
    if limits.max_context_tokens < 256 {
        bail!(
            "max_context_tokens must be at least 256, got {}",
            limits.max_context_tokens
        );
    }
    if !(limits.top_p > 0.0 && limits.top_p <= 1.0) {
        bail!("top_p must be in (0, 1], got {}", limits.top_p);
    }
    if limits.temperature < 0.0 {
        bail!("temperature must not be negative, got {}", limits.temperature);
    }

    Ok(Config {
        backend,
        model,
        base_url,
        api_key,
        timeout: Duration::from_secs(file_cfg.timeout_secs.unwrap_or(90)),
        candidates,
        limits,
        examples_file: file_cfg.examples_file,
        unload_on_exit: file_cfg.unload_on_exit.unwrap_or(false),
    })
}

/// Return `~/.config/commitcraft.toml`
fn config_path() -> Option<PathBuf> {
    let home = dirs::home_dir()?;
    Some(home.join(".config").join("commitcraft.toml"))
}

fn load_file_config() -> Option<FileConfig> {
    let path = config_path()?;
    if !path.exists() {
        return None;
    }
    parse_file_config(&path)
}

fn parse_file_config(path: &Path) -> Option<FileConfig> {
    let data = fs::read_to_string(path).ok()?;
    match toml::from_str::<FileConfig>(&data) {
        Ok(cfg) => Some(cfg),
        Err(e) => {
            log::warn!("Ignoring unparsable config {:?}: {e}", path);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::collections::HashMap;

    fn cli(args: &[&str]) -> Cli {
        let mut argv = vec!["commitcraft"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn file(toml_text: &str) -> FileConfig {
        toml::from_str(toml_text).unwrap()
    }

    #[test]
    fn defaults_without_any_source() {
        let cfg = resolve(&cli(&[]), no_env, FileConfig::default()).unwrap();
        assert_eq!(cfg.backend, BackendKind::Ollama);
        assert_eq!(cfg.model, "qwen2.5-coder:1.5b");
        assert_eq!(cfg.base_url, "http://localhost:11434");
        assert_eq!(cfg.candidates, 3);
        assert_eq!(cfg.limits, Limits::default());
        assert_eq!(cfg.timeout, Duration::from_secs(90));
    }

    #[test]
    fn cli_beats_env_beats_file() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("COMMITCRAFT_MODEL", "env-model"),
            ("COMMITCRAFT_BACKEND", "openai"),
        ]);
        let lookup = |k: &str| env.get(k).map(|v| v.to_string());
        let file_cfg = || file("model = \"file-model\"\nbackend = \"ollama\"\n");

        let cfg = resolve(&cli(&["--model", "cli-model"]), lookup, file_cfg()).unwrap();
        assert_eq!(cfg.model, "cli-model");
        assert_eq!(cfg.backend, BackendKind::Openai);
        assert_eq!(cfg.base_url, "https://api.openai.com");

        let cfg = resolve(&cli(&[]), lookup, file_cfg()).unwrap();
        assert_eq!(cfg.model, "env-model");

        let cfg = resolve(&cli(&[]), no_env, file_cfg()).unwrap();
        assert_eq!(cfg.model, "file-model");
        assert_eq!(cfg.backend, BackendKind::Ollama);
    }

    #[test]
    fn model_none_disables_backend() {
        let cfg = resolve(&cli(&["--model", "NONE"]), no_env, FileConfig::default()).unwrap();
        assert_eq!(cfg.backend, BackendKind::None);

        let cfg = resolve(&cli(&["--no-model"]), no_env, FileConfig::default()).unwrap();
        assert_eq!(cfg.backend, BackendKind::None);
    }

    #[test]
    fn file_limits_override_defaults() {
        let file_cfg = file(
            "max_context_tokens = 1000\nmax_commit_length = 72\ninclude_diff = true\ntemperature = 0.3\ncandidates = 5\n",
        );
        let cfg = resolve(&cli(&[]), no_env, file_cfg).unwrap();
        assert_eq!(cfg.limits.max_context_tokens, 1000);
        assert_eq!(cfg.limits.max_commit_length, 72);
        assert!(cfg.limits.include_diff);
        assert_eq!(cfg.limits.temperature, 0.3);
        assert_eq!(cfg.limits.history_count, 5);
        assert_eq!(cfg.candidates, 5);
    }

    #[test]
    fn rejects_bad_values() {
        let bad_len = file("max_commit_length = 5\n");
        assert!(resolve(&cli(&[]), no_env, bad_len).is_err());

        let tiny_budget = file("max_context_tokens = 50\n");
        assert!(resolve(&cli(&[]), no_env, tiny_budget).is_err());

        let bad_top_p = file("top_p = 1.5\n");
        assert!(resolve(&cli(&[]), no_env, bad_top_p).is_err());

        let bad_env = |k: &str| (k == "COMMITCRAFT_CANDIDATES").then(|| "many".to_string());
        assert!(resolve(&cli(&[]), bad_env, FileConfig::default()).is_err());

        let bad_backend = |k: &str| (k == "COMMITCRAFT_BACKEND").then(|| "llama".to_string());
        assert!(resolve(&cli(&[]), bad_backend, FileConfig::default()).is_err());
    }

    #[test]
    fn reads_seed_examples_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("commit_examples.txt");
        fs::write(&path, "feat: one\n\n  fix: two  \n").unwrap();

        let mut cfg = resolve(&cli(&[]), no_env, FileConfig::default()).unwrap();
        cfg.examples_file = Some(path);
        assert_eq!(cfg.style_examples(), vec!["feat: one", "fix: two"]);

        cfg.examples_file = Some(dir.path().join("missing.txt"));
        assert!(cfg.style_examples().is_empty());
    }

    #[test]
    fn unparsable_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("commitcraft.toml");
        fs::write(&path, "model = [unterminated").unwrap();
        assert!(parse_file_config(&path).is_none());
    }
}
