use log::{debug, warn};

use crate::config::{BackendKind, Config};
use crate::llm::ollama::OllamaGenerator;
use crate::llm::openai::OpenAiGenerator;
use crate::llm::{Generator, UnavailableGenerator};

/// Build the generation backend from the resolved config.
///
/// Never fails: a backend that cannot be set up becomes an
/// [`UnavailableGenerator`], and suggestions come from the fallback rules.
pub fn build_generator(cfg: &Config) -> Box<dyn Generator> {
    let generator: Box<dyn Generator> = match cfg.backend {
        BackendKind::None => Box::new(UnavailableGenerator::new("model disabled")),
        BackendKind::Ollama => {
            match OllamaGenerator::new(
                cfg.base_url.clone(),
                cfg.model.clone(),
                cfg.timeout,
                cfg.unload_on_exit,
            ) {
                Ok(g) => Box::new(g),
                Err(e) => {
                    warn!("Ollama backend unavailable: {e:#}");
                    Box::new(UnavailableGenerator::new("ollama setup failed"))
                }
            }
        }
        BackendKind::Openai => match &cfg.api_key {
            None => {
                warn!("OPENAI_API_KEY (or --api-key) is not set, using rule-based messages");
                Box::new(UnavailableGenerator::new("missing OpenAI API key"))
            }
            Some(key) => {
                match OpenAiGenerator::new(
                    key.clone(),
                    cfg.model.clone(),
                    cfg.base_url.clone(),
                    cfg.timeout,
                ) {
                    Ok(g) => Box::new(g),
                    Err(e) => {
                        warn!("OpenAI backend unavailable: {e:#}");
                        Box::new(UnavailableGenerator::new("openai setup failed"))
                    }
                }
            }
        },
    };

    debug!("Using generator: {}", generator.describe());
    generator
}
