use anyhow::{Context, Result, anyhow};
use musli::json;
use musli::{Decode, Encode};
use reqwest::blocking::Client;
use std::time::Duration;

use super::{Decoding, Generator, SamplingParams, truncate_for_log};

#[derive(Debug, Encode)]
struct GenerateOptions {
    temperature: f32,
    top_p: f32,
    num_predict: u32,
}

#[derive(Debug, Encode)]
struct GenerateRequest {
    model: String,
    prompt: String,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Decode)]
struct GenerateResponse {
    response: String,
}

#[derive(Debug, Encode)]
struct UnloadRequest {
    model: String,
    keep_alive: u32,
}

/// Synchronous Ollama client using /api/generate.
pub struct OllamaGenerator {
    http: Client,
    base_url: String,
    model: String,
    unload_on_shutdown: bool,
}

impl OllamaGenerator {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
        unload_on_shutdown: bool,
    ) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client for Ollama")?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            unload_on_shutdown,
        })
    }

    fn generate_url(&self) -> String {
        format!("{}/api/generate", self.base_url)
    }

    fn post(&self, body: String) -> Result<reqwest::blocking::Response> {
        let url = self.generate_url();
        self.http
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .map_err(|e| anyhow!("Error calling Ollama at {url}: {e}"))?
            .error_for_status()
            .map_err(|e| anyhow!("Ollama HTTP error from {url}: {e}"))
    }
}

fn options_for(params: &SamplingParams) -> GenerateOptions {
    match params.decoding {
        Decoding::Deterministic => GenerateOptions {
            temperature: 0.0,
            top_p: 1.0,
            num_predict: params.max_new_tokens,
        },
        Decoding::Sampled { temperature, top_p } => GenerateOptions {
            temperature,
            top_p,
            num_predict: params.max_new_tokens,
        },
    }
}

impl Generator for OllamaGenerator {
    fn generate(&self, prompt: &str, params: &SamplingParams) -> Result<String> {
        let req_body = GenerateRequest {
            model: self.model.clone(),
            prompt: prompt.to_string(),
            stream: false,
            options: options_for(params),
        };

        let body_str = json::to_string(&req_body)
            .map_err(|e| anyhow!("Failed to encode Ollama JSON request: {e}"))?;

        log::trace!("Ollama request body: {}", truncate_for_log(&body_str, 4000));

        let resp_text = self
            .post(body_str)?
            .text()
            .map_err(|e| anyhow!("Failed to read Ollama response body: {e}"))?;

        log::trace!("Ollama raw JSON response: {resp_text}");

        let parsed: GenerateResponse =
            json::from_str(&resp_text).map_err(|e| anyhow!("Failed to decode Ollama JSON: {e}"))?;

        Ok(parsed.response)
    }

    fn describe(&self) -> String {
        format!("ollama {} at {}", self.model, self.base_url)
    }

    /// Ask Ollama to unload the model right away instead of keeping it warm.
    fn shutdown(&self) -> Result<()> {
        if !self.unload_on_shutdown {
            return Ok(());
        }

        let body = json::to_string(&UnloadRequest {
            model: self.model.clone(),
            keep_alive: 0,
        })
        .map_err(|e| anyhow!("Failed to encode Ollama unload request: {e}"))?;

        log::info!("Unloading Ollama model {:?}", self.model);
        self.post(body)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic_requests_zero_temperature() {
        let opts = options_for(&SamplingParams {
            max_new_tokens: 120,
            decoding: Decoding::Deterministic,
        });
        assert_eq!(opts.temperature, 0.0);
        assert_eq!(opts.top_p, 1.0);
        assert_eq!(opts.num_predict, 120);
    }

    #[test]
    fn sampled_requests_pass_through() {
        let opts = options_for(&SamplingParams {
            max_new_tokens: 60,
            decoding: Decoding::Sampled {
                temperature: 0.6,
                top_p: 0.9,
            },
        });
        assert_eq!(opts.temperature, 0.6);
        assert_eq!(opts.top_p, 0.9);
        assert_eq!(opts.num_predict, 60);
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let g = OllamaGenerator::new(
            "http://localhost:11434/",
            "qwen2.5-coder",
            Duration::from_secs(5),
            false,
        )
        .unwrap();
        assert_eq!(g.generate_url(), "http://localhost:11434/api/generate");
        assert!(g.shutdown().is_ok());
    }
}
