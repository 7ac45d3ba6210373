use super::{Decoding, Generator, SamplingParams, prompts, truncate_for_log};
use anyhow::{Context, Result, anyhow};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Minimal request/response structs for the Chat Completions API.
#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    top_p: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

/// OpenAI-compatible chat completions backend.
pub struct OpenAiGenerator {
    client: Client,
    api_key: String,
    model: String,
    api_base_url: String,
}

impl OpenAiGenerator {
    pub fn new(api_key: String, model: String, api_base_url: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client for OpenAI")?;

        Ok(OpenAiGenerator {
            client,
            api_key,
            model,
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
        })
    }

    fn chat_url(&self) -> String {
        if self.api_base_url.ends_with("/v1") {
            format!("{}/chat/completions", self.api_base_url)
        } else {
            format!("{}/v1/chat/completions", self.api_base_url)
        }
    }

    fn request_for(&self, prompt: &str, params: &SamplingParams) -> ChatRequest {
        let (temperature, top_p) = match params.decoding {
            Decoding::Deterministic => (0.0, 1.0),
            Decoding::Sampled { temperature, top_p } => (temperature, top_p),
        };

        ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".into(),
                    content: prompts::SYSTEM_INSTRUCTIONS.into(),
                },
                ChatMessage {
                    role: "user".into(),
                    content: prompt.into(),
                },
            ],
            temperature,
            top_p,
            max_tokens: params.max_new_tokens,
        }
    }
}

impl Generator for OpenAiGenerator {
    fn generate(&self, prompt: &str, params: &SamplingParams) -> Result<String> {
        let req = self.request_for(prompt, params);
        let url = self.chat_url();

        log::info!("Calling OpenAI model {:?}", &req.model);
        log::trace!("OpenAI prompt:\n{}", truncate_for_log(prompt, 3000));

        let resp = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .context("failed to send request to OpenAI")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().unwrap_or_default();
            return Err(anyhow!(
                "OpenAI API error: HTTP {} - {}",
                status.as_u16(),
                text
            ));
        }

        let chat_resp: ChatResponse = resp.json().context("failed to parse OpenAI response")?;
        let content = chat_resp
            .choices
            .first()
            .map(|c| c.message.content.clone().unwrap_or_default())
            .ok_or_else(|| anyhow!("no choices returned from OpenAI"))?;

        if let Some(usage) = &chat_resp.usage {
            log::debug!(
                "Token usage: prompt={}, completion={}, total={}",
                usage.prompt_tokens,
                usage.completion_tokens,
                usage.total_tokens
            );
        }

        Ok(content)
    }

    fn describe(&self) -> String {
        format!("openai {} at {}", self.model, self.api_base_url)
    }
}
