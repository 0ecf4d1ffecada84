use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;
use serde_json::json;

use crate::config::AiSection;
use crate::error::ProfilError;

pub const DEFAULT_ENDPOINT: &str = "https://api.anthropic.com/v1/messages";
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-6";
pub const API_VERSION: &str = "2023-06-01";

/// Seam for the structured-extraction and tailoring chat calls. Production
/// uses the HTTP messages API; tests substitute canned responses.
pub trait ChatBackend {
    fn chat(&self, system: &str, user: &str, max_tokens: u32) -> anyhow::Result<String>;
}

pub struct MessagesApiBackend {
    client: reqwest::blocking::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: String,
}

impl MessagesApiBackend {
    pub fn from_config(ai: &AiSection) -> anyhow::Result<Self> {
        let api_key = match ai.api_key.clone() {
            Some(k) if !k.is_empty() => k,
            _ => std::env::var("ANTHROPIC_API_KEY")
                .context("no API key: set ai.api_key in config or ANTHROPIC_API_KEY")?,
        };
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(ai.timeout_secs.unwrap_or(180)))
            .build()
            .context("build http client")?;
        Ok(Self {
            client,
            endpoint: ai
                .endpoint
                .clone()
                .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            api_key,
            model: ai.model.clone().unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        })
    }
}

impl ChatBackend for MessagesApiBackend {
    fn chat(&self, system: &str, user: &str, max_tokens: u32) -> anyhow::Result<String> {
        let body = json!({
            "model": self.model,
            "max_tokens": max_tokens,
            "system": system,
            "messages": [{"role": "user", "content": user}],
        });

        log::debug!("chat request: model={} max_tokens={max_tokens}", self.model);
        let resp = self
            .client
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .context("send chat request")?;

        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().unwrap_or_default();
            return Err(ProfilError::Collaborator(format!(
                "chat backend returned {status}: {detail}"
            ))
            .into());
        }

        let parsed: MessagesResponse = resp.json().context("decode chat response")?;
        let text = parsed
            .content
            .first()
            .map(|b| b.text.trim().to_string())
            .unwrap_or_default();
        if text.is_empty() {
            return Err(ProfilError::Collaborator("chat backend returned no text".into()).into());
        }
        Ok(text)
    }
}
