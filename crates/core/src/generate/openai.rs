//! OpenAI-compatible chat-completions backend.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::GeneratorError;
use crate::types::Tier;

use super::parse::parse_candidates;
use super::prompt::{build_prompt, SYSTEM_PROMPT};
use super::WordGenerator;

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f32,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.5,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 60,
        }
    }
}

impl OpenAiConfig {
    /// Defaults overridden by `OPENAI_API_KEY`, `SILABARIO_OPENAI_MODEL` and
    /// `SILABARIO_OPENAI_BASE_URL`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.api_key = std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.trim().is_empty());
        if let Ok(model) = std::env::var("SILABARIO_OPENAI_MODEL") {
            config.model = model;
        }
        if let Ok(url) = std::env::var("SILABARIO_OPENAI_BASE_URL") {
            config.base_url = url;
        }
        config
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

/// Word generator backed by a chat-completions model.
pub struct OpenAiGenerator {
    config: OpenAiConfig,
    client: reqwest::blocking::Client,
}

impl OpenAiGenerator {
    pub fn new(config: OpenAiConfig) -> Result<Self, GeneratorError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { config, client })
    }
}

fn request_body(config: &OpenAiConfig, prompt: &str) -> serde_json::Value {
    json!({
        "model": config.model,
        "temperature": config.temperature,
        "messages": [
            { "role": "system", "content": SYSTEM_PROMPT },
            { "role": "user", "content": prompt },
        ],
    })
}

/// Assistant text of the first choice; empty when absent.
fn completion_text(value: &serde_json::Value) -> &str {
    value["choices"][0]["message"]["content"].as_str().unwrap_or("")
}

impl WordGenerator for OpenAiGenerator {
    fn name(&self) -> &str {
        "openai"
    }

    fn generate(
        &self,
        topic: &str,
        count: usize,
        tier: Tier,
        forbidden: &[String],
    ) -> Result<Vec<String>, GeneratorError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(GeneratorError::MissingApiKey)?;

        let prompt = build_prompt(topic, count, tier, forbidden);
        log::debug!("Requesting {} words from {} ({})", count, self.config.model, self.config.endpoint());

        let response = self
            .client
            .post(self.config.endpoint())
            .bearer_auth(api_key)
            .json(&request_body(&self.config, &prompt))
            .send()?;

        let status = response.status();
        let body = response.text()?;
        if !status.is_success() {
            return Err(GeneratorError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let value: serde_json::Value =
            serde_json::from_str(&body).map_err(|e| GeneratorError::Malformed(e.to_string()))?;
        Ok(parse_candidates(completion_text(&value)))
    }
}
