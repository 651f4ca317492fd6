//! OpenAI Responses API client.

use super::{AgentError, CompletionClient};
use crate::config::{AgentConfig, PipelineConfig, OPENAI_API_KEY};
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct ResponsesBody {
    #[serde(default)]
    output: Vec<OutputItem>,
}

#[derive(Debug, Deserialize)]
struct OutputItem {
    #[serde(default)]
    content: Vec<ContentPart>,
}

#[derive(Debug, Deserialize)]
struct ContentPart {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

impl ResponsesBody {
    /// Concatenation of every `output_text` part.
    fn output_text(&self) -> String {
        self.output
            .iter()
            .flat_map(|item| item.content.iter())
            .filter(|part| part.kind == "output_text")
            .filter_map(|part| part.text.as_deref())
            .collect()
    }
}

pub struct OpenAiClient {
    client: Client,
    api_url: String,
    api_key: String,
}

impl OpenAiClient {
    pub fn new(config: &AgentConfig, api_key: String) -> Result<Self, AgentError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AgentError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    /// Build a client with `OPENAI_API_KEY` resolved through the config.
    pub fn from_config(config: &PipelineConfig) -> Result<Self, AgentError> {
        let key = config
            .secret(OPENAI_API_KEY)
            .map_err(|e| AgentError::Config(e.to_string()))?;
        Self::new(&config.agent, key)
    }
}

impl CompletionClient for OpenAiClient {
    fn complete(&self, model: &str, input: &str) -> Result<String, AgentError> {
        let url = format!("{}/responses", self.api_url);
        let payload = json!({ "model": model, "input": input });

        let resp = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .map_err(|e| AgentError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(AgentError::Api {
                status: status.as_u16(),
                body: body.chars().take(500).collect(),
            });
        }

        let body: ResponsesBody = resp
            .json()
            .map_err(|e| AgentError::Transport(format!("failed to decode response: {e}")))?;
        Ok(body.output_text())
    }
}
