//! Summary agent: prompts a language model and stores its JSON reply.
//!
//! Models are asked for a JSON array; the first element is the reply. Any
//! other output is turned into an error object with `ok: false` so callers
//! always get a JSON object back.

pub mod openai;

pub use openai::OpenAiClient;

use crate::analysis::{averages_for, AnalysisError};
use crate::store::tables::upsert_summary;
use crate::store::{StoreError, TableStore};
use serde_json::{json, Value as Json};
use thiserror::Error;

/// Characters of raw model output kept in the fallback error message.
const RAW_PREVIEW_CHARS: usize = 500;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("model request failed: {0}")]
    Transport(String),

    #[error("model API returned HTTP {status}: {body}")]
    Api { status: u16, body: String },

    #[error("agent not configured: {0}")]
    Config(String),

    #[error("no bars stored for {0}; run `load {0}` first")]
    NoData(String),

    #[error("model reply rejected: {0}")]
    Rejected(String),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Text-in, text-out access to a model.
pub trait CompletionClient {
    fn complete(&self, model: &str, input: &str) -> Result<String, AgentError>;
}

/// JSON object produced by [`Agent::run`].
#[derive(Debug, Clone, PartialEq)]
pub struct AgentReply(pub Json);

impl AgentReply {
    /// Truthy `ok` field.
    pub fn is_ok(&self) -> bool {
        self.0.get("ok").and_then(Json::as_bool).unwrap_or(false)
    }

    pub fn get(&self, key: &str) -> Option<&Json> {
        self.0.get(key)
    }

    fn fallback(reason: &str, raw: &str) -> Self {
        let preview: String = raw.chars().take(RAW_PREVIEW_CHARS).collect();
        AgentReply(json!({
            "date": chrono::Local::now().date_naive().to_string(),
            "ok": false,
            "status": 400,
            "error": format!("Model did not return valid JSON: {reason}. Raw: {preview}"),
        }))
    }
}

pub struct Agent {
    pub name: String,
    pub model: String,
    pub input: String,
}

impl Agent {
    pub fn new(name: impl Into<String>, input: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
            input: input.into(),
        }
    }

    pub fn run(&self, client: &dyn CompletionClient) -> Result<AgentReply, AgentError> {
        tracing::info!(agent = %self.name, model = %self.model, "requesting completion");
        let raw = client.complete(&self.model, &self.input)?;
        let reply = parse_reply(&raw);
        if !reply.is_ok() {
            tracing::warn!(agent = %self.name, "model reply was not usable JSON");
        }
        Ok(reply)
    }
}

/// First element of a JSON array, or the fallback error object.
pub fn parse_reply(raw: &str) -> AgentReply {
    match serde_json::from_str::<Json>(raw.trim()) {
        Ok(Json::Array(mut items)) if !items.is_empty() => AgentReply(items.swap_remove(0)),
        Ok(Json::Array(_)) => AgentReply::fallback("empty array", raw),
        Ok(other) => AgentReply::fallback(&format!("expected an array, got {}", kind(&other)), raw),
        Err(e) => AgentReply::fallback(&e.to_string(), raw),
    }
}

fn kind(v: &Json) -> &'static str {
    match v {
        Json::Null => "null",
        Json::Bool(_) => "a boolean",
        Json::Number(_) => "a number",
        Json::String(_) => "a string",
        Json::Array(_) => "an array",
        Json::Object(_) => "an object",
    }
}

fn summary_prompt(symbol: &str, bars: u64, avg_open: f64, avg_close: f64, avg_volume: f64) -> String {
    format!(
        "You are a JSON-only formatter.\n\
         Output MUST be valid JSON only. No markdown. No explanations. No extra text.\n\
         Output MUST be a JSON array of length 1.\n\n\
         Write a short market summary for {symbol} from these aggregates over {bars} bars:\n\
         average open {avg_open:.4}, average close {avg_close:.4}, average volume {avg_volume:.0}.\n\n\
         Use this format:\n\
         {{\"date\": \"YYYY-MM-DD\", \"ok\": true, \"status\": 200, \"symbol\": \"{symbol}\", \"summary\": string}}"
    )
}

/// Summarize one symbol's stored aggregates and upsert the text into
/// `stock_ai_summary`. Returns the stored text.
pub fn summarize_symbol(
    client: &dyn CompletionClient,
    store: &TableStore,
    symbol: &str,
    model: &str,
) -> Result<String, AgentError> {
    let averages = averages_for(store, symbol)?.ok_or_else(|| AgentError::NoData(symbol.to_string()))?;

    let agent = Agent::new(
        format!("summary-{symbol}"),
        summary_prompt(
            symbol,
            averages.bar_count,
            averages.avg_open,
            averages.avg_close,
            averages.avg_volume,
        ),
        model,
    );
    let reply = agent.run(client)?;
    if !reply.is_ok() {
        let reason = reply
            .get("error")
            .and_then(Json::as_str)
            .unwrap_or("reply not marked ok")
            .to_string();
        return Err(AgentError::Rejected(reason));
    }

    let text = match reply.get("summary").and_then(Json::as_str) {
        Some(s) => s.to_string(),
        None => reply.0.to_string(),
    };
    upsert_summary(store, symbol, &text)?;
    Ok(text)
}
