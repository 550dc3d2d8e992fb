//! Anthropic Messages API client.
//!
//! This is the general-purpose client the chat-model node composes with. It
//! follows the usual client-library convention of carrying `top_p` and
//! `top_k` as `-1` when the caller did not set them, and forwards whatever
//! [`AnthropicClient::invocation_params`] produces verbatim. Wrappers that
//! talk to the real API are expected to post-process those parameters (see
//! `nodes::chatmodels::chat_anthropic`).
//!
//! # Features
//!
//! - Messages API calls via `reqwest`
//! - Retry with exponential backoff on 429/529/5xx
//! - System message extraction from the message list
//! - Tool-result message conversion

use std::fmt;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;

use crate::config::{DEFAULT_ANTHROPIC_BASE_URL, DEFAULT_MAX_RETRIES};
use crate::credentials::CredentialError;
use crate::llms::base_llm::{validate_messages, CallOptions, InvocationParams, LLMMessage};
use crate::nodes::error::NodeError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Provider name used in errors and logs.
pub const PROVIDER: &str = "anthropic";

/// Anthropic API version header value.
pub const DEFAULT_ANTHROPIC_VERSION: &str = "2023-06-01";

/// Model used when none is configured.
pub const DEFAULT_MODEL: &str = "claude-3-5-sonnet-latest";

/// Response budget used when none is configured.
pub const DEFAULT_MAX_TOKENS: u32 = 2048;

/// Value of `top_p` meaning "not set".
pub const UNSET_TOP_P: f64 = -1.0;

/// Value of `top_k` meaning "not set".
pub const UNSET_TOP_K: i64 = -1;

/// Upper bound on the wait between two attempts, including server-sent
/// `retry-after` values.
pub const MAX_RETRY_DELAY: Duration = Duration::from_secs(60);

/// Wait requested by a `retry-after` header given in seconds, capped at
/// [`MAX_RETRY_DELAY`].
fn retry_after_delay(value: &str) -> Option<Duration> {
    value
        .trim()
        .parse::<u64>()
        .ok()
        .map(|secs| Duration::from_secs(secs).min(MAX_RETRY_DELAY))
}

/// Exponential backoff step, capped at [`MAX_RETRY_DELAY`].
fn next_backoff(delay: Duration) -> Duration {
    delay.saturating_mul(2).min(MAX_RETRY_DELAY)
}

// ---------------------------------------------------------------------------
// AnthropicInput
// ---------------------------------------------------------------------------

/// Constructor fields for [`AnthropicClient`]. Unset fields take defaults.
#[derive(Debug, Clone, Default)]
pub struct AnthropicInput {
    pub model_name: Option<String>,
    pub api_key: Option<SecretString>,
    pub base_url: Option<String>,
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
    pub top_p: Option<f64>,
    pub top_k: Option<i64>,
    pub stop_sequences: Vec<String>,
    pub max_retries: Option<u32>,
}

// ---------------------------------------------------------------------------
// AnthropicClient
// ---------------------------------------------------------------------------

/// Client for `POST /v1/messages`.
///
/// `model` and `max_tokens` are public so callers can retarget a live client.
#[derive(Clone)]
pub struct AnthropicClient {
    /// Model identifier sent with every request.
    pub model: String,
    /// Maximum tokens in the response (required by the API).
    pub max_tokens: u32,
    pub temperature: Option<f64>,
    /// Nucleus sampling; [`UNSET_TOP_P`] when not configured.
    pub top_p: f64,
    /// Top-k sampling; [`UNSET_TOP_K`] when not configured.
    pub top_k: i64,
    pub stop_sequences: Vec<String>,
    pub anthropic_version: String,
    pub max_retries: u32,
    api_key: SecretString,
    base_url: String,
    http: reqwest::Client,
}

impl fmt::Debug for AnthropicClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnthropicClient")
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("top_p", &self.top_p)
            .field("top_k", &self.top_k)
            .field("base_url", &self.base_url)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

impl AnthropicClient {
    /// Create a client. Fails when no API key is supplied.
    pub fn new(fields: AnthropicInput, http: reqwest::Client) -> Result<Self, NodeError> {
        let api_key = fields.api_key.ok_or_else(|| CredentialError::MissingField {
            field: "anthropicApiKey".to_string(),
        })?;

        let model = fields
            .model_name
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        Ok(Self {
            model,
            max_tokens: fields.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            temperature: fields.temperature,
            top_p: fields.top_p.unwrap_or(UNSET_TOP_P),
            top_k: fields.top_k.unwrap_or(UNSET_TOP_K),
            stop_sequences: fields.stop_sequences,
            anthropic_version: DEFAULT_ANTHROPIC_VERSION.to_string(),
            max_retries: fields.max_retries.unwrap_or(DEFAULT_MAX_RETRIES),
            api_key,
            base_url: fields
                .base_url
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_ANTHROPIC_BASE_URL.to_string()),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Assemble request parameters, letting `options` override the
    /// configured values for this call.
    pub fn invocation_params(&self, options: Option<&CallOptions>) -> InvocationParams {
        let defaults = CallOptions::default();
        let options = options.unwrap_or(&defaults);

        let mut params = InvocationParams::new();
        params.insert("model".to_string(), Value::String(self.model.clone()));
        params.insert(
            "max_tokens".to_string(),
            serde_json::json!(options.max_tokens.unwrap_or(self.max_tokens)),
        );
        if let Some(temperature) = options.temperature.or(self.temperature) {
            params.insert("temperature".to_string(), serde_json::json!(temperature));
        }
        params.insert(
            "top_k".to_string(),
            serde_json::json!(options.top_k.unwrap_or(self.top_k)),
        );
        params.insert(
            "top_p".to_string(),
            serde_json::json!(options.top_p.unwrap_or(self.top_p)),
        );

        let stop = options.stop.as_ref().unwrap_or(&self.stop_sequences);
        if !stop.is_empty() {
            params.insert("stop_sequences".to_string(), serde_json::json!(stop));
        }
        params
    }

    /// Split system messages out of the conversation.
    ///
    /// Anthropic takes the system prompt as a separate `system` parameter.
    /// Multiple system messages are joined with blank lines. `tool` messages
    /// become `tool_result` blocks on a user turn.
    pub fn format_messages(&self, messages: &[LLMMessage]) -> (Option<String>, Vec<Value>) {
        let mut system_parts: Vec<String> = Vec::new();
        let mut formatted: Vec<Value> = Vec::new();

        for msg in messages {
            let role = msg.get("role").and_then(Value::as_str).unwrap_or("user");
            let content = msg
                .get("content")
                .cloned()
                .unwrap_or(Value::String(String::new()));

            match role {
                "system" => {
                    if let Some(text) = content.as_str() {
                        system_parts.push(text.to_string());
                    } else if let Some(blocks) = content.as_array() {
                        system_parts.extend(
                            blocks
                                .iter()
                                .filter_map(|b| b.get("text").and_then(Value::as_str))
                                .map(str::to_string),
                        );
                    }
                }
                "tool" => {
                    let tool_call_id = msg
                        .get("tool_call_id")
                        .and_then(Value::as_str)
                        .unwrap_or("");
                    formatted.push(serde_json::json!({
                        "role": "user",
                        "content": [{
                            "type": "tool_result",
                            "tool_use_id": tool_call_id,
                            "content": content.as_str().unwrap_or(""),
                        }]
                    }));
                }
                _ => formatted.push(serde_json::json!({
                    "role": role,
                    "content": content,
                })),
            }
        }

        let system = if system_parts.is_empty() {
            None
        } else {
            Some(system_parts.join("\n\n"))
        };
        (system, formatted)
    }

    /// Build the JSON body from already-assembled parameters.
    pub fn build_request_body(&self, params: InvocationParams, messages: &[LLMMessage]) -> Value {
        let (system, formatted) = self.format_messages(messages);
        let mut body = params;
        body.insert("messages".to_string(), Value::Array(formatted));
        if let Some(system) = system {
            body.insert("system".to_string(), Value::String(system));
        }
        Value::Object(body)
    }

    /// Concatenate the `text` blocks of a Messages API response.
    pub fn parse_response(response: &Value) -> Result<String, NodeError> {
        let content = response
            .get("content")
            .and_then(Value::as_array)
            .ok_or_else(|| NodeError::provider(PROVIDER, "No content array in response"))?;

        let mut text = String::new();
        for block in content {
            match block.get("type").and_then(Value::as_str).unwrap_or("") {
                "text" => {
                    if let Some(t) = block.get("text").and_then(Value::as_str) {
                        text.push_str(t);
                    }
                }
                other => log::debug!("Skipping Anthropic content block of type {}", other),
            }
        }

        if let Some(usage) = response.get("usage") {
            log::debug!(
                "Anthropic token usage: input={}, output={}",
                usage.get("input_tokens").and_then(Value::as_i64).unwrap_or(0),
                usage.get("output_tokens").and_then(Value::as_i64).unwrap_or(0),
            );
        }
        Ok(text)
    }

    fn error_message(body: &str) -> String {
        serde_json::from_str::<Value>(body)
            .ok()
            .and_then(|v| {
                v.get("error")
                    .and_then(|e| e.get("message"))
                    .and_then(Value::as_str)
                    .map(str::to_string)
            })
            .unwrap_or_else(|| body.chars().take(500).collect())
    }

    /// Send one request with the given parameters.
    ///
    /// The parameters are sent exactly as given.
    pub async fn generate(
        &self,
        params: InvocationParams,
        messages: &[LLMMessage],
    ) -> Result<String, NodeError> {
        validate_messages(messages)?;
        let body = self.build_request_body(params, messages);
        let endpoint = format!("{}/v1/messages", self.base_url);

        log::debug!(
            "Anthropic request: model={}, messages={}",
            self.model,
            messages.len()
        );

        let mut last_error = NodeError::Transport("anthropic call failed after all retries".to_string());
        let mut retry_delay = Duration::from_secs(1);

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                log::warn!(
                    "Anthropic API retry attempt {} after {:?}",
                    attempt,
                    retry_delay
                );
                tokio::time::sleep(retry_delay).await;
                retry_delay = next_backoff(retry_delay);
            }

            let response = match self
                .http
                .post(&endpoint)
                .header("content-type", "application/json")
                .header("x-api-key", self.api_key.expose_secret())
                .header("anthropic-version", &self.anthropic_version)
                .json(&body)
                .send()
                .await
            {
                Ok(resp) => resp,
                Err(e) => {
                    last_error = e.into();
                    continue;
                }
            };

            let status = response.status();

            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                if let Some(retry_after) = response
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(retry_after_delay)
                {
                    retry_delay = retry_after;
                }
                last_error = NodeError::Transport("anthropic rate limited (429)".to_string());
                continue;
            }

            if status.as_u16() == 529 || status.is_server_error() {
                last_error = NodeError::Transport(format!("anthropic server error ({})", status));
                continue;
            }

            let text = match response.text().await {
                Ok(text) => text,
                Err(e) => {
                    last_error = e.into();
                    continue;
                }
            };

            if status.is_client_error() {
                return Err(NodeError::provider(
                    PROVIDER,
                    format!("{} ({})", Self::error_message(&text), status),
                ));
            }

            let json: Value = serde_json::from_str(&text).map_err(|e| {
                NodeError::provider(PROVIDER, format!("failed to parse response: {}", e))
            })?;

            if json.get("type").and_then(Value::as_str) == Some("error") {
                return Err(NodeError::provider(PROVIDER, Self::error_message(&text)));
            }

            return Self::parse_response(&json);
        }

        Err(last_error)
    }

    /// Assemble parameters for `options` and send.
    pub async fn invoke(
        &self,
        messages: &[LLMMessage],
        options: Option<&CallOptions>,
    ) -> Result<String, NodeError> {
        self.generate(self.invocation_params(options), messages)
            .await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
