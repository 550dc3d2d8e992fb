//! Base chat-model abstractions.
//!
//! Provides the trait every chat-model capability object implements, the
//! message and parameter shapes shared by providers, and the call-time
//! options that can override constructor settings for one request.

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::nodes::error::NodeError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Capability classes every chat model satisfies.
pub const CHAT_MODEL_BASE_CLASSES: &[&str] = &["BaseChatModel", "BaseLanguageModel", "Runnable"];

// ---------------------------------------------------------------------------
// Message and parameter shapes
// ---------------------------------------------------------------------------

/// A single message in a chat conversation.
///
/// Holds at least `role` and `content`; providers may read extra keys such
/// as `tool_calls` or `tool_call_id`.
pub type LLMMessage = HashMap<String, Value>;

/// Provider request parameters as assembled for one call.
pub type InvocationParams = Map<String, Value>;

/// Build a message with the given role and text content.
pub fn message(role: &str, content: impl Into<Value>) -> LLMMessage {
    let mut msg = HashMap::new();
    msg.insert("role".to_string(), Value::String(role.to_string()));
    msg.insert("content".to_string(), content.into());
    msg
}

/// Check that every message carries `role` and `content`.
pub fn validate_messages(messages: &[LLMMessage]) -> Result<(), NodeError> {
    for (i, msg) in messages.iter().enumerate() {
        if !msg.contains_key("role") || !msg.contains_key("content") {
            return Err(NodeError::configuration(format!(
                "Message at index {} must have 'role' and 'content' keys",
                i
            )));
        }
    }
    Ok(())
}

/// Per-call overrides of the model's configured parameters.
///
/// Anything set here wins over the constructor value for that one request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CallOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop: Option<Vec<String>>,
}

impl CallOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_top_p(mut self, top_p: f64) -> Self {
        self.top_p = Some(top_p);
        self
    }

    pub fn with_top_k(mut self, top_k: i64) -> Self {
        self.top_k = Some(top_k);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_stop(mut self, stop: Vec<String>) -> Self {
        self.stop = Some(stop);
        self
    }
}

// ---------------------------------------------------------------------------
// BaseChatModel trait
// ---------------------------------------------------------------------------

/// A live chat model produced by a chat-model node.
///
/// Provider and transport failures are returned as errors: the host wraps
/// model calls in its own error handling.
#[async_trait]
pub trait BaseChatModel: Send + Sync + fmt::Debug {
    /// The model identifier currently in use.
    fn model_name(&self) -> &str;

    /// The current response token budget.
    fn max_tokens(&self) -> u32;

    /// Provider name (e.g. "anthropic").
    fn provider(&self) -> &str;

    /// Parameters that will be sent for a call with `options`.
    fn invocation_params(&self, options: Option<&CallOptions>) -> InvocationParams;

    /// Send `messages` and return the assistant's text.
    async fn invoke(
        &self,
        messages: Vec<LLMMessage>,
        options: Option<&CallOptions>,
    ) -> Result<String, NodeError>;
}
