//! `ChatAnthropic` - the vision-capable chat model built by the
//! `chatAnthropic` node.
//!
//! Wraps [`AnthropicClient`] and changes two things:
//!
//! - `invocation_params` drops `top_p`/`top_k` when they hold the client's
//!   `-1` "unset" marker, which the Messages API rejects.
//! - The model can be toggled to an image-capable sibling and back
//!   (see [`VisionState`]).

use async_trait::async_trait;

use crate::llms::base_llm::{BaseChatModel, CallOptions, InvocationParams, LLMMessage};
use crate::llms::providers::anthropic::{AnthropicClient, AnthropicInput, PROVIDER};
use crate::llms::vision::{MultiModalOption, VisionChatModel, VisionMode, VisionPolicy, VisionState};
use crate::nodes::error::NodeError;

/// Model switched to by [`ChatAnthropic::set_vision_model`].
pub const DEFAULT_IMAGE_MODEL: &str = "claude-3-5-haiku-latest";

/// Token budget for the vision model when none was configured.
pub const DEFAULT_IMAGE_MAX_TOKEN: u32 = 2048;

/// Anthropic models whose name starts with `claude-3` already accept images.
pub const VISION_POLICY: VisionPolicy = VisionPolicy {
    family_prefix: "claude-3",
    vision_model: DEFAULT_IMAGE_MODEL,
    fallback_max_tokens: DEFAULT_IMAGE_MAX_TOKEN,
};

const SAMPLING_SENTINEL_KEYS: [&str; 2] = ["top_p", "top_k"];

/// Remove sampling parameters holding the `-1` "unset" marker.
///
/// Only numeric `-1` is recognised; anything else passes through untouched.
pub fn strip_unset_sampling(params: &mut InvocationParams) {
    for key in SAMPLING_SENTINEL_KEYS {
        if params.get(key).and_then(|v| v.as_f64()) == Some(-1.0) {
            params.remove(key);
        }
    }
}

/// Anthropic chat model with vision toggling.
#[derive(Debug, Clone)]
pub struct ChatAnthropic {
    id: String,
    client: AnthropicClient,
    vision: VisionState,
}

impl ChatAnthropic {
    /// Build the client from `fields` and capture its model and token budget.
    pub fn new(
        id: impl Into<String>,
        fields: AnthropicInput,
        http: reqwest::Client,
    ) -> Result<Self, NodeError> {
        let client = AnthropicClient::new(fields, http)?;
        Ok(Self::from_client(id, client))
    }

    /// Wrap an existing client.
    pub fn from_client(id: impl Into<String>, client: AnthropicClient) -> Self {
        let vision = VisionState::capture(&client.model, client.max_tokens);
        Self {
            id: id.into(),
            client,
            vision,
        }
    }

    /// Node instance id this model was built for.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn client(&self) -> &AnthropicClient {
        &self.client
    }

    pub fn configured_model(&self) -> &str {
        self.vision.configured_model()
    }

    pub fn configured_max_tokens(&self) -> u32 {
        self.vision.configured_max_tokens()
    }
}

#[async_trait]
impl BaseChatModel for ChatAnthropic {
    fn model_name(&self) -> &str {
        &self.client.model
    }

    fn max_tokens(&self) -> u32 {
        self.client.max_tokens
    }

    fn provider(&self) -> &str {
        PROVIDER
    }

    fn invocation_params(&self, options: Option<&CallOptions>) -> InvocationParams {
        let mut params = self.client.invocation_params(options);
        strip_unset_sampling(&mut params);
        params
    }

    async fn invoke(
        &self,
        messages: Vec<LLMMessage>,
        options: Option<&CallOptions>,
    ) -> Result<String, NodeError> {
        let params = self.invocation_params(options);
        self.client.generate(params, &messages).await
    }
}

impl VisionChatModel for ChatAnthropic {
    fn set_vision_model(&mut self) {
        if self.vision.enter_vision(
            &VISION_POLICY,
            &mut self.client.model,
            &mut self.client.max_tokens,
        ) {
            log::debug!(
                "ChatAnthropic {} switched to vision model {}",
                self.id,
                self.client.model
            );
        }
    }

    fn revert_to_original_model(&mut self) {
        self.vision
            .revert(&mut self.client.model, &mut self.client.max_tokens);
    }

    fn set_multi_modal_option(&mut self, option: MultiModalOption) {
        self.vision.set_multi_modal_option(option);
    }

    fn multi_modal_option(&self) -> Option<&MultiModalOption> {
        self.vision.multi_modal_option()
    }

    fn vision_mode(&self) -> VisionMode {
        self.vision.mode()
    }
}
