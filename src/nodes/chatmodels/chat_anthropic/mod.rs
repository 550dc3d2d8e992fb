//! The `chatAnthropic` node.

pub mod model;

use async_trait::async_trait;

use crate::credentials::{credential_data, credential_param};
use crate::llms::base_llm::CHAT_MODEL_BASE_CLASSES;
use crate::llms::providers::anthropic::AnthropicInput;
use crate::llms::vision::{MultiModalOption, VisionChatModel};
use crate::nodes::capability::CapabilityObject;
use crate::nodes::context::ExecutionContext;
use crate::nodes::descriptor::{CapabilityDescriptor, CredentialSpec, InputSpec, OptionChoice};
use crate::nodes::error::NodeError;
use crate::nodes::inputs::ResolvedInputs;
use crate::nodes::node::{Node, NodeData};

pub use model::{ChatAnthropic, DEFAULT_IMAGE_MAX_TOKEN, DEFAULT_IMAGE_MODEL};

/// Credential field holding the Anthropic API key.
pub const API_KEY_FIELD: &str = "anthropicApiKey";

const DEFAULT_MODEL_NAME: &str = "claude-3-haiku-20240307";

const MODEL_CHOICES: &[(&str, &str)] = &[
    ("claude-3-5-sonnet-latest", "Most intelligent Claude 3.5 model"),
    ("claude-3-5-haiku-latest", "Fastest Claude 3.5 model"),
    ("claude-3-opus-20240229", "Most powerful Claude 3 model"),
    ("claude-3-sonnet-20240229", "Balanced Claude 3 model"),
    ("claude-3-haiku-20240307", "Fastest Claude 3 model"),
    ("claude-2.1", "Claude 2 latest"),
    ("claude-instant-1.2", "Claude Instant latest"),
];

/// Node producing a [`ChatAnthropic`] chat model.
#[derive(Debug)]
pub struct ChatAnthropicNode {
    descriptor: CapabilityDescriptor,
}

impl Default for ChatAnthropicNode {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatAnthropicNode {
    pub fn new() -> Self {
        let models = MODEL_CHOICES
            .iter()
            .map(|(name, description)| OptionChoice::new(*name, *name).with_description(*description))
            .collect();

        let descriptor = CapabilityDescriptor::builder("chatAnthropic", "ChatAnthropic", "ChatAnthropic")
            .version(8.0)
            .icon("Anthropic.svg")
            .category("Chat Models")
            .description("Wrapper around ChatAnthropic large language models that use the Chat endpoint")
            .base_classes(std::iter::once("VisionChatModel").chain(CHAT_MODEL_BASE_CLASSES.iter().copied()))
            .credential(CredentialSpec::new(["anthropicApi"]))
            .input(
                InputSpec::options("modelName", "Model Name", models)
                    .with_default(DEFAULT_MODEL_NAME),
            )
            .input(
                InputSpec::number("temperature", "Temperature")
                    .with_default(0.9)
                    .optional(),
            )
            .input(InputSpec::number("maxTokensToSample", "Max Tokens").additional())
            .input(InputSpec::number("topP", "Top P").additional())
            .input(InputSpec::number("topK", "Top K").additional())
            .input(
                InputSpec::boolean("allowImageUploads", "Allow Image Uploads")
                    .with_default(false)
                    .optional()
                    .with_description(
                        "Allow image input. Models outside the claude-3 family switch to a vision-capable model when images are sent",
                    ),
            )
            .build();

        Self { descriptor }
    }
}

fn positive_u32(name: &str, value: Option<i64>) -> Result<Option<u32>, NodeError> {
    match value {
        None => Ok(None),
        Some(v) if v > 0 => u32::try_from(v)
            .map(Some)
            .map_err(|_| NodeError::configuration(format!("Input '{}' is too large", name))),
        Some(v) => Err(NodeError::configuration(format!(
            "Input '{}' must be positive, got {}",
            name, v
        ))),
    }
}

#[async_trait]
impl Node for ChatAnthropicNode {
    fn descriptor(&self) -> &CapabilityDescriptor {
        &self.descriptor
    }

    async fn init(
        &self,
        node_data: &NodeData,
        flow_execution_id: &str,
        ctx: &ExecutionContext,
    ) -> Result<CapabilityObject, NodeError> {
        let inputs = ResolvedInputs::read(&self.descriptor, node_data)?;

        let model_name = inputs.option("modelName")?;
        let temperature = inputs.number("temperature")?;
        let max_tokens = positive_u32("maxTokensToSample", inputs.integer("maxTokensToSample")?)?;
        let top_p = inputs.number("topP")?;
        let top_k = inputs.integer("topK")?;
        let allow_image_uploads = inputs.boolean("allowImageUploads")?.unwrap_or(false);

        let accepted = self
            .descriptor
            .credential()
            .map(|c| c.credential_names.clone())
            .unwrap_or_default();
        let data = credential_data(node_data, &accepted, ctx).await?;
        let api_key = credential_param(API_KEY_FIELD, &data, node_data)?;

        let fields = AnthropicInput {
            model_name,
            api_key: Some(api_key),
            base_url: Some(ctx.config().anthropic_base_url.clone()),
            temperature,
            max_tokens,
            top_p,
            top_k,
            max_retries: Some(ctx.config().max_retries),
            ..Default::default()
        };

        let mut model = ChatAnthropic::new(node_data.id.clone(), fields, ctx.http_client().clone())?;
        if allow_image_uploads {
            model.set_multi_modal_option(MultiModalOption::images(None));
        }

        log::debug!(
            "Initialized {} node {} (flow {}): model={}",
            self.descriptor.name(),
            node_data.id,
            flow_execution_id,
            model.configured_model()
        );

        Ok(CapabilityObject::ChatModel(Box::new(model)))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::credentials::{CredentialData, CredentialError, InMemoryCredentialStore};
    use crate::llms::base_llm::BaseChatModel;
    use crate::llms::vision::VisionMode;

    fn ctx() -> ExecutionContext {
        let store = InMemoryCredentialStore::new().with_credential(
            "cred-anthropic",
            "anthropicApi",
            CredentialData::new().with_field(API_KEY_FIELD, "sk-ant-secret"),
        );
        ExecutionContext::builder(Arc::new(store)).build()
    }

    #[test]
    fn test_descriptor() {
        let node = ChatAnthropicNode::new();
        let d = node.descriptor();
        assert!(d.validate().is_ok());
        assert_eq!(d.name(), "chatAnthropic");
        assert_eq!(d.category(), "Chat Models");
        let classes: Vec<&str> = d.base_classes().iter().collect();
        assert_eq!(
            classes,
            vec!["ChatAnthropic", "VisionChatModel", "BaseChatModel", "BaseLanguageModel", "Runnable"]
        );
        assert_eq!(d.credential().unwrap().credential_names, vec!["anthropicApi"]);
        let additional: Vec<&str> = d.additional_inputs().map(|i| i.name.as_str()).collect();
        assert_eq!(additional, vec!["maxTokensToSample", "topP", "topK"]);
    }

    #[test]
    fn test_descriptor_construction_is_deterministic() {
        assert_eq!(
            ChatAnthropicNode::new().descriptor(),
            ChatAnthropicNode::new().descriptor()
        );
    }

    #[tokio::test]
    async fn test_init_builds_chat_model() {
        let node = ChatAnthropicNode::new();
        let data = NodeData::new("chatAnthropic_0")
            .with_input("modelName", "claude-2.1")
            .with_input("maxTokensToSample", "1024")
            .with_input("allowImageUploads", true)
            .with_credential("cred-anthropic");

        let object = node.init(&data, "flow-1", &ctx()).await.unwrap();
        let model = object.as_chat_model().unwrap();
        assert_eq!(model.model_name(), "claude-2.1");
        assert_eq!(model.max_tokens(), 1024);
        assert_eq!(model.vision_mode(), VisionMode::TextMode);
        assert!(model.multi_modal_option().is_some_and(|o| o.allows_images()));
        assert!(!format!("{:?}", object).contains("sk-ant-secret"));
    }

    #[tokio::test]
    async fn test_init_uses_defaults() {
        let node = ChatAnthropicNode::new();
        let data = NodeData::new("chatAnthropic_0").with_credential("cred-anthropic");

        let object = node.init(&data, "flow-1", &ctx()).await.unwrap();
        let model = object.as_chat_model().unwrap();
        assert_eq!(model.model_name(), DEFAULT_MODEL_NAME);
        assert!(model.multi_modal_option().is_none());

        let params = model.invocation_params(None);
        assert_eq!(params["temperature"], 0.9);
        assert!(!params.contains_key("top_p"));
    }

    #[tokio::test]
    async fn test_init_returns_independent_objects() {
        let node = ChatAnthropicNode::new();
        let data = NodeData::new("chatAnthropic_0")
            .with_input("modelName", "claude-2.1")
            .with_credential("cred-anthropic");
        let ctx = ctx();

        let mut first = node.init(&data, "flow-1", &ctx).await.unwrap();
        let second = node.init(&data, "flow-1", &ctx).await.unwrap();

        first.as_chat_model_mut().unwrap().set_vision_model();
        assert_eq!(first.as_chat_model().unwrap().model_name(), DEFAULT_IMAGE_MODEL);
        assert_eq!(second.as_chat_model().unwrap().model_name(), "claude-2.1");
    }

    #[tokio::test]
    async fn test_init_without_credential_fails() {
        let node = ChatAnthropicNode::new();
        let err = node
            .init(&NodeData::new("chatAnthropic_0"), "flow-1", &ctx())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            NodeError::Credential(CredentialError::MissingReference { ref credential })
                if credential == API_KEY_FIELD
        ));
    }

    #[tokio::test]
    async fn test_init_rejects_unknown_model() {
        let node = ChatAnthropicNode::new();
        let data = NodeData::new("chatAnthropic_0")
            .with_input("modelName", "gpt-4")
            .with_credential("cred-anthropic");
        let err = node.init(&data, "flow-1", &ctx()).await.unwrap_err();
        assert!(matches!(err, NodeError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_init_rejects_non_positive_max_tokens() {
        let node = ChatAnthropicNode::new();
        let data = NodeData::new("chatAnthropic_0")
            .with_input("maxTokensToSample", 0)
            .with_credential("cred-anthropic");
        let err = node.init(&data, "flow-1", &ctx()).await.unwrap_err();
        assert!(err.to_string().contains("maxTokensToSample"));
    }
}
