//! The `openAIImageGen` node: a tool that generates an image from a text
//! prompt through the OpenAI Images API.
//!
//! The produced tool never fails once its arguments validate. Every outcome
//! is a string the calling agent can read:
//!
//! | Outcome | Result |
//! |---------|--------|
//! | image URL returned | `Image generated successfully! View it here: <url>` |
//! | `error` object in the body | `Error generating image: <message>` |
//! | no image data / unreadable body | `Failed to generate image: <reason>` |
//! | request could not be sent | `Image generation request failed: <error>` |

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;

use crate::credentials::{credential_data, credential_param};
use crate::nodes::capability::CapabilityObject;
use crate::nodes::context::ExecutionContext;
use crate::nodes::descriptor::{CapabilityDescriptor, CredentialSpec, InputSpec, OptionChoice};
use crate::nodes::error::NodeError;
use crate::nodes::inputs::ResolvedInputs;
use crate::nodes::node::{Node, NodeData};
use crate::tools::structured_tool::{
    DynamicStructuredTool, StructuredToolFn, ToolArgs, STRUCTURED_TOOL_BASE_CLASSES,
};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Credential field holding the OpenAI API key.
pub const API_KEY_FIELD: &str = "openAIApiKey";

pub const DEFAULT_MODEL: &str = "gpt-image-1";
pub const DEFAULT_SIZE: &str = "1024x1024";
pub const DEFAULT_QUALITY: &str = "medium";
pub const DEFAULT_TOOL_NAME: &str = "generate_image";
pub const DEFAULT_TOOL_DESCRIPTION: &str = "Generate an image based on a text description. Use this when the user asks to create, draw, or generate an image.";

const PROMPT_DESCRIPTION: &str = "Detailed text description of the image to generate";

// ---------------------------------------------------------------------------
// Generator
// ---------------------------------------------------------------------------

/// Everything one tool call needs, captured at `init`.
struct ImageGenerator {
    endpoint: String,
    api_key: SecretString,
    model: String,
    size: String,
    quality: String,
    http: reqwest::Client,
}

impl fmt::Debug for ImageGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageGenerator")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("size", &self.size)
            .field("quality", &self.quality)
            .finish()
    }
}

impl ImageGenerator {
    fn request_body(&self, prompt: &str) -> Value {
        serde_json::json!({
            "model": self.model,
            "prompt": prompt,
            "n": 1,
            "size": self.size,
            "quality": self.quality,
        })
    }

    async fn generate(&self, prompt: &str) -> String {
        log::debug!(
            "Image generation request: model={}, size={}, quality={}",
            self.model,
            self.size,
            self.quality
        );

        let response = match self
            .http
            .post(&self.endpoint)
            .bearer_auth(self.api_key.expose_secret())
            .json(&self.request_body(prompt))
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                log::warn!("Image generation request to {} failed: {}", self.endpoint, e);
                return format!("Image generation request failed: {}", e);
            }
        };

        let status = response.status();
        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => return format!("Image generation request failed: {}", e),
        };

        match serde_json::from_str::<Value>(&text) {
            Ok(result) => describe_result(&result),
            Err(_) => {
                log::warn!("Unreadable image generation response ({})", status);
                format!("Failed to generate image: unexpected response ({})", status)
            }
        }
    }
}

/// Turn an Images API response body into the tool's result string.
pub fn describe_result(result: &Value) -> String {
    if let Some(error) = result.get("error").filter(|e| !e.is_null()) {
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string());
        return format!("Error generating image: {}", message);
    }

    let image = match result
        .get("data")
        .and_then(Value::as_array)
        .and_then(|data| data.first())
    {
        Some(image) => image,
        None => return "Failed to generate image: No image data returned".to_string(),
    };

    if let Some(url) = image.get("url").and_then(Value::as_str) {
        format!("Image generated successfully! View it here: {}", url)
    } else if let Some(b64) = image.get("b64_json").and_then(Value::as_str) {
        // gpt-image-1 answers with inline base64 instead of a hosted URL.
        format!(
            "Image generated successfully! View it here: data:image/png;base64,{}",
            b64
        )
    } else {
        "Failed to generate image: No image URL returned".to_string()
    }
}

fn prompt_schema() -> Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "prompt": {
                "type": "string",
                "description": PROMPT_DESCRIPTION,
            }
        },
        "required": ["prompt"],
    })
}

// ---------------------------------------------------------------------------
// Node
// ---------------------------------------------------------------------------

/// Node producing the `generate_image` tool.
#[derive(Debug)]
pub struct OpenAIImageGenNode {
    descriptor: CapabilityDescriptor,
}

impl Default for OpenAIImageGenNode {
    fn default() -> Self {
        Self::new()
    }
}

impl OpenAIImageGenNode {
    pub fn new() -> Self {
        let models = vec![
            OptionChoice::new("gpt-image-1", "gpt-image-1").with_description(
                "Latest GPT Image model with best quality and instruction following",
            ),
            OptionChoice::new("dall-e-3", "dall-e-3")
                .with_description("DALL-E 3 - High quality image generation"),
            OptionChoice::new("dall-e-2", "dall-e-2")
                .with_description("DALL-E 2 - Faster, lower cost"),
        ];
        let sizes = vec![
            OptionChoice::new("1024x1024", "1024x1024 (Square)"),
            OptionChoice::new("1536x1024", "1536x1024 (Landscape)"),
            OptionChoice::new("1024x1536", "1024x1536 (Portrait)"),
            OptionChoice::new("512x512", "512x512 (DALL-E 2 only)"),
            OptionChoice::new("256x256", "256x256 (DALL-E 2 only)"),
        ];
        let qualities = vec![
            OptionChoice::new("low", "Low (Fastest)"),
            OptionChoice::new("medium", "Medium"),
            OptionChoice::new("high", "High (Best quality)"),
            OptionChoice::new("standard", "Standard (DALL-E 3)"),
            OptionChoice::new("hd", "HD (DALL-E 3)"),
        ];

        let descriptor = CapabilityDescriptor::builder(
            "openAIImageGen",
            "OpenAI Image Generation",
            "OpenAIImageGen",
        )
        .version(1.0)
        .icon("openai.svg")
        .category("Tools")
        .description("Generate images using OpenAI GPT-Image-1 / DALL-E API")
        .base_classes(std::iter::once("Tool").chain(STRUCTURED_TOOL_BASE_CLASSES.iter().copied()))
        .credential(CredentialSpec::new(["openAIApi"]))
        .input(InputSpec::options("model", "Model", models).with_default(DEFAULT_MODEL))
        .input(
            InputSpec::options("size", "Image Size", sizes)
                .with_default(DEFAULT_SIZE)
                .optional(),
        )
        .input(
            InputSpec::options("quality", "Quality", qualities)
                .with_default(DEFAULT_QUALITY)
                .optional(),
        )
        .input(
            InputSpec::string("toolName", "Tool Name")
                .with_default(DEFAULT_TOOL_NAME)
                .additional(),
        )
        .input(
            InputSpec::string("toolDescription", "Tool Description")
                .with_default(DEFAULT_TOOL_DESCRIPTION)
                .with_rows(3)
                .additional(),
        )
        .build();

        Self { descriptor }
    }
}

#[async_trait]
impl Node for OpenAIImageGenNode {
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

        let model = inputs
            .option("model")?
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let size = inputs
            .option("size")?
            .unwrap_or_else(|| DEFAULT_SIZE.to_string());
        let quality = inputs
            .option("quality")?
            .unwrap_or_else(|| DEFAULT_QUALITY.to_string());
        let tool_name = inputs
            .string("toolName")?
            .unwrap_or_else(|| DEFAULT_TOOL_NAME.to_string());
        let tool_description = inputs
            .string("toolDescription")?
            .unwrap_or_else(|| DEFAULT_TOOL_DESCRIPTION.to_string());

        let accepted = self
            .descriptor
            .credential()
            .map(|c| c.credential_names.clone())
            .unwrap_or_default();
        let data = credential_data(node_data, &accepted, ctx).await?;
        let api_key = credential_param(API_KEY_FIELD, &data, node_data)?;

        let generator = Arc::new(ImageGenerator {
            endpoint: format!(
                "{}/images/generations",
                ctx.config().openai_base_url.trim_end_matches('/')
            ),
            api_key,
            model,
            size,
            quality,
            http: ctx.http_client().clone(),
        });

        log::debug!(
            "Initialized {} node {} (flow {}): tool={}, {:?}",
            self.descriptor.name(),
            node_data.id,
            flow_execution_id,
            tool_name,
            generator
        );

        let func: StructuredToolFn = Arc::new(move |args: ToolArgs| {
            let generator = Arc::clone(&generator);
            async move {
                let prompt = args
                    .get("prompt")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                generator.generate(&prompt).await
            }
            .boxed()
        });

        Ok(CapabilityObject::Tool(DynamicStructuredTool::new(
            tool_name,
            tool_description,
            prompt_schema(),
            func,
        )))
    }
}
