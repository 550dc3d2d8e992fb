//! # flownodes
//!
//! Pluggable node registry for visual AI-workflow builders.
//!
//! Each node is a self-describing unit: a [`CapabilityDescriptor`] the host
//! renders and filters on, and an async `init` that turns the user's
//! configuration plus a stored credential into a live capability object,
//! either a chat model or an invocable tool.
//!
//! Built-in nodes:
//!
//! - `chatAnthropic` - Anthropic chat model with a text/vision toggle
//! - `openAIImageGen` - image generation tool backed by the OpenAI Images API
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use flownodes::credentials::{CredentialData, InMemoryCredentialStore};
//! use flownodes::nodes::{ExecutionContext, NodeData, NodeRegistry};
//!
//! # async fn run() -> Result<(), flownodes::NodeError> {
//! let store = InMemoryCredentialStore::new().with_credential(
//!     "cred-1",
//!     "openAIApi",
//!     CredentialData::new().with_field("openAIApiKey", "sk-..."),
//! );
//! let ctx = ExecutionContext::builder(Arc::new(store)).build();
//! let registry = NodeRegistry::with_builtin_nodes()?;
//!
//! let data = NodeData::new("openAIImageGen_0").with_credential("cred-1");
//! let object = registry.init_node("openAIImageGen", &data, "flow-1", &ctx).await?;
//! if let Some(tool) = object.as_tool() {
//!     let answer = tool.invoke(serde_json::json!({ "prompt": "a lighthouse at dusk" })).await;
//!     println!("{:?}", answer);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod credentials;
pub mod llms;
pub mod nodes;
pub mod tools;

pub use config::RuntimeConfig;
pub use credentials::{CredentialError, CredentialResolver};
pub use llms::{BaseChatModel, VisionChatModel};
pub use nodes::{
    CapabilityDescriptor, CapabilityObject, ExecutionContext, Node, NodeData, NodeError,
    NodeRegistry,
};
pub use tools::DynamicStructuredTool;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
