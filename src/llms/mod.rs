//! Chat-model infrastructure.
//!
//! - [`base_llm`] - the trait every chat-model capability object implements
//! - [`vision`] - the optional text/vision model toggle
//! - [`providers`] - provider clients (Anthropic)

pub mod base_llm;
pub mod providers;
pub mod vision;

pub use base_llm::{
    message, BaseChatModel, CallOptions, InvocationParams, LLMMessage, CHAT_MODEL_BASE_CLASSES,
};
pub use vision::{
    ImageOption, ImageResolution, MultiModalOption, VisionChatModel, VisionMode, VisionPolicy,
    VisionState,
};
