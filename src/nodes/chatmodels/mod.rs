//! Chat-model nodes.

pub mod chat_anthropic;

pub use chat_anthropic::{ChatAnthropic, ChatAnthropicNode};
