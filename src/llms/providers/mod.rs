//! Provider clients used by chat-model nodes.
//!
//! | Provider | Module |
//! |----------|--------|
//! | Anthropic | [`anthropic`] |

pub mod anthropic;
