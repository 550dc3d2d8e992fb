//! Vision-capability extension for chat models.
//!
//! Some chat models can be flipped at runtime between the model the user
//! configured and an image-capable sibling. The toggle is a two-state
//! machine:
//!
//! ```text
//!            set_vision_model()  (model not in vision family)
//!   TextMode ───────────────────────────────────────────────▶ VisionMode
//!      ▲                                                          │
//!      └──────────────── revert_to_original_model() ──────────────┘
//! ```
//!
//! [`VisionState`] captures the construction-time model and token budget so
//! that a revert always restores them, however many toggles happened in
//! between.

use serde::{Deserialize, Serialize};

use super::base_llm::BaseChatModel;

// ---------------------------------------------------------------------------
// Multi-modal option
// ---------------------------------------------------------------------------

/// Resolution hint for image inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageResolution {
    Low,
    High,
    #[default]
    Auto,
}

/// How image inputs are handled.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageOption {
    #[serde(default)]
    pub allow_image_uploads: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_resolution: Option<ImageResolution>,
}

/// Multi-modal configuration recorded on a vision-capable chat model.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MultiModalOption {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageOption>,
}

impl MultiModalOption {
    /// Allow image uploads with the given resolution hint.
    pub fn images(resolution: Option<ImageResolution>) -> Self {
        Self {
            image: Some(ImageOption {
                allow_image_uploads: true,
                image_resolution: resolution,
            }),
        }
    }

    pub fn allows_images(&self) -> bool {
        self.image.as_ref().is_some_and(|i| i.allow_image_uploads)
    }
}

// ---------------------------------------------------------------------------
// State machine
// ---------------------------------------------------------------------------

/// Which model the object is currently running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VisionMode {
    TextMode,
    VisionMode,
}

/// Provider-specific rules for switching to a vision model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisionPolicy {
    /// Models whose name starts with this already accept images.
    pub family_prefix: &'static str,
    /// Model switched to when the configured one is not image-capable.
    pub vision_model: &'static str,
    /// Token budget used when none was configured.
    pub fallback_max_tokens: u32,
}

/// Construction-time snapshot plus the current mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisionState {
    configured_model: String,
    configured_max_tokens: u32,
    multi_modal_option: Option<MultiModalOption>,
    mode: VisionMode,
}

impl VisionState {
    /// Capture the model and token budget in effect right after construction.
    pub fn capture(model_name: &str, max_tokens: u32) -> Self {
        Self {
            configured_model: model_name.to_string(),
            configured_max_tokens: max_tokens,
            multi_modal_option: None,
            mode: VisionMode::TextMode,
        }
    }

    pub fn configured_model(&self) -> &str {
        &self.configured_model
    }

    pub fn configured_max_tokens(&self) -> u32 {
        self.configured_max_tokens
    }

    pub fn mode(&self) -> VisionMode {
        self.mode
    }

    pub fn multi_modal_option(&self) -> Option<&MultiModalOption> {
        self.multi_modal_option.as_ref()
    }

    /// `TextMode → VisionMode`.
    ///
    /// Only switches when `model_name` is outside the policy's vision family;
    /// otherwise nothing changes. Returns whether a switch happened.
    pub fn enter_vision(
        &mut self,
        policy: &VisionPolicy,
        model_name: &mut String,
        max_tokens: &mut u32,
    ) -> bool {
        if model_name.starts_with(policy.family_prefix) {
            return false;
        }
        *model_name = policy.vision_model.to_string();
        *max_tokens = if self.configured_max_tokens > 0 {
            self.configured_max_tokens
        } else {
            policy.fallback_max_tokens
        };
        self.mode = VisionMode::VisionMode;
        true
    }

    /// `* → TextMode`, restoring the captured values unconditionally.
    pub fn revert(&mut self, model_name: &mut String, max_tokens: &mut u32) {
        model_name.clone_from(&self.configured_model);
        *max_tokens = self.configured_max_tokens;
        self.mode = VisionMode::TextMode;
    }

    pub fn set_multi_modal_option(&mut self, option: MultiModalOption) {
        self.multi_modal_option = Some(option);
    }
}

// ---------------------------------------------------------------------------
// VisionChatModel trait
// ---------------------------------------------------------------------------

/// A chat model that can switch to an image-capable variant.
///
/// Toggles take `&mut self`: callers sharing one object across tasks must
/// serialize access themselves.
pub trait VisionChatModel: BaseChatModel {
    /// Switch to the vision-capable model if the current one is not.
    fn set_vision_model(&mut self);

    /// Restore the model and token budget captured at construction.
    fn revert_to_original_model(&mut self);

    /// Record how image inputs should be encoded.
    fn set_multi_modal_option(&mut self, option: MultiModalOption);

    fn multi_modal_option(&self) -> Option<&MultiModalOption>;

    fn vision_mode(&self) -> VisionMode;
}
