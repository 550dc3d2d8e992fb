//! The runtime objects a node's `init` hands back to the host.

use std::fmt;

use crate::llms::vision::VisionChatModel;
use crate::tools::structured_tool::DynamicStructuredTool;

/// What kind of capability object a node produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapabilityKind {
    ChatModel,
    Tool,
}

impl fmt::Display for CapabilityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ChatModel => write!(f, "chat model"),
            Self::Tool => write!(f, "tool"),
        }
    }
}

/// A ready-to-use chat model or tool, owned by the host after `init`.
#[derive(Debug)]
pub enum CapabilityObject {
    ChatModel(Box<dyn VisionChatModel>),
    Tool(DynamicStructuredTool),
}

impl CapabilityObject {
    pub fn kind(&self) -> CapabilityKind {
        match self {
            Self::ChatModel(_) => CapabilityKind::ChatModel,
            Self::Tool(_) => CapabilityKind::Tool,
        }
    }

    pub fn as_chat_model(&self) -> Option<&dyn VisionChatModel> {
        match self {
            Self::ChatModel(model) => Some(model.as_ref()),
            Self::Tool(_) => None,
        }
    }

    pub fn as_chat_model_mut(&mut self) -> Option<&mut (dyn VisionChatModel + 'static)> {
        match self {
            Self::ChatModel(model) => Some(model.as_mut()),
            Self::Tool(_) => None,
        }
    }

    pub fn into_chat_model(self) -> Option<Box<dyn VisionChatModel>> {
        match self {
            Self::ChatModel(model) => Some(model),
            Self::Tool(_) => None,
        }
    }

    pub fn as_tool(&self) -> Option<&DynamicStructuredTool> {
        match self {
            Self::Tool(tool) => Some(tool),
            Self::ChatModel(_) => None,
        }
    }

    pub fn into_tool(self) -> Option<DynamicStructuredTool> {
        match self {
            Self::Tool(tool) => Some(tool),
            Self::ChatModel(_) => None,
        }
    }
}

impl From<DynamicStructuredTool> for CapabilityObject {
    fn from(tool: DynamicStructuredTool) -> Self {
        Self::Tool(tool)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use futures::FutureExt;

    use super::*;
    use crate::tools::structured_tool::{StructuredToolFn, ToolArgs};

    #[test]
    fn test_tool_accessors() {
        let func: StructuredToolFn = Arc::new(|_args: ToolArgs| async { "ok".to_string() }.boxed());
        let tool = DynamicStructuredTool::new(
            "echo",
            "Echo",
            serde_json::json!({ "type": "object", "properties": {} }),
            func,
        );
        let object = CapabilityObject::from(tool);
        assert_eq!(object.kind(), CapabilityKind::Tool);
        assert!(object.as_chat_model().is_none());
        assert_eq!(object.as_tool().map(|t| t.name()), Some("echo"));
        assert!(object.into_tool().is_some());
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(CapabilityKind::ChatModel.to_string(), "chat model");
        assert_eq!(CapabilityKind::Tool.to_string(), "tool");
    }
}
