//! Tool-invocation primitives shared by tool nodes.

pub mod structured_tool;

pub use structured_tool::{
    DynamicStructuredTool, StructuredToolFn, ToolArgs, ToolError, STRUCTURED_TOOL_BASE_CLASSES,
};
