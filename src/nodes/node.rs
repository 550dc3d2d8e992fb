//! The node instance protocol.

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::capability::CapabilityObject;
use super::context::ExecutionContext;
use super::descriptor::CapabilityDescriptor;
use super::error::NodeError;

// ---------------------------------------------------------------------------
// NodeData
// ---------------------------------------------------------------------------

/// The host's per-invocation view of one node: user-chosen input values and
/// an optional credential reference.
///
/// Values are raw JSON as the host stored them; nodes interpret them through
/// [`ResolvedInputs`](super::inputs::ResolvedInputs).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeData {
    /// Node instance id within the host's flow.
    pub id: String,
    /// Input name → raw value.
    #[serde(default)]
    pub inputs: HashMap<String, Value>,
    /// Opaque credential reference, resolved through the credential resolver.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential: Option<String>,
}

impl NodeData {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            inputs: HashMap::new(),
            credential: None,
        }
    }

    /// Node data with a generated instance id.
    pub fn anonymous() -> Self {
        Self::new(Uuid::new_v4().to_string())
    }

    pub fn with_input(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.inputs.insert(name.into(), value.into());
        self
    }

    pub fn with_credential(mut self, reference: impl Into<String>) -> Self {
        self.credential = Some(reference.into());
        self
    }
}

// ---------------------------------------------------------------------------
// Node trait
// ---------------------------------------------------------------------------

/// A registered node type: static metadata plus a runtime constructor.
///
/// `init` is the only executable entry point the host calls. It must not
/// cache anything across calls: two calls with identical inputs produce two
/// independent capability objects.
#[async_trait]
pub trait Node: Send + Sync + fmt::Debug {
    /// The node's immutable descriptor.
    fn descriptor(&self) -> &CapabilityDescriptor;

    /// Turn resolved configuration into a ready-to-use capability object.
    ///
    /// Fails with [`NodeError::Configuration`] for missing or invalid inputs
    /// and [`NodeError::Credential`] when a declared credential cannot be
    /// resolved. No partially-built object is ever returned.
    async fn init(
        &self,
        node_data: &NodeData,
        flow_execution_id: &str,
        ctx: &ExecutionContext,
    ) -> Result<CapabilityObject, NodeError>;

    /// Shortcut for `self.descriptor().name()`.
    fn name(&self) -> &str {
        self.descriptor().name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_data_builders() {
        let data = NodeData::new("chatAnthropic_0")
            .with_input("modelName", "claude-3-haiku-20240307")
            .with_input("temperature", 0.2)
            .with_credential("cred-1");
        assert_eq!(data.id, "chatAnthropic_0");
        assert_eq!(data.inputs["temperature"], 0.2);
        assert_eq!(data.credential.as_deref(), Some("cred-1"));
    }

    #[test]
    fn test_anonymous_ids_are_unique() {
        assert_ne!(NodeData::anonymous().id, NodeData::anonymous().id);
    }

    #[test]
    fn test_node_data_from_host_json() {
        let data: NodeData = serde_json::from_value(serde_json::json!({
            "id": "openAIImageGen_0",
            "inputs": { "model": "dall-e-3" },
            "credential": "cred-9"
        }))
        .unwrap();
        assert_eq!(data.inputs["model"], "dall-e-3");
        assert_eq!(data.credential.as_deref(), Some("cred-9"));
    }
}
