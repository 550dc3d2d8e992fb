//! Node Registry - the host-side pool of node types.
//!
//! Nodes are registered once, by name. Registration validates the node's
//! descriptor, so everything reachable through the registry satisfies the
//! descriptor invariants. Lookups are by name, base class or category.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use super::capability::CapabilityObject;
use super::chatmodels::ChatAnthropicNode;
use super::context::ExecutionContext;
use super::descriptor::CapabilityDescriptor;
use super::error::NodeError;
use super::node::{Node, NodeData};
use super::tools::OpenAIImageGenNode;

/// Registered nodes indexed by descriptor name.
#[derive(Debug, Default)]
pub struct NodeRegistry {
    nodes: HashMap<String, Arc<dyn Node>>,
}

impl NodeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding every node shipped with this crate.
    pub fn with_builtin_nodes() -> Result<Self, NodeError> {
        let mut registry = Self::new();
        registry.register(ChatAnthropicNode::new())?;
        registry.register(OpenAIImageGenNode::new())?;
        Ok(registry)
    }

    /// Register a node.
    ///
    /// Fails with [`NodeError::Configuration`] if the descriptor is invalid
    /// or a node with the same name is already registered.
    pub fn register(&mut self, node: impl Node + 'static) -> Result<(), NodeError> {
        self.register_arc(Arc::new(node))
    }

    /// Register a shared node.
    pub fn register_arc(&mut self, node: Arc<dyn Node>) -> Result<(), NodeError> {
        node.descriptor().validate()?;

        let name = node.name().to_string();
        if self.nodes.contains_key(&name) {
            return Err(NodeError::configuration(format!(
                "Node '{}' is already registered",
                name
            )));
        }

        log::debug!("Registered node {}", name);
        self.nodes.insert(name, node);
        Ok(())
    }

    /// Remove a node, returning it if it was registered.
    pub fn unregister(&mut self, name: &str) -> Option<Arc<dyn Node>> {
        self.nodes.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Node>> {
        self.nodes.get(name)
    }

    /// Registered node names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.nodes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// All descriptors, sorted by name.
    pub fn descriptors(&self) -> Vec<&CapabilityDescriptor> {
        let mut descriptors: Vec<&CapabilityDescriptor> =
            self.nodes.values().map(|n| n.descriptor()).collect();
        descriptors.sort_by(|a, b| a.name().cmp(b.name()));
        descriptors
    }

    /// Descriptors of nodes whose capability object satisfies `class`.
    pub fn by_base_class(&self, class: &str) -> Vec<&CapabilityDescriptor> {
        self.descriptors()
            .into_iter()
            .filter(|d| d.satisfies(class))
            .collect()
    }

    /// Descriptors in `category`.
    pub fn by_category(&self, category: &str) -> Vec<&CapabilityDescriptor> {
        self.descriptors()
            .into_iter()
            .filter(|d| d.category() == category)
            .collect()
    }

    /// Distinct categories, sorted.
    pub fn categories(&self) -> Vec<&str> {
        self.nodes
            .values()
            .map(|n| n.descriptor().category())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Run the named node's `init`.
    pub async fn init_node(
        &self,
        name: &str,
        node_data: &NodeData,
        flow_execution_id: &str,
        ctx: &ExecutionContext,
    ) -> Result<CapabilityObject, NodeError> {
        let node = self
            .nodes
            .get(name)
            .ok_or_else(|| NodeError::UnknownNode(name.to_string()))?;
        node.init(node_data, flow_execution_id, ctx).await
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::credentials::{CredentialData, InMemoryCredentialStore};
    use crate::nodes::capability::CapabilityKind;
    use crate::nodes::descriptor::{CredentialSpec, InputSpec};

    #[derive(Debug)]
    struct StaticNode {
        descriptor: CapabilityDescriptor,
    }

    #[async_trait]
    impl Node for StaticNode {
        fn descriptor(&self) -> &CapabilityDescriptor {
            &self.descriptor
        }

        async fn init(
            &self,
            _node_data: &NodeData,
            _flow_execution_id: &str,
            _ctx: &ExecutionContext,
        ) -> Result<CapabilityObject, NodeError> {
            Err(NodeError::configuration("static node cannot be initialized"))
        }
    }

    fn static_node(name: &str, category: &str) -> StaticNode {
        StaticNode {
            descriptor: CapabilityDescriptor::builder(name, name, name)
                .category(category)
                .base_classes(["Tool"])
                .build(),
        }
    }

    #[test]
    fn test_builtin_nodes() {
        let registry = NodeRegistry::with_builtin_nodes().unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.names(), vec!["chatAnthropic", "openAIImageGen"]);
        assert_eq!(registry.categories(), vec!["Chat Models", "Tools"]);
    }

    #[test]
    fn test_filter_by_base_class() {
        let registry = NodeRegistry::with_builtin_nodes().unwrap();

        let tools: Vec<&str> = registry.by_base_class("Tool").iter().map(|d| d.name()).collect();
        assert_eq!(tools, vec!["openAIImageGen"]);

        let chat: Vec<&str> = registry
            .by_base_class("BaseChatModel")
            .iter()
            .map(|d| d.name())
            .collect();
        assert_eq!(chat, vec!["chatAnthropic"]);

        assert_eq!(registry.by_base_class("Runnable").len(), 2);
        assert!(registry.by_base_class("Retriever").is_empty());
    }

    #[test]
    fn test_filter_by_category() {
        let registry = NodeRegistry::with_builtin_nodes().unwrap();
        assert_eq!(registry.by_category("Tools").len(), 1);
        assert!(registry.by_category("Agents").is_empty());
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut registry = NodeRegistry::new();
        registry.register(static_node("calc", "Tools")).unwrap();
        let err = registry.register(static_node("calc", "Tools")).unwrap_err();
        assert!(err.to_string().contains("already registered"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_invalid_descriptor_rejected() {
        let mut registry = NodeRegistry::new();
        let node = StaticNode {
            descriptor: CapabilityDescriptor::builder("bad", "Bad", "Bad")
                .credential(CredentialSpec::new(Vec::<String>::new()))
                .input(InputSpec::string("x", "X"))
                .build(),
        };
        let err = registry.register(node).unwrap_err();
        assert!(matches!(err, NodeError::Configuration(_)));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_unregister() {
        let mut registry = NodeRegistry::new();
        registry.register(static_node("calc", "Tools")).unwrap();
        assert!(registry.unregister("calc").is_some());
        assert!(registry.get("calc").is_none());
        assert!(registry.unregister("calc").is_none());
    }

    #[tokio::test]
    async fn test_init_node_dispatches_by_name() {
        let registry = NodeRegistry::with_builtin_nodes().unwrap();
        let store = InMemoryCredentialStore::new().with_credential(
            "cred-openai",
            "openAIApi",
            CredentialData::new().with_field("openAIApiKey", "sk-test"),
        );
        let ctx = ExecutionContext::builder(Arc::new(store)).build();
        let data = NodeData::new("openAIImageGen_0").with_credential("cred-openai");

        let object = registry
            .init_node("openAIImageGen", &data, "flow-1", &ctx)
            .await
            .unwrap();
        assert_eq!(object.kind(), CapabilityKind::Tool);
    }

    #[tokio::test]
    async fn test_init_unknown_node() {
        let registry = NodeRegistry::new();
        let ctx = ExecutionContext::builder(Arc::new(InMemoryCredentialStore::new())).build();
        let err = registry
            .init_node("missing", &NodeData::anonymous(), "flow-1", &ctx)
            .await
            .unwrap_err();
        assert!(matches!(err, NodeError::UnknownNode(ref n) if n == "missing"));
        assert_eq!(err.to_string(), "Node not found: missing");
    }
}
