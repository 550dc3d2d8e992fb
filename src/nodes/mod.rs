//! The node contract and the built-in nodes.
//!
//! A node is a [`CapabilityDescriptor`] (what the host shows and filters on)
//! plus an async [`Node::init`] that turns the user's [`NodeData`] into a
//! [`CapabilityObject`]. The [`NodeRegistry`] holds the registered node types.

pub mod capability;
pub mod chatmodels;
pub mod context;
pub mod descriptor;
pub mod error;
pub mod inputs;
pub mod node;
pub mod registry;
pub mod tools;

pub use capability::{CapabilityKind, CapabilityObject};
pub use context::{ExecutionContext, ExecutionContextBuilder};
pub use descriptor::{
    BaseClasses, CapabilityDescriptor, CredentialSpec, DescriptorBuilder, InputSpec, InputType,
    OptionChoice,
};
pub use error::NodeError;
pub use inputs::ResolvedInputs;
pub use node::{Node, NodeData};
pub use registry::NodeRegistry;
