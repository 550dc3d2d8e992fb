//! Credential resolution.
//!
//! Nodes never see how credentials are stored or decrypted. They hand the
//! opaque reference from their [`NodeData`](crate::nodes::NodeData) to the
//! host's [`CredentialResolver`] and read the fields they need with
//! [`credential_param`].

pub mod error;
pub mod memory;
pub mod resolver;

pub use error::CredentialError;
pub use memory::InMemoryCredentialStore;
pub use resolver::{credential_data, credential_param, CredentialData, CredentialResolver};
