//! The credential lookup interface consumed by nodes.

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;

use super::error::CredentialError;
use crate::nodes::context::ExecutionContext;
use crate::nodes::node::NodeData;

// ---------------------------------------------------------------------------
// CredentialData
// ---------------------------------------------------------------------------

/// Decrypted credential fields, keyed by field name.
///
/// Values are held as [`SecretString`] so that `Debug` output never contains
/// the raw secret.
#[derive(Clone, Default)]
pub struct CredentialData {
    fields: HashMap<String, SecretString>,
}

impl fmt::Debug for CredentialData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&String> = self.fields.keys().collect();
        keys.sort();
        f.debug_struct("CredentialData")
            .field("fields", &keys)
            .finish()
    }
}

impl CredentialData {
    /// Create empty credential data.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to add a field.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    /// Insert or replace a field.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields
            .insert(name.into(), SecretString::from(value.into()));
    }

    /// Look up a field.
    pub fn get(&self, name: &str) -> Option<&SecretString> {
        self.fields.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }
}

// ---------------------------------------------------------------------------
// CredentialResolver trait
// ---------------------------------------------------------------------------

/// Resolves an opaque credential reference into decrypted credential data.
///
/// Implementations are provided by the host (database-backed store, secret
/// manager, ...). Storage and decryption internals stay behind this trait.
#[async_trait]
pub trait CredentialResolver: Send + Sync + fmt::Debug {
    /// Resolve `reference` to its decrypted fields.
    ///
    /// Must return [`CredentialError::NotFound`] for unknown references and
    /// [`CredentialError::Unavailable`] when the backing store cannot be
    /// reached.
    async fn resolve(
        &self,
        reference: &str,
        ctx: &ExecutionContext,
    ) -> Result<CredentialData, CredentialError>;

    /// The credential type name (e.g. `openAIApi`) stored under `reference`,
    /// when the resolver tracks it.
    async fn credential_name(
        &self,
        _reference: &str,
        _ctx: &ExecutionContext,
    ) -> Result<Option<String>, CredentialError> {
        Ok(None)
    }
}

// ---------------------------------------------------------------------------
// Helpers used by nodes during init
// ---------------------------------------------------------------------------

/// Resolve the credential configured on `node_data`.
///
/// Returns empty data when the node has no credential reference; the caller
/// decides whether a missing field is fatal via [`credential_param`].
pub async fn credential_data(
    node_data: &NodeData,
    accepted: &[String],
    ctx: &ExecutionContext,
) -> Result<CredentialData, CredentialError> {
    let reference = match node_data.credential.as_deref() {
        Some(r) if !r.trim().is_empty() => r,
        _ => return Ok(CredentialData::new()),
    };

    let resolver = ctx.credential_resolver();

    if !accepted.is_empty() {
        if let Some(actual) = resolver.credential_name(reference, ctx).await? {
            if !accepted.iter().any(|a| a == &actual) {
                return Err(CredentialError::WrongType {
                    reference: reference.to_string(),
                    actual,
                    expected: accepted.join(", "),
                });
            }
        }
    }

    let data = resolver.resolve(reference, ctx).await?;
    log::debug!(
        "Resolved credential for node {} ({} field(s))",
        node_data.id,
        data.len()
    );
    Ok(data)
}

/// Read one secret field, falling back to a node input of the same name.
///
/// When neither source has a non-empty value, fails with
/// [`CredentialError::MissingReference`] if the node has no credential
/// reference at all, and with [`CredentialError::MissingField`] if the
/// referenced credential lacks the field.
pub fn credential_param(
    field: &str,
    data: &CredentialData,
    node_data: &NodeData,
) -> Result<SecretString, CredentialError> {
    if let Some(secret) = data.get(field) {
        if !secret.expose_secret().is_empty() {
            return Ok(secret.clone());
        }
    }

    if let Some(Value::String(s)) = node_data.inputs.get(field) {
        if !s.is_empty() {
            return Ok(SecretString::from(s.clone()));
        }
    }

    let has_reference = node_data
        .credential
        .as_deref()
        .is_some_and(|r| !r.trim().is_empty());
    if has_reference {
        Err(CredentialError::MissingField {
            field: field.to_string(),
        })
    } else {
        Err(CredentialError::MissingReference {
            credential: field.to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
