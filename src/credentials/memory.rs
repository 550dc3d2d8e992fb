//! In-memory credential store.
//!
//! Useful for embedding hosts with a fixed credential set and for tests. A
//! store can be marked offline to exercise the "store unreachable" path.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use super::error::CredentialError;
use super::resolver::{CredentialData, CredentialResolver};
use crate::nodes::context::ExecutionContext;

#[derive(Debug, Clone)]
struct StoredCredential {
    credential_name: String,
    data: CredentialData,
}

/// A [`CredentialResolver`] backed by a `HashMap`.
#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    credentials: HashMap<String, StoredCredential>,
    offline: AtomicBool,
}

impl InMemoryCredentialStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `data` under `reference` with the given credential type name.
    pub fn insert(
        &mut self,
        reference: impl Into<String>,
        credential_name: impl Into<String>,
        data: CredentialData,
    ) {
        self.credentials.insert(
            reference.into(),
            StoredCredential {
                credential_name: credential_name.into(),
                data,
            },
        );
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with_credential(
        mut self,
        reference: impl Into<String>,
        credential_name: impl Into<String>,
        data: CredentialData,
    ) -> Self {
        self.insert(reference, credential_name, data);
        self
    }

    /// Simulate the store becoming unreachable (or reachable again).
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }

    fn lookup(&self, reference: &str) -> Result<&StoredCredential, CredentialError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(CredentialError::Unavailable {
                message: "in-memory store is offline".to_string(),
            });
        }
        self.credentials
            .get(reference)
            .ok_or_else(|| CredentialError::NotFound {
                reference: reference.to_string(),
            })
    }
}

#[async_trait]
impl CredentialResolver for InMemoryCredentialStore {
    async fn resolve(
        &self,
        reference: &str,
        _ctx: &ExecutionContext,
    ) -> Result<CredentialData, CredentialError> {
        self.lookup(reference).map(|stored| stored.data.clone())
    }

    async fn credential_name(
        &self,
        reference: &str,
        _ctx: &ExecutionContext,
    ) -> Result<Option<String>, CredentialError> {
        self.lookup(reference)
            .map(|stored| Some(stored.credential_name.clone()))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use secrecy::ExposeSecret;

    use super::*;

    fn store() -> InMemoryCredentialStore {
        InMemoryCredentialStore::new().with_credential(
            "cred-1",
            "openAIApi",
            CredentialData::new().with_field("openAIApiKey", "sk-test"),
        )
    }

    #[tokio::test]
    async fn test_resolve_known_reference() {
        let ctx = ExecutionContext::builder(Arc::new(InMemoryCredentialStore::new())).build();
        let data = store().resolve("cred-1", &ctx).await.unwrap();
        assert_eq!(data.get("openAIApiKey").unwrap().expose_secret(), "sk-test");
    }

    #[tokio::test]
    async fn test_resolve_unknown_reference() {
        let ctx = ExecutionContext::builder(Arc::new(InMemoryCredentialStore::new())).build();
        let err = store().resolve("nope", &ctx).await.unwrap_err();
        assert!(matches!(err, CredentialError::NotFound { .. }));
        assert!(!err.is_unavailable());
    }

    #[tokio::test]
    async fn test_offline_store_is_unavailable() {
        let ctx = ExecutionContext::builder(Arc::new(InMemoryCredentialStore::new())).build();
        let s = store();
        s.set_offline(true);
        let err = s.resolve("cred-1", &ctx).await.unwrap_err();
        assert!(err.is_unavailable());

        s.set_offline(false);
        assert!(s.resolve("cred-1", &ctx).await.is_ok());
    }

    #[tokio::test]
    async fn test_credential_name() {
        let ctx = ExecutionContext::builder(Arc::new(InMemoryCredentialStore::new())).build();
        let name = store().credential_name("cred-1", &ctx).await.unwrap();
        assert_eq!(name.as_deref(), Some("openAIApi"));
    }
}
