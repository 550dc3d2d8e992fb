//! Execution context passed to every `init` call.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::config::RuntimeConfig;
use crate::credentials::CredentialResolver;

/// Host-provided services for one invocation.
///
/// Cheap to clone. Nodes borrow it for the duration of `init` and must not
/// keep it; capability objects that need HTTP access clone the client out of
/// it instead.
#[derive(Clone)]
pub struct ExecutionContext {
    credential_resolver: Arc<dyn CredentialResolver>,
    config: Arc<RuntimeConfig>,
    http_client: reqwest::Client,
    extras: HashMap<String, Value>,
}

impl fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("credential_resolver", &self.credential_resolver)
            .field("config", &self.config)
            .field("extras", &self.extras.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ExecutionContext {
    /// Start building a context around the host's credential resolver.
    pub fn builder(credential_resolver: Arc<dyn CredentialResolver>) -> ExecutionContextBuilder {
        ExecutionContextBuilder {
            credential_resolver,
            config: RuntimeConfig::default(),
            http_client: None,
            extras: HashMap::new(),
        }
    }

    pub fn credential_resolver(&self) -> &dyn CredentialResolver {
        self.credential_resolver.as_ref()
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn http_client(&self) -> &reqwest::Client {
        &self.http_client
    }

    /// An opaque host value (e.g. `chatflowid`, `orgId`).
    pub fn extra(&self, key: &str) -> Option<&Value> {
        self.extras.get(key)
    }
}

/// Builder for [`ExecutionContext`].
pub struct ExecutionContextBuilder {
    credential_resolver: Arc<dyn CredentialResolver>,
    config: RuntimeConfig,
    http_client: Option<reqwest::Client>,
    extras: HashMap<String, Value>,
}

impl ExecutionContextBuilder {
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Share an existing HTTP client instead of building one from the config.
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = Some(client);
        self
    }

    pub fn extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extras.insert(key.into(), value.into());
        self
    }

    pub fn build(self) -> ExecutionContext {
        let http_client = match self.http_client {
            Some(client) => client,
            None => self.config.http_client().unwrap_or_else(|err| {
                log::warn!("Falling back to default HTTP client: {}", err);
                reqwest::Client::new()
            }),
        };

        ExecutionContext {
            credential_resolver: self.credential_resolver,
            config: Arc::new(self.config),
            http_client,
            extras: self.extras,
        }
    }
}
