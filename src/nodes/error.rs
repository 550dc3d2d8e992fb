//! Node error taxonomy.

use thiserror::Error;

use crate::credentials::CredentialError;

/// Errors raised by node registration, initialization and chat-model calls.
///
/// `Configuration` and `Credential` come out of `init` and are fatal to that
/// invocation. `Provider` and `Transport` come out of provider adapters; tool
/// callables turn them into result strings instead of returning them.
#[derive(Debug, Error)]
pub enum NodeError {
    /// A required input is missing or an input value is invalid.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The credential reference is missing, unresolvable, or lacks a field.
    #[error("Credential error: {0}")]
    Credential(#[from] CredentialError),

    /// The provider answered with a business-level error.
    #[error("{provider} API error: {message}")]
    Provider { provider: String, message: String },

    /// The provider could not be reached.
    #[error("Transport error: {0}")]
    Transport(String),

    /// No node with this name is registered.
    #[error("Node not found: {0}")]
    UnknownNode(String),
}

impl NodeError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// A required input was not supplied.
    pub fn missing_input(name: &str) -> Self {
        Self::Configuration(format!("Input '{}' is required", name))
    }

    /// True for errors that can only come out of `init`.
    pub fn is_init_error(&self) -> bool {
        matches!(self, Self::Configuration(_) | Self::Credential(_))
    }
}

impl From<reqwest::Error> for NodeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Transport(format!("request timed out: {}", err))
        } else {
            Self::Transport(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_input_message() {
        let err = NodeError::missing_input("model");
        assert_eq!(err.to_string(), "Configuration error: Input 'model' is required");
        assert!(err.is_init_error());
    }

    #[test]
    fn test_credential_conversion() {
        let err: NodeError = CredentialError::MissingField {
            field: "openAIApiKey".to_string(),
        }
        .into();
        assert!(err.is_init_error());
        assert_eq!(err.to_string(), "Credential error: openAIApiKey is required");
    }

    #[test]
    fn test_provider_display() {
        let err = NodeError::provider("anthropic", "overloaded");
        assert_eq!(err.to_string(), "anthropic API error: overloaded");
        assert!(!err.is_init_error());
    }
}
