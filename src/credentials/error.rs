//! Credential resolution errors.

use thiserror::Error;

/// Errors that can occur while resolving a credential reference.
///
/// `MissingReference` and `NotFound` mean the host handed us nothing usable;
/// `Unavailable` means the store itself could not be reached. Hosts treat the
/// two families differently (prompt the user vs. retry later).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialError {
    /// No credential reference was configured on the node.
    #[error("No credential selected for '{credential}'")]
    MissingReference {
        /// Secret field the node needed (e.g. `openAIApiKey`).
        credential: String,
    },

    /// The reference does not point at a stored credential.
    #[error("Credential '{reference}' not found")]
    NotFound { reference: String },

    /// The stored credential is of a type the node does not accept.
    #[error("Credential '{reference}' has type '{actual}', expected one of: {expected}")]
    WrongType {
        reference: String,
        actual: String,
        expected: String,
    },

    /// The credential store could not be reached.
    #[error("Credential store unavailable: {message}")]
    Unavailable { message: String },

    /// A required secret field is absent from the credential data.
    #[error("{field} is required")]
    MissingField {
        /// Name of the secret field (e.g. `openAIApiKey`).
        field: String,
    },
}

impl CredentialError {
    /// Whether the failure is on the store side rather than in the reference.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }
}
