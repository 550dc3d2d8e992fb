//! Capability descriptors: the static, declarative face of a node.
//!
//! A descriptor tells the host everything it needs to render a configuration
//! form and to decide where a node may be wired: identity, category, inputs,
//! credential requirement and the capability classes (`baseClasses`) the
//! produced object satisfies.
//!
//! Descriptors are built once per node type and never mutated afterwards:
//! every field is private and read through accessors.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::NodeError;

// ============================================================================
// Input specification
// ============================================================================

/// Declared type of a node input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    String,
    Number,
    Boolean,
    /// Closed set of choices, see [`OptionChoice`].
    Options,
    Json,
    Credential,
}

/// One choice of an `options` input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionChoice {
    pub name: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl OptionChoice {
    pub fn new(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A configurable input of a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputSpec {
    pub label: String,
    pub name: String,
    #[serde(rename = "type")]
    pub input_type: InputType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default)]
    pub optional: bool,
    /// Advanced input, hidden by default in the host UI.
    #[serde(default)]
    pub additional_params: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Text-area height hint for `string` inputs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rows: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<OptionChoice>,
}

impl InputSpec {
    fn base(name: impl Into<String>, label: impl Into<String>, input_type: InputType) -> Self {
        Self {
            label: label.into(),
            name: name.into(),
            input_type,
            default: None,
            optional: false,
            additional_params: false,
            description: None,
            rows: None,
            options: Vec::new(),
        }
    }

    pub fn string(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self::base(name, label, InputType::String)
    }

    pub fn number(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self::base(name, label, InputType::Number)
    }

    pub fn boolean(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self::base(name, label, InputType::Boolean)
    }

    pub fn json(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self::base(name, label, InputType::Json)
    }

    pub fn options(
        name: impl Into<String>,
        label: impl Into<String>,
        choices: Vec<OptionChoice>,
    ) -> Self {
        let mut spec = Self::base(name, label, InputType::Options);
        spec.options = choices;
        spec
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Mark as an advanced input. Advanced inputs are always optional.
    pub fn additional(mut self) -> Self {
        self.additional_params = true;
        self.optional = true;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_rows(mut self, rows: u32) -> Self {
        self.rows = Some(rows);
        self
    }

    /// Whether `value` names one of the declared choices.
    pub fn has_choice(&self, value: &str) -> bool {
        self.options.iter().any(|c| c.name == value)
    }

    fn validate(&self) -> Result<(), NodeError> {
        if self.name.is_empty() {
            return Err(NodeError::configuration("Input name cannot be empty"));
        }
        if self.input_type != InputType::Options {
            return Ok(());
        }
        if self.options.is_empty() {
            return Err(NodeError::configuration(format!(
                "Options input '{}' declares no choices",
                self.name
            )));
        }
        match &self.default {
            None => Ok(()),
            Some(Value::String(d)) if self.has_choice(d) => Ok(()),
            Some(other) => Err(NodeError::configuration(format!(
                "Default {} of input '{}' is not one of its options",
                other, self.name
            ))),
        }
    }
}

// ============================================================================
// Credential specification
// ============================================================================

/// The credential a node requires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialSpec {
    pub label: String,
    pub name: String,
    #[serde(rename = "type")]
    pub input_type: InputType,
    /// Credential type names the node accepts (e.g. `openAIApi`).
    pub credential_names: Vec<String>,
}

impl CredentialSpec {
    pub fn new<I, S>(credential_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            label: "Connect Credential".to_string(),
            name: "credential".to_string(),
            input_type: InputType::Credential,
            credential_names: credential_names.into_iter().map(Into::into).collect(),
        }
    }

    fn validate(&self) -> Result<(), NodeError> {
        if self.credential_names.is_empty() {
            return Err(NodeError::configuration(format!(
                "Credential '{}' must accept at least one credential type",
                self.name
            )));
        }
        Ok(())
    }
}

// ============================================================================
// Base classes
// ============================================================================

/// Ordered, duplicate-free set of capability class labels.
///
/// The host filters and routes nodes by membership in this set instead of
/// inspecting concrete types.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BaseClasses(Vec<String>);

impl BaseClasses {
    pub fn contains(&self, class: &str) -> bool {
        self.0.iter().any(|c| c == class)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn push(&mut self, class: impl Into<String>) {
        let class = class.into();
        if !class.is_empty() && !self.contains(&class) {
            self.0.push(class);
        }
    }
}

impl<S: Into<String>> FromIterator<S> for BaseClasses {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        let mut classes = BaseClasses::default();
        for class in iter {
            classes.push(class);
        }
        classes
    }
}

// ============================================================================
// CapabilityDescriptor
// ============================================================================

/// Static metadata for one node type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityDescriptor {
    label: String,
    name: String,
    version: f64,
    #[serde(rename = "type")]
    node_type: String,
    icon: String,
    category: String,
    description: String,
    base_classes: BaseClasses,
    inputs: Vec<InputSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    credential: Option<CredentialSpec>,
}

impl CapabilityDescriptor {
    /// Start building a descriptor for the node `name` producing `node_type`.
    pub fn builder(
        name: impl Into<String>,
        label: impl Into<String>,
        node_type: impl Into<String>,
    ) -> DescriptorBuilder {
        DescriptorBuilder {
            label: label.into(),
            name: name.into(),
            version: 1.0,
            node_type: node_type.into(),
            icon: String::new(),
            category: String::new(),
            description: String::new(),
            base_classes: Vec::new(),
            inputs: Vec::new(),
            credential: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn version(&self) -> f64 {
        self.version
    }

    pub fn node_type(&self) -> &str {
        &self.node_type
    }

    pub fn icon(&self) -> &str {
        &self.icon
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn base_classes(&self) -> &BaseClasses {
        &self.base_classes
    }

    pub fn inputs(&self) -> &[InputSpec] {
        &self.inputs
    }

    pub fn credential(&self) -> Option<&CredentialSpec> {
        self.credential.as_ref()
    }

    /// Look up an input by name.
    pub fn input(&self, name: &str) -> Option<&InputSpec> {
        self.inputs.iter().find(|i| i.name == name)
    }

    /// Inputs shown by default in the host UI.
    pub fn primary_inputs(&self) -> impl Iterator<Item = &InputSpec> {
        self.inputs.iter().filter(|i| !i.additional_params)
    }

    /// Advanced inputs, hidden by default.
    pub fn additional_inputs(&self) -> impl Iterator<Item = &InputSpec> {
        self.inputs.iter().filter(|i| i.additional_params)
    }

    /// Whether the node's capability object satisfies `class`.
    pub fn satisfies(&self, class: &str) -> bool {
        self.base_classes.contains(class)
    }

    /// Check the descriptor invariants.
    pub fn validate(&self) -> Result<(), NodeError> {
        if self.name.is_empty() || self.node_type.is_empty() {
            return Err(NodeError::configuration(
                "Descriptor name and type cannot be empty",
            ));
        }

        let mut seen = HashSet::new();
        for input in &self.inputs {
            input.validate()?;
            if !seen.insert(input.name.as_str()) {
                return Err(NodeError::configuration(format!(
                    "Duplicate input '{}' on node '{}'",
                    input.name, self.name
                )));
            }
        }

        if let Some(credential) = &self.credential {
            credential.validate()?;
        }
        Ok(())
    }
}

/// Builder for [`CapabilityDescriptor`].
#[derive(Debug, Clone)]
pub struct DescriptorBuilder {
    label: String,
    name: String,
    version: f64,
    node_type: String,
    icon: String,
    category: String,
    description: String,
    base_classes: Vec<String>,
    inputs: Vec<InputSpec>,
    credential: Option<CredentialSpec>,
}

impl DescriptorBuilder {
    pub fn version(mut self, version: f64) -> Self {
        self.version = version;
        self
    }

    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = icon.into();
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Add capability classes. The node type is always the first class.
    pub fn base_classes<I, S>(mut self, classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.base_classes.extend(classes.into_iter().map(Into::into));
        self
    }

    pub fn input(mut self, input: InputSpec) -> Self {
        self.inputs.push(input);
        self
    }

    pub fn credential(mut self, credential: CredentialSpec) -> Self {
        self.credential = Some(credential);
        self
    }

    pub fn build(self) -> CapabilityDescriptor {
        let base_classes = std::iter::once(self.node_type.clone())
            .chain(self.base_classes)
            .collect();

        CapabilityDescriptor {
            label: self.label,
            name: self.name,
            version: self.version,
            node_type: self.node_type,
            icon: self.icon,
            category: self.category,
            description: self.description,
            base_classes,
            inputs: self.inputs,
            credential: self.credential,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
