//! Structured tools: a name, a description, a JSON schema for the arguments
//! and an async function closed over whatever the tool needs at run time.
//!
//! The function itself is infallible by contract: it always produces a
//! string the calling agent can read. The only failure this layer reports is
//! argument validation, which happens before the function runs.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;
use serde_json::{Map, Value};
use thiserror::Error;

/// Capability classes every structured tool satisfies.
pub const STRUCTURED_TOOL_BASE_CLASSES: &[&str] =
    &["DynamicStructuredTool", "StructuredTool", "Runnable"];

/// Arguments handed to a tool function, after validation.
pub type ToolArgs = HashMap<String, Value>;

/// The async function behind a structured tool.
pub type StructuredToolFn = Arc<dyn Fn(ToolArgs) -> BoxFuture<'static, String> + Send + Sync>;

/// Errors raised by the tool framework before the tool function runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToolError {
    #[error("Invalid arguments for tool '{tool}': {message}")]
    InvalidArguments { tool: String, message: String },
}

/// Maximum number of schema violations reported in one error message.
const MAX_REPORTED_VIOLATIONS: usize = 3;

/// A tool whose behaviour is supplied as a closure.
#[derive(Clone)]
pub struct DynamicStructuredTool {
    name: String,
    description: String,
    args_schema: Value,
    /// `args_schema` compiled once at construction; the error text when it
    /// does not compile.
    validator: Result<Arc<jsonschema::Validator>, String>,
    func: StructuredToolFn,
}

impl fmt::Debug for DynamicStructuredTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicStructuredTool")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("args_schema", &self.args_schema)
            .finish()
    }
}

impl fmt::Display for DynamicStructuredTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DynamicStructuredTool(name='{}', description='{}')",
            self.name, self.description
        )
    }
}

impl DynamicStructuredTool {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        args_schema: Value,
        func: StructuredToolFn,
    ) -> Self {
        let name = name.into();
        let validator = jsonschema::validator_for(&args_schema)
            .map(Arc::new)
            .map_err(|e| e.to_string());
        if let Err(e) = &validator {
            log::warn!("Argument schema of tool '{}' does not compile: {}", name, e);
        }
        Self {
            name,
            description: description.into(),
            args_schema,
            validator,
            func,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// The full JSON schema of the arguments.
    pub fn args_schema(&self) -> &Value {
        &self.args_schema
    }

    /// The `properties` object of the schema.
    pub fn args(&self) -> Value {
        self.args_schema
            .get("properties")
            .cloned()
            .unwrap_or_else(|| Value::Object(Map::new()))
    }

    /// Names listed under `required` in the schema.
    pub fn required_args(&self) -> Vec<&str> {
        self.args_schema
            .get("required")
            .and_then(Value::as_array)
            .map(|arr| arr.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    fn invalid(&self, message: impl Into<String>) -> ToolError {
        ToolError::InvalidArguments {
            tool: self.name.clone(),
            message: message.into(),
        }
    }

    /// Parse and validate raw arguments against the schema.
    ///
    /// Accepts a JSON object or a string containing one. The object must
    /// satisfy the whole argument schema; a schema that failed to compile
    /// rejects every call.
    pub fn parse_args(&self, raw_args: Value) -> Result<ToolArgs, ToolError> {
        let obj = match raw_args {
            Value::Object(map) => map,
            Value::String(s) => serde_json::from_str::<Map<String, Value>>(&s)
                .map_err(|e| self.invalid(format!("failed to parse arguments as JSON: {}", e)))?,
            _ => return Err(self.invalid("arguments must be a JSON object or string")),
        };

        let validator = self
            .validator
            .as_ref()
            .map_err(|e| self.invalid(format!("invalid argument schema: {}", e)))?;
        let instance = Value::Object(obj);
        let violations: Vec<String> = validator
            .iter_errors(&instance)
            .take(MAX_REPORTED_VIOLATIONS)
            .map(|err| {
                let at = err.instance_path.to_string();
                if at.is_empty() {
                    err.to_string()
                } else {
                    format!("{} at {}", err, at)
                }
            })
            .collect();
        if !violations.is_empty() {
            return Err(self.invalid(violations.join("; ")));
        }

        match instance {
            Value::Object(obj) => Ok(obj.into_iter().collect()),
            _ => Ok(ToolArgs::new()),
        }
    }

    /// Validate `input` and run the tool function.
    pub async fn invoke(&self, input: Value) -> Result<String, ToolError> {
        let args = self.parse_args(input)?;
        log::debug!("Invoking tool '{}'", self.name);
        Ok((self.func)(args).await)
    }

    /// Run the tool function on already-validated arguments.
    pub async fn call(&self, args: ToolArgs) -> String {
        (self.func)(args).await
    }

    /// Tool definition in the function-calling format chat models expect.
    pub fn to_function_definition(&self) -> Value {
        serde_json::json!({
            "name": self.name,
            "description": self.description,
            "input_schema": self.args_schema,
        })
    }
}

#[cfg(test)]
mod tests {
    use futures::FutureExt;

    use super::*;

    fn echo_tool() -> DynamicStructuredTool {
        let func: StructuredToolFn = Arc::new(|args: ToolArgs| {
            async move {
                let text = args.get("text").and_then(Value::as_str).unwrap_or("");
                format!("echo: {}", text)
            }
            .boxed()
        });
        DynamicStructuredTool::new(
            "echo",
            "Echo the text back",
            serde_json::json!({
                "type": "object",
                "properties": { "text": { "type": "string" } },
                "required": ["text"]
            }),
            func,
        )
    }

    #[tokio::test]
    async fn test_invoke_object() {
        let tool = echo_tool();
        let out = tool.invoke(serde_json::json!({"text": "hi"})).await.unwrap();
        assert_eq!(out, "echo: hi");
    }

    #[tokio::test]
    async fn test_invoke_json_string() {
        let tool = echo_tool();
        let out = tool
            .invoke(Value::String(r#"{"text": "from string"}"#.to_string()))
            .await
            .unwrap();
        assert_eq!(out, "echo: from string");
    }

    #[tokio::test]
    async fn test_missing_required() {
        let tool = echo_tool();
        let err = tool.invoke(serde_json::json!({})).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments { ref tool, .. } if tool == "echo"));
        assert!(err.to_string().contains(r#""text" is a required property"#));
    }

    #[tokio::test]
    async fn test_wrong_type() {
        let tool = echo_tool();
        let err = tool.invoke(serde_json::json!({"text": 42})).await.unwrap_err();
        assert!(err.to_string().contains(r#"is not of type "string""#));
        assert!(err.to_string().contains("/text"));
    }

    #[tokio::test]
    async fn test_null_required_field_is_rejected() {
        let tool = echo_tool();
        assert!(tool.invoke(serde_json::json!({"text": null})).await.is_err());
    }

    #[tokio::test]
    async fn test_full_schema_keywords_are_enforced() {
        let func: StructuredToolFn =
            Arc::new(|_args: ToolArgs| async move { "ok".to_string() }.boxed());
        let tool = DynamicStructuredTool::new(
            "pick",
            "Pick a size",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "size": { "type": "string", "enum": ["small", "large"] },
                    "label": { "type": "string", "minLength": 2 }
                },
                "required": ["size"],
                "additionalProperties": false
            }),
            func,
        );

        assert_eq!(
            tool.invoke(serde_json::json!({"size": "small", "label": "ab"})).await.unwrap(),
            "ok"
        );
        assert!(tool.invoke(serde_json::json!({"size": "medium"})).await.is_err());
        assert!(tool.invoke(serde_json::json!({"size": "large", "label": "a"})).await.is_err());
        assert!(tool.invoke(serde_json::json!({"size": "large", "extra": 1})).await.is_err());
    }

    #[tokio::test]
    async fn test_uncompilable_schema_rejects_every_call() {
        let func: StructuredToolFn =
            Arc::new(|_args: ToolArgs| async move { "ran".to_string() }.boxed());
        let tool = DynamicStructuredTool::new(
            "broken",
            "Schema with an invalid type keyword",
            serde_json::json!({ "type": "object", "properties": { "x": { "type": 12 } } }),
            func,
        );
        let err = tool.invoke(serde_json::json!({"x": 1})).await.unwrap_err();
        assert!(err.to_string().contains("invalid argument schema"));
    }

    #[tokio::test]
    async fn test_non_object_input() {
        let tool = echo_tool();
        assert!(tool.invoke(serde_json::json!([1, 2])).await.is_err());
    }

    #[test]
    fn test_schema_accessors() {
        let tool = echo_tool();
        assert_eq!(tool.required_args(), vec!["text"]);
        assert!(tool.args().get("text").is_some());
        assert_eq!(tool.to_function_definition()["name"], "echo");
        assert_eq!(
            tool.to_string(),
            "DynamicStructuredTool(name='echo', description='Echo the text back')"
        );
    }

    #[tokio::test]
    async fn test_clones_share_function() {
        let tool = echo_tool();
        let clone = tool.clone();
        let mut args = ToolArgs::new();
        args.insert("text".to_string(), Value::String("x".to_string()));
        assert_eq!(clone.call(args).await, "echo: x");
    }
}
