//! Typed access to a node's input values.
//!
//! [`ResolvedInputs::read`] checks that every non-optional input is present
//! (a declared default counts as present) and then hands out typed values,
//! falling back to the descriptor default when the host sent nothing.

use serde_json::Value;

use super::descriptor::{CapabilityDescriptor, InputSpec, InputType};
use super::error::NodeError;
use super::node::NodeData;

/// Input values of one invocation, checked against the descriptor.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedInputs<'a> {
    descriptor: &'a CapabilityDescriptor,
    data: &'a NodeData,
}

/// Empty strings and `null` count as "not set", as the host sends them for
/// cleared form fields.
fn is_unset(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

impl<'a> ResolvedInputs<'a> {
    /// Check required inputs and wrap the data for typed access.
    pub fn read(descriptor: &'a CapabilityDescriptor, data: &'a NodeData) -> Result<Self, NodeError> {
        for spec in descriptor.inputs() {
            if spec.optional || spec.default.is_some() {
                continue;
            }
            match data.inputs.get(&spec.name) {
                Some(v) if !is_unset(v) => {}
                _ => return Err(NodeError::missing_input(&spec.name)),
            }
        }
        Ok(Self { descriptor, data })
    }

    fn spec(&self, name: &str) -> Result<&'a InputSpec, NodeError> {
        self.descriptor.input(name).ok_or_else(|| {
            NodeError::configuration(format!(
                "Node '{}' declares no input '{}'",
                self.descriptor.name(),
                name
            ))
        })
    }

    /// The user's value, or the declared default.
    fn raw(&self, name: &str) -> Result<Option<&'a Value>, NodeError> {
        let spec = self.spec(name)?;
        match self.data.inputs.get(name) {
            Some(v) if !is_unset(v) => Ok(Some(v)),
            _ => Ok(spec.default.as_ref().filter(|d| !is_unset(d))),
        }
    }

    fn type_error(&self, name: &str, expected: &str, got: &Value) -> NodeError {
        NodeError::configuration(format!(
            "Input '{}' of node '{}' must be {}, got {}",
            name,
            self.descriptor.name(),
            expected,
            got
        ))
    }

    /// A `string` (or any scalar rendered as text) input.
    pub fn string(&self, name: &str) -> Result<Option<String>, NodeError> {
        match self.raw(name)? {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(v @ (Value::Number(_) | Value::Bool(_))) => Ok(Some(v.to_string())),
            Some(other) => Err(self.type_error(name, "a string", other)),
        }
    }

    /// A `number` input. Numeric strings are accepted, as hosts often store
    /// form values as text.
    pub fn number(&self, name: &str) -> Result<Option<f64>, NodeError> {
        match self.raw(name)? {
            None => Ok(None),
            Some(Value::Number(n)) => n
                .as_f64()
                .map(Some)
                .ok_or_else(|| self.type_error(name, "a number", &Value::Number(n.clone()))),
            Some(v @ Value::String(s)) => s
                .trim()
                .parse::<f64>()
                .map(Some)
                .map_err(|_| self.type_error(name, "a number", v)),
            Some(other) => Err(self.type_error(name, "a number", other)),
        }
    }

    /// An integral `number` input within the `i64` range.
    pub fn integer(&self, name: &str) -> Result<Option<i64>, NodeError> {
        // 2^63 as f64; `i64::MAX as f64` rounds up to it.
        const UPPER: f64 = 9_223_372_036_854_775_808.0;
        match self.number(name)? {
            None => Ok(None),
            Some(n) if n.fract() != 0.0 => {
                Err(self.type_error(name, "an integer", &serde_json::json!(n)))
            }
            Some(n) if n < -UPPER || n >= UPPER => Err(NodeError::configuration(format!(
                "Input '{}' of node '{}' is out of range, got {}",
                name,
                self.descriptor.name(),
                n
            ))),
            Some(n) => Ok(Some(n as i64)),
        }
    }

    /// A `boolean` input. `"true"`/`"false"` strings are accepted.
    pub fn boolean(&self, name: &str) -> Result<Option<bool>, NodeError> {
        match self.raw(name)? {
            None => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(v @ Value::String(s)) => match s.trim() {
                "true" => Ok(Some(true)),
                "false" => Ok(Some(false)),
                _ => Err(self.type_error(name, "a boolean", v)),
            },
            Some(other) => Err(self.type_error(name, "a boolean", other)),
        }
    }

    /// An `options` input; the value must be one of the declared choices.
    pub fn option(&self, name: &str) -> Result<Option<String>, NodeError> {
        let spec = self.spec(name)?;
        let value = match self.raw(name)? {
            None => return Ok(None),
            Some(Value::String(s)) => s.clone(),
            Some(other) => return Err(self.type_error(name, "a string", other)),
        };
        if spec.input_type == InputType::Options && !spec.has_choice(&value) {
            return Err(NodeError::configuration(format!(
                "'{}' is not a valid choice for input '{}'",
                value, name
            )));
        }
        Ok(Some(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::descriptor::OptionChoice;

    fn descriptor() -> CapabilityDescriptor {
        CapabilityDescriptor::builder("n", "N", "N")
            .input(InputSpec::string("required", "Required"))
            .input(
                InputSpec::options(
                    "size",
                    "Size",
                    vec![OptionChoice::new("s", "S"), OptionChoice::new("l", "L")],
                )
                .with_default("s"),
            )
            .input(InputSpec::number("temperature", "Temperature").optional())
            .input(InputSpec::boolean("flag", "Flag").with_default(false))
            .build()
    }

    #[test]
    fn test_missing_required_input() {
        let d = descriptor();
        let data = NodeData::new("x");
        let err = ResolvedInputs::read(&d, &data).unwrap_err();
        assert_eq!(err.to_string(), "Configuration error: Input 'required' is required");
    }

    #[test]
    fn test_blank_required_input_is_missing() {
        let d = descriptor();
        let data = NodeData::new("x").with_input("required", "   ");
        assert!(ResolvedInputs::read(&d, &data).is_err());
    }

    #[test]
    fn test_defaults_fill_unset_values() {
        let d = descriptor();
        let data = NodeData::new("x").with_input("required", "yes");
        let inputs = ResolvedInputs::read(&d, &data).unwrap();
        assert_eq!(inputs.option("size").unwrap().as_deref(), Some("s"));
        assert_eq!(inputs.boolean("flag").unwrap(), Some(false));
        assert_eq!(inputs.number("temperature").unwrap(), None);
    }

    #[test]
    fn test_numeric_strings() {
        let d = descriptor();
        let data = NodeData::new("x")
            .with_input("required", "yes")
            .with_input("temperature", "0.7");
        let inputs = ResolvedInputs::read(&d, &data).unwrap();
        assert_eq!(inputs.number("temperature").unwrap(), Some(0.7));
    }

    #[test]
    fn test_invalid_number() {
        let d = descriptor();
        let data = NodeData::new("x")
            .with_input("required", "yes")
            .with_input("temperature", "warm");
        let inputs = ResolvedInputs::read(&d, &data).unwrap();
        assert!(inputs.number("temperature").is_err());
    }

    #[test]
    fn test_invalid_choice() {
        let d = descriptor();
        let data = NodeData::new("x")
            .with_input("required", "yes")
            .with_input("size", "xl");
        let inputs = ResolvedInputs::read(&d, &data).unwrap();
        let err = inputs.option("size").unwrap_err();
        assert!(err.to_string().contains("not a valid choice"));
    }

    #[test]
    fn test_integer_rejects_fractions() {
        let d = descriptor();
        let data = NodeData::new("x")
            .with_input("required", "yes")
            .with_input("temperature", 1.5);
        let inputs = ResolvedInputs::read(&d, &data).unwrap();
        assert!(inputs.integer("temperature").is_err());
    }

    #[test]
    fn test_integer_rejects_out_of_range() {
        let d = descriptor();
        for value in [serde_json::json!(1e20), serde_json::json!("-1e20"), serde_json::json!(9.3e18)] {
            let data = NodeData::new("x")
                .with_input("required", "yes")
                .with_input("temperature", value);
            let inputs = ResolvedInputs::read(&d, &data).unwrap();
            let err = inputs.integer("temperature").unwrap_err();
            assert!(matches!(err, NodeError::Configuration(_)));
            assert!(err.to_string().contains("out of range"));
        }

        let data = NodeData::new("x")
            .with_input("required", "yes")
            .with_input("temperature", -9_223_372_036_854_775_808.0);
        let inputs = ResolvedInputs::read(&d, &data).unwrap();
        assert_eq!(inputs.integer("temperature").unwrap(), Some(i64::MIN));
    }

    #[test]
    fn test_undeclared_input() {
        let d = descriptor();
        let data = NodeData::new("x").with_input("required", "yes");
        let inputs = ResolvedInputs::read(&d, &data).unwrap();
        assert!(inputs.string("nope").is_err());
    }
}
