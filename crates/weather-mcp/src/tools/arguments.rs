//! Tool-call argument values.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{ArgumentProblem, McpError, McpResult, ToolCallParams};

/// A scalar argument value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArgValue {
    Null,
    Boolean(bool),
    Number(f64),
    String(String),
}

impl ArgValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            ArgValue::Null => "null",
            ArgValue::Boolean(_) => "boolean",
            ArgValue::Number(_) => "number",
            ArgValue::String(_) => "string",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ArgValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ArgValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ArgValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ArgValue::Null)
    }
}

impl TryFrom<Value> for ArgValue {
    /// Kind of the rejected JSON value.
    type Error = &'static str;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Null => Ok(ArgValue::Null),
            Value::Bool(b) => Ok(ArgValue::Boolean(b)),
            Value::Number(n) => n.as_f64().map(ArgValue::Number).ok_or("number"),
            Value::String(s) => Ok(ArgValue::String(s)),
            Value::Array(_) => Err("array"),
            Value::Object(_) => Err("object"),
        }
    }
}

impl From<ArgValue> for Value {
    fn from(value: ArgValue) -> Self {
        match value {
            ArgValue::Null => Value::Null,
            ArgValue::Boolean(b) => Value::Bool(b),
            ArgValue::Number(n) => serde_json::Number::from_f64(n)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            ArgValue::String(s) => Value::String(s),
        }
    }
}

impl From<&str> for ArgValue {
    fn from(value: &str) -> Self {
        ArgValue::String(value.to_string())
    }
}

impl From<String> for ArgValue {
    fn from(value: String) -> Self {
        ArgValue::String(value)
    }
}

impl From<f64> for ArgValue {
    fn from(value: f64) -> Self {
        ArgValue::Number(value)
    }
}

impl From<bool> for ArgValue {
    fn from(value: bool) -> Self {
        ArgValue::Boolean(value)
    }
}

pub type Arguments = BTreeMap<String, ArgValue>;

/// One tool invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct CallRequest {
    pub name: String,
    pub arguments: Arguments,
}

impl CallRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: Arguments::new(),
        }
    }

    pub fn arg(mut self, key: impl Into<String>, value: impl Into<ArgValue>) -> Self {
        self.arguments.insert(key.into(), value.into());
        self
    }

    /// Convert wire params into a request. Only scalar values are accepted.
    pub fn from_params(params: ToolCallParams) -> McpResult<Self> {
        let object = match params.arguments {
            None | Some(Value::Null) => serde_json::Map::new(),
            Some(Value::Object(map)) => map,
            Some(_) => {
                return Err(McpError::InvalidParams(
                    "tool arguments must be an object".to_string(),
                ))
            }
        };

        let mut arguments = Arguments::new();
        for (key, value) in object {
            let value = ArgValue::try_from(value).map_err(|kind| {
                McpError::invalid_argument(
                    key.as_str(),
                    ArgumentProblem::WrongType,
                    format!("expected a string, number, boolean or null, got {kind}"),
                )
            })?;
            arguments.insert(key, value);
        }

        Ok(Self {
            name: params.name,
            arguments,
        })
    }

    /// Wire params for this request.
    pub fn to_params(&self) -> ToolCallParams {
        let arguments: serde_json::Map<String, Value> = self
            .arguments
            .iter()
            .map(|(k, v)| (k.clone(), Value::from(v.clone())))
            .collect();
        ToolCallParams {
            name: self.name.clone(),
            arguments: Some(Value::Object(arguments)),
        }
    }
}

/// Arguments that passed schema validation.
///
/// Only declared parameters that were set are present; an absent optional
/// parameter reads as `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidatedArgs {
    values: Arguments,
}

impl ValidatedArgs {
    pub(crate) fn new(values: Arguments) -> Self {
        Self { values }
    }

    pub fn get(&self, name: &str) -> Option<&ArgValue> {
        self.values.get(name)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(ArgValue::as_str)
    }

    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(ArgValue::as_f64)
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(ArgValue::as_bool)
    }

    pub fn is_set(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(arguments: Value) -> ToolCallParams {
        ToolCallParams {
            name: "weather".to_string(),
            arguments: Some(arguments),
        }
    }

    #[test]
    fn test_scalars_convert() {
        let req = CallRequest::from_params(params(json!({
            "city": "Warsaw",
            "days": 3,
            "metric": true,
            "toDate": null
        })))
        .unwrap();

        assert_eq!(req.name, "weather");
        assert_eq!(req.arguments["city"], ArgValue::String("Warsaw".into()));
        assert_eq!(req.arguments["days"], ArgValue::Number(3.0));
        assert_eq!(req.arguments["metric"], ArgValue::Boolean(true));
        assert!(req.arguments["toDate"].is_null());
    }

    #[test]
    fn test_missing_arguments_is_empty_map() {
        let req = CallRequest::from_params(ToolCallParams {
            name: "weather".to_string(),
            arguments: None,
        })
        .unwrap();
        assert!(req.arguments.is_empty());
    }

    #[test]
    fn test_compound_values_rejected() {
        let err = CallRequest::from_params(params(json!({ "city": ["Warsaw"] }))).unwrap_err();
        match err {
            McpError::InvalidArgument {
                parameter, problem, ..
            } => {
                assert_eq!(parameter, "city");
                assert_eq!(problem, ArgumentProblem::WrongType);
            }
            other => panic!("expected InvalidArgument, got {other:?}"),
        }

        let err = CallRequest::from_params(params(json!("Warsaw"))).unwrap_err();
        assert!(matches!(err, McpError::InvalidParams(_)));
    }

    #[test]
    fn test_to_params_round_trip() {
        let req = CallRequest::new("weather")
            .arg("city", "Warsaw")
            .arg("country", "Poland");
        let back = CallRequest::from_params(req.to_params()).unwrap();
        assert_eq!(back, req);
    }
}
