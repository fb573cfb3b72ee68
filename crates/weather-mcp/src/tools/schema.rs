//! Tool descriptors, parameter specs, and schema-driven argument validation.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::types::{ArgumentProblem, McpError, McpResult, ToolDefinition};

use super::arguments::{ArgValue, Arguments, ValidatedArgs};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Number,
    Boolean,
}

impl ParamType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Number => "number",
            ParamType::Boolean => "boolean",
        }
    }

    pub fn matches(&self, value: &ArgValue) -> bool {
        matches!(
            (self, value),
            (ParamType::String, ArgValue::String(_))
                | (ParamType::Number, ArgValue::Number(_))
                | (ParamType::Boolean, ArgValue::Boolean(_))
        )
    }

    fn from_schema(name: &str) -> Option<Self> {
        match name {
            "string" => Some(ParamType::String),
            "number" | "integer" => Some(ParamType::Number),
            "boolean" => Some(ParamType::Boolean),
            _ => None,
        }
    }
}

/// Extra constraint on a string parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamFormat {
    /// `YYYY-MM-DD`.
    Date,
}

impl ParamFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamFormat::Date => "date",
        }
    }

    pub fn accepts(&self, value: &str) -> bool {
        match self {
            ParamFormat::Date => weather_forecast::parse_date(value).is_ok(),
        }
    }

    fn expected(&self) -> &'static str {
        match self {
            ParamFormat::Date => "YYYY-MM-DD",
        }
    }

    fn from_schema(name: &str) -> Option<Self> {
        match name {
            "date" => Some(ParamFormat::Date),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterSpec {
    pub name: String,
    pub param_type: ParamType,
    pub required: bool,
    pub description: Option<String>,
    pub format: Option<ParamFormat>,
}

impl ParameterSpec {
    pub fn new(name: impl Into<String>, param_type: ParamType) -> Self {
        Self {
            name: name.into(),
            param_type,
            required: false,
            description: None,
            format: None,
        }
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, ParamType::String)
    }

    pub fn number(name: impl Into<String>) -> Self {
        Self::new(name, ParamType::Number)
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, ParamType::Boolean)
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn format(mut self, format: ParamFormat) -> Self {
        self.format = Some(format);
        self
    }

    fn to_schema(&self) -> Value {
        let mut property = Map::new();
        property.insert("type".into(), json!(self.param_type.as_str()));
        if let Some(description) = &self.description {
            property.insert("description".into(), json!(description));
        }
        if let Some(format) = self.format {
            property.insert("format".into(), json!(format.as_str()));
        }
        Value::Object(property)
    }

    /// Check one value against this spec. `None`, `null` and, for optional
    /// strings, a blank value all mean unset.
    fn check(&self, value: Option<&ArgValue>) -> McpResult<Option<ArgValue>> {
        let value = match value {
            None | Some(ArgValue::Null) => {
                if self.required {
                    return Err(McpError::invalid_argument(
                        &self.name,
                        ArgumentProblem::Missing,
                        "is required",
                    ));
                }
                return Ok(None);
            }
            Some(value) => value,
        };

        if !self.param_type.matches(value) {
            return Err(McpError::invalid_argument(
                &self.name,
                ArgumentProblem::WrongType,
                format!(
                    "expected {}, got {}",
                    self.param_type.as_str(),
                    value.type_name()
                ),
            ));
        }

        if let ArgValue::String(s) = value {
            if s.trim().is_empty() {
                if self.required {
                    return Err(McpError::invalid_argument(
                        &self.name,
                        ArgumentProblem::Missing,
                        "must not be empty",
                    ));
                }
                return Ok(None);
            }
            if let Some(format) = self.format {
                if !format.accepts(s) {
                    return Err(McpError::invalid_argument(
                        &self.name,
                        ArgumentProblem::BadFormat,
                        format!("expected {}, got '{s}'", format.expected()),
                    ));
                }
            }
        }

        Ok(Some(value.clone()))
    }
}

/// Name, description, and ordered parameters of one tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: Option<String>,
    pub parameters: Vec<ParameterSpec>,
}

impl ToolDescriptor {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: Some(description.into()),
            parameters: Vec::new(),
        }
    }

    pub fn param(mut self, spec: ParameterSpec) -> Self {
        self.parameters.push(spec);
        self
    }

    pub fn parameter(&self, name: &str) -> Option<&ParameterSpec> {
        self.parameters.iter().find(|p| p.name == name)
    }

    pub fn required_names(&self) -> BTreeSet<&str> {
        self.parameters
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect()
    }

    pub fn optional_names(&self) -> BTreeSet<&str> {
        self.parameters
            .iter()
            .filter(|p| !p.required)
            .map(|p| p.name.as_str())
            .collect()
    }

    /// Validate call arguments in declaration order; the first violation wins.
    pub fn validate(&self, arguments: &Arguments) -> McpResult<ValidatedArgs> {
        let mut values = Arguments::new();
        for spec in &self.parameters {
            if let Some(value) = spec.check(arguments.get(&spec.name))? {
                values.insert(spec.name.clone(), value);
            }
        }

        for key in arguments.keys() {
            if self.parameter(key).is_none() {
                tracing::debug!("Ignoring undeclared argument '{key}' for tool {}", self.name);
            }
        }

        Ok(ValidatedArgs::new(values))
    }

    /// JSON Schema wire form.
    pub fn to_definition(&self) -> ToolDefinition {
        let properties: Map<String, Value> = self
            .parameters
            .iter()
            .map(|p| (p.name.clone(), p.to_schema()))
            .collect();
        let required: Vec<&str> = self
            .parameters
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect();

        ToolDefinition {
            name: self.name.clone(),
            description: self.description.clone(),
            input_schema: json!({
                "type": "object",
                "properties": properties,
                "required": required,
            }),
        }
    }

    /// Parse a peer's wire definition back into a descriptor.
    pub fn from_definition(definition: &ToolDefinition) -> McpResult<Self> {
        let schema = definition.input_schema.as_object().ok_or_else(|| {
            McpError::InvalidParams(format!(
                "inputSchema of tool '{}' must be an object",
                definition.name
            ))
        })?;

        let required: BTreeSet<&str> = match schema.get("required") {
            None | Some(Value::Null) => BTreeSet::new(),
            Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
            Some(_) => {
                return Err(McpError::InvalidParams(format!(
                    "required list of tool '{}' must be an array",
                    definition.name
                )))
            }
        };

        let empty = Map::new();
        let properties = match schema.get("properties") {
            None | Some(Value::Null) => &empty,
            Some(Value::Object(map)) => map,
            Some(_) => {
                return Err(McpError::InvalidParams(format!(
                    "properties of tool '{}' must be an object",
                    definition.name
                )))
            }
        };

        let mut parameters = Vec::with_capacity(properties.len());
        for (name, property) in properties {
            let type_name = property.get("type").and_then(Value::as_str).unwrap_or("");
            let param_type = ParamType::from_schema(type_name).ok_or_else(|| {
                McpError::InvalidParams(format!(
                    "parameter '{name}' of tool '{}' has unsupported type '{type_name}'",
                    definition.name
                ))
            })?;

            parameters.push(ParameterSpec {
                name: name.clone(),
                param_type,
                required: required.contains(name.as_str()),
                description: property
                    .get("description")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                format: property
                    .get("format")
                    .and_then(Value::as_str)
                    .and_then(ParamFormat::from_schema),
            });
        }

        if let Some(missing) = required.iter().find(|r| !properties.contains_key(**r)) {
            return Err(McpError::InvalidParams(format!(
                "tool '{}' requires undeclared parameter '{missing}'",
                definition.name
            )));
        }

        Ok(Self {
            name: definition.name.clone(),
            description: definition.description.clone(),
            parameters,
        })
    }
}
