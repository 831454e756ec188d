//! Request validation against an [`OperationSpec`].
//!
//! Parameter schemas are compiled once when the validator is built. A call is
//! then checked parameter by parameter in declaration order; the first missing
//! or invalid value decides the `400` answer. "Present but invalid" and
//! "absent but required" produce the same message.

use crate::call::Call;
use crate::error::{CodedError, ConfigError};
use crate::spec::{OperationSpec, ParameterLocation, ParameterMeta, ParameterStyle};
use jsonschema::Validator;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Body of the `400` answered when a required body is missing or does not match its schema.
pub const BODY_FAILURE_MESSAGE: &str = "invalid or missing request body";

fn schema_type(schema: Option<&Value>) -> Option<&str> {
    schema.and_then(|s| s.get("type")).and_then(Value::as_str)
}

/// Decode a raw parameter value into typed JSON according to its schema.
///
/// Values that do not parse as the declared type stay strings, so the schema
/// check rejects them.
#[must_use]
pub fn decode_param_value(value: &str, schema: Option<&Value>, style: Option<ParameterStyle>) -> Value {
    fn convert_primitive(val: &str, schema: Option<&Value>) -> Value {
        match schema_type(schema) {
            Some("integer") => val
                .parse::<i64>()
                .map(Value::from)
                .unwrap_or_else(|_| Value::String(val.to_string())),
            Some("number") => val
                .parse::<f64>()
                .map(Value::from)
                .unwrap_or_else(|_| Value::String(val.to_string())),
            Some("boolean") => val
                .parse::<bool>()
                .map(Value::from)
                .unwrap_or_else(|_| Value::String(val.to_string())),
            _ => Value::String(val.to_string()),
        }
    }

    match schema_type(schema) {
        Some("array") => {
            let items_schema = schema.and_then(|s| s.get("items"));
            let delim = style.unwrap_or(ParameterStyle::Form).delimiter();
            let parts = value
                .split(delim)
                .filter(|s| !s.is_empty())
                .map(|p| convert_primitive(p.trim(), items_schema))
                .collect::<Vec<_>>();
            Value::Array(parts)
        }
        Some("object") => {
            serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()))
        }
        _ => convert_primitive(value, schema),
    }
}

fn compile(name: &str, schema: Option<&Value>) -> Result<Option<Arc<Validator>>, ConfigError> {
    let Some(schema) = schema else {
        return Ok(None);
    };
    jsonschema::validator_for(schema)
        .map(|v| Some(Arc::new(v)))
        .map_err(|e| ConfigError::InvalidSchema {
            parameter: name.to_string(),
            reason: e.to_string(),
        })
}

struct CompiledParameter {
    meta: ParameterMeta,
    validator: Option<Arc<Validator>>,
}

impl CompiledParameter {
    /// The value for this parameter on `call`, decoded; `None` when absent.
    fn extract(&self, call: &Call) -> Option<Value> {
        let schema = self.meta.schema.as_ref();
        let name = self.meta.name.as_str();
        let style = self.meta.style;
        let raw = match self.meta.location {
            ParameterLocation::Query => {
                let values = call.request.query_values(name);
                // Repeated `?tag=a&tag=b` form an array
                if values.len() > 1 && schema_type(schema) == Some("array") {
                    let items = schema.and_then(|s| s.get("items"));
                    return Some(Value::Array(
                        values
                            .iter()
                            .map(|v| decode_param_value(v, items, None))
                            .collect(),
                    ));
                }
                values.first().map(String::as_str)
            }
            ParameterLocation::Header => call.request.header(name),
            ParameterLocation::Path => call.path_param(name),
            ParameterLocation::Cookie => call.request.cookie(name),
        }?;
        Some(decode_param_value(raw, schema, style))
    }
}

/// Compiled validation rules of one operation.
pub struct OperationValidator {
    operation: String,
    parameters: Vec<CompiledParameter>,
    body_required: bool,
    body: Option<Arc<Validator>>,
    /// Body schema declares `type: string`
    text_body: bool,
}

impl OperationValidator {
    pub fn new(op: &OperationSpec) -> Result<Self, ConfigError> {
        let parameters = op
            .parameters
            .iter()
            .map(|meta| {
                Ok(CompiledParameter {
                    validator: compile(&meta.name, meta.schema.as_ref())?,
                    meta: meta.clone(),
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;
        Ok(Self {
            operation: op.to_string(),
            parameters,
            body_required: op.request_body_required,
            body: compile("requestBody", op.request_schema.as_ref())?,
            text_body: schema_type(op.request_schema.as_ref()) == Some("string"),
        })
    }

    /// Operation label, `"<METHOD> <path>"`.
    #[must_use]
    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Check every declared parameter, then the body.
    pub fn validate(&self, call: &Call) -> Result<(), CodedError> {
        for param in &self.parameters {
            let meta = &param.meta;
            let valid = match param.extract(call) {
                None => !meta.required,
                Some(value) => param
                    .validator
                    .as_ref()
                    .map_or(true, |v| v.is_valid(&value)),
            };
            if !valid {
                debug!(
                    request_id = %call.request_id(),
                    operation = %self.operation,
                    parameter = %meta.name,
                    location = %meta.location,
                    required = meta.required,
                    "Parameter validation failed"
                );
                return Err(CodedError::bad_request(meta.location.failure_message()));
            }
        }
        self.validate_body(call)
    }

    fn validate_body(&self, call: &Call) -> Result<(), CodedError> {
        if !call.request.has_body() {
            if self.body_required {
                debug!(
                    request_id = %call.request_id(),
                    operation = %self.operation,
                    "Required request body missing"
                );
                return Err(CodedError::bad_request(BODY_FAILURE_MESSAGE));
            }
            return Ok(());
        }
        let Some(validator) = &self.body else {
            return Ok(());
        };
        let text = call.request.body_text();
        // A string schema takes the raw text unless the body is a quoted JSON string
        let body = if self.text_body && !text.trim_start().starts_with('"') {
            Value::String(text.into_owned())
        } else {
            match serde_json::from_str::<Value>(&text) {
                Ok(value) => value,
                Err(_) => Value::String(text.into_owned()),
            }
        };
        if validator.is_valid(&body) {
            Ok(())
        } else {
            debug!(
                request_id = %call.request_id(),
                operation = %self.operation,
                "Request body does not match schema"
            );
            Err(CodedError::bad_request(BODY_FAILURE_MESSAGE))
        }
    }
}
