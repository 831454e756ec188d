use http::Method;
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterLocation {
    Path,
    Query,
    Header,
    Cookie,
}

impl ParameterLocation {
    /// Lower-case name as used in OpenAPI `in:` and in validation messages.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterLocation::Path => "path",
            ParameterLocation::Query => "query",
            ParameterLocation::Header => "header",
            ParameterLocation::Cookie => "cookie",
        }
    }

    /// Body of the 400 answered when a parameter at this location is missing or invalid.
    #[must_use]
    pub fn failure_message(&self) -> String {
        format!("invalid or missing {} param", self.as_str())
    }
}

impl fmt::Display for ParameterLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<oas3::spec::ParameterIn> for ParameterLocation {
    fn from(loc: oas3::spec::ParameterIn) -> Self {
        match loc {
            oas3::spec::ParameterIn::Path => ParameterLocation::Path,
            oas3::spec::ParameterIn::Query => ParameterLocation::Query,
            oas3::spec::ParameterIn::Header => ParameterLocation::Header,
            oas3::spec::ParameterIn::Cookie => ParameterLocation::Cookie,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterStyle {
    Matrix,
    Label,
    Form,
    Simple,
    SpaceDelimited,
    PipeDelimited,
    DeepObject,
}

impl ParameterStyle {
    /// Separator between array items for this style.
    #[must_use]
    pub fn delimiter(&self) -> char {
        match self {
            ParameterStyle::SpaceDelimited => ' ',
            ParameterStyle::PipeDelimited => '|',
            _ => ',',
        }
    }
}

impl From<oas3::spec::ParameterStyle> for ParameterStyle {
    fn from(style: oas3::spec::ParameterStyle) -> Self {
        use oas3::spec::ParameterStyle as PS;
        match style {
            PS::Matrix => ParameterStyle::Matrix,
            PS::Label => ParameterStyle::Label,
            PS::Form => ParameterStyle::Form,
            PS::Simple => ParameterStyle::Simple,
            PS::SpaceDelimited => ParameterStyle::SpaceDelimited,
            PS::PipeDelimited => ParameterStyle::PipeDelimited,
            PS::DeepObject => ParameterStyle::DeepObject,
        }
    }
}

/// A declared operation parameter. `schema` is the validation rule.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterMeta {
    pub name: String,
    pub location: ParameterLocation,
    pub required: bool,
    pub schema: Option<Value>,
    pub style: Option<ParameterStyle>,
}

impl ParameterMeta {
    #[must_use]
    pub fn new(name: impl Into<String>, location: ParameterLocation, required: bool) -> Self {
        Self {
            name: name.into(),
            location,
            required,
            schema: None,
            style: None,
        }
    }

    #[must_use]
    pub fn with_schema(mut self, schema: Value) -> Self {
        self.schema = Some(schema);
        self
    }
}

/// Named examples of the response an operation answers with.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseExamples {
    pub status: u16,
    pub content_type: String,
    /// Declaration order is kept; the first entry is the default.
    pub examples: Vec<(String, Value)>,
}

impl Default for ResponseExamples {
    fn default() -> Self {
        Self {
            status: 200,
            content_type: "application/json".to_string(),
            examples: Vec::new(),
        }
    }
}

impl ResponseExamples {
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.examples
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.examples.iter().map(|(n, _)| n.as_str()).collect()
    }
}

/// One (method, path template) of an API description.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationSpec {
    pub method: Method,
    pub path_pattern: String,
    pub operation_id: Option<String>,
    pub parameters: Vec<ParameterMeta>,
    pub request_body_required: bool,
    pub request_schema: Option<Value>,
    pub response: ResponseExamples,
}

impl OperationSpec {
    #[must_use]
    pub fn new(method: Method, path_pattern: impl Into<String>) -> Self {
        Self {
            method,
            path_pattern: path_pattern.into(),
            operation_id: None,
            parameters: Vec::new(),
            request_body_required: false,
            request_schema: None,
            response: ResponseExamples::default(),
        }
    }

    #[must_use]
    pub fn with_parameter(mut self, parameter: ParameterMeta) -> Self {
        self.parameters.push(parameter);
        self
    }

    #[must_use]
    pub fn with_example(mut self, name: impl Into<String>, value: Value) -> Self {
        self.response.examples.push((name.into(), value));
        self
    }

    #[must_use]
    pub fn with_required_body(mut self) -> Self {
        self.request_body_required = true;
        self
    }

    #[must_use]
    pub fn with_status(mut self, status: u16) -> Self {
        self.response.status = status;
        self
    }
}

impl fmt::Display for OperationSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path_pattern)
    }
}

/// The operation table of an API description.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApiSpec {
    pub title: String,
    /// Path of the first server URL, without a trailing `/` (empty for none).
    pub base_path: String,
    pub operations: Vec<OperationSpec>,
}

impl ApiSpec {
    #[must_use]
    pub fn operation(&self, method: &Method, path_pattern: &str) -> Option<&OperationSpec> {
        self.operations
            .iter()
            .find(|op| op.method == *method && op.path_pattern == path_pattern)
    }
}
