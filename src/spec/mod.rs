//! OpenAPI operation tables.
//!
//! [`load_spec`] reads a document with `oas3` and flattens it into an
//! [`ApiSpec`]: one [`OperationSpec`] per (path, method) with its parameters,
//! body requirement and response examples.

mod build;
mod load;
mod types;

pub use build::{
    base_path, build_api_spec, expand_schema_refs, extract_parameters, extract_request_schema,
    extract_response_examples, resolve_schema_ref,
};
pub use load::{load_spec, parse_spec};
pub use types::{
    ApiSpec, OperationSpec, ParameterLocation, ParameterMeta, ParameterStyle, ResponseExamples,
};
