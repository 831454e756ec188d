use super::types::{
    ApiSpec, OperationSpec, ParameterLocation, ParameterMeta, ParameterStyle, ResponseExamples,
};
use oas3::spec::{MediaType, MediaTypeExamples, ObjectOrReference, Operation, Parameter};
use oas3::OpenApiV3Spec;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Resolve a JSON Schema `$ref` to the actual schema definition
///
/// Only local references into `#/components/schemas/` are supported.
pub fn resolve_schema_ref<'a>(
    spec: &'a OpenApiV3Spec,
    ref_path: &str,
) -> Option<&'a oas3::spec::ObjectSchema> {
    let name = ref_path.strip_prefix("#/components/schemas/")?;
    spec.components
        .as_ref()?
        .schemas
        .get(name)
        .and_then(|schema_ref| match schema_ref {
            ObjectOrReference::Object(schema) => Some(schema),
            _ => None,
        })
}

/// Recursively replace `$ref` objects inside `value` with the schemas they
/// point to. Unresolvable references are left in place.
pub fn expand_schema_refs(spec: &OpenApiV3Spec, value: &mut Value) {
    expand_schema_refs_at(spec, value, 0);
}

fn expand_schema_refs_at(spec: &OpenApiV3Spec, value: &mut Value, depth: usize) {
    // Self-referencing schemas would otherwise expand forever
    if depth > 16 {
        return;
    }
    match value {
        Value::Object(obj) => {
            if let Some(ref_path) = obj.get("$ref").and_then(|v| v.as_str()) {
                if let Some(mut resolved) =
                    resolve_schema_ref(spec, ref_path).and_then(|s| serde_json::to_value(s).ok())
                {
                    expand_schema_refs_at(spec, &mut resolved, depth + 1);
                    *value = resolved;
                    return;
                }
            }
            for v in obj.values_mut() {
                expand_schema_refs_at(spec, v, depth + 1);
            }
        }
        Value::Array(arr) => {
            for v in arr.iter_mut() {
                expand_schema_refs_at(spec, v, depth + 1);
            }
        }
        _ => {}
    }
}

fn schema_value(
    spec: &OpenApiV3Spec,
    schema: &ObjectOrReference<oas3::spec::ObjectSchema>,
) -> Option<Value> {
    let mut value = match schema {
        ObjectOrReference::Object(obj) => serde_json::to_value(obj).ok(),
        ObjectOrReference::Ref { ref_path, .. } => {
            resolve_schema_ref(spec, ref_path).and_then(|s| serde_json::to_value(s).ok())
        }
    }?;
    expand_schema_refs(spec, &mut value);
    Some(value)
}

/// Look up a local `#/components/<section>/<name>` reference in `section`.
fn resolve_component<'a, T>(
    section: &'a BTreeMap<String, ObjectOrReference<T>>,
    prefix: &str,
    ref_path: &str,
) -> Option<&'a T> {
    let name = ref_path.strip_prefix(prefix)?;
    match section.get(name)? {
        ObjectOrReference::Object(obj) => Some(obj),
        ObjectOrReference::Ref { .. } => None,
    }
}

/// Inline object, or the `components` entry a reference points to.
fn object_or_component<'a, T>(
    item: &'a ObjectOrReference<T>,
    section: Option<&'a BTreeMap<String, ObjectOrReference<T>>>,
    prefix: &str,
) -> Option<&'a T> {
    match item {
        ObjectOrReference::Object(obj) => Some(obj),
        ObjectOrReference::Ref { ref_path, .. } => {
            let found = section.and_then(|s| resolve_component(s, prefix, ref_path));
            if found.is_none() {
                debug!(ref_path = %ref_path, "Skipping unresolvable reference");
            }
            found
        }
    }
}

fn resolve_parameter_ref<'a>(spec: &'a OpenApiV3Spec, ref_path: &str) -> Option<&'a Parameter> {
    resolve_component(
        &spec.components.as_ref()?.parameters,
        "#/components/parameters/",
        ref_path,
    )
}

/// Resolve a list of parameter declarations, following `$ref`s.
pub fn extract_parameters(
    spec: &OpenApiV3Spec,
    params: &[ObjectOrReference<Parameter>],
) -> Vec<ParameterMeta> {
    let mut out = Vec::new();
    for p in params {
        let param = match p {
            ObjectOrReference::Object(obj) => Some(obj),
            ObjectOrReference::Ref { ref_path, .. } => resolve_parameter_ref(spec, ref_path),
        };
        let Some(param) = param else {
            debug!(?p, "Skipping unresolvable parameter reference");
            continue;
        };

        let location = ParameterLocation::from(param.location);
        out.push(ParameterMeta {
            name: param.name.clone(),
            location,
            // Path parameters are always required
            required: location == ParameterLocation::Path || param.required.unwrap_or(false),
            schema: param.schema.as_ref().and_then(|s| schema_value(spec, s)),
            style: param.style.map(ParameterStyle::from),
        });
    }
    out
}

/// Merge path-level and operation-level parameters. An operation parameter
/// replaces a path-level one with the same name and location.
fn merge_parameters(path_level: Vec<ParameterMeta>, op_level: Vec<ParameterMeta>) -> Vec<ParameterMeta> {
    let mut merged: Vec<ParameterMeta> = path_level
        .into_iter()
        .filter(|p| {
            !op_level
                .iter()
                .any(|o| o.name == p.name && o.location == p.location)
        })
        .collect();
    merged.extend(op_level);
    merged
}

/// Request body schema (from `application/json`) and the `required` flag.
///
/// Bodies declared through `#/components/requestBodies/` are resolved first.
pub fn extract_request_schema(spec: &OpenApiV3Spec, operation: &Operation) -> (Option<Value>, bool) {
    let req_body = operation.request_body.as_ref().and_then(|body| {
        object_or_component(
            body,
            spec.components.as_ref().map(|c| &c.request_bodies),
            "#/components/requestBodies/",
        )
    });
    let Some(req_body) = req_body else {
        return (None, false);
    };
    let schema = req_body
        .content
        .get("application/json")
        .and_then(|media| media.schema.as_ref())
        .and_then(|s| schema_value(spec, s));
    (schema, req_body.required.unwrap_or(false))
}

fn media_type_examples(spec: &OpenApiV3Spec, media: &MediaType) -> Vec<(String, Value)> {
    let mut out = Vec::new();
    match &media.examples {
        Some(MediaTypeExamples::Examples { examples }) => {
            let components = spec.components.as_ref().map(|c| &c.examples);
            for (name, example) in examples {
                let value = object_or_component(example, components, "#/components/examples/")
                    .and_then(|obj| obj.value.as_ref());
                if let Some(value) = value {
                    out.push((name.clone(), value.clone()));
                }
            }
        }
        Some(MediaTypeExamples::Example { example }) => {
            out.push(("default".to_string(), example.clone()));
        }
        None => {}
    }
    if out.is_empty() {
        let schema_example = media
            .schema
            .as_ref()
            .and_then(|s| schema_value(spec, s))
            .and_then(|s| s.get("example").cloned());
        if let Some(example) = schema_example {
            out.push(("schema".to_string(), example));
        }
    }
    out
}

/// Examples of the lowest `2xx` response, preferring `application/json`.
pub fn extract_response_examples(spec: &OpenApiV3Spec, operation: &Operation) -> ResponseExamples {
    let Some(responses) = operation.responses.as_ref() else {
        return ResponseExamples::default();
    };

    let components = spec.components.as_ref().map(|c| &c.responses);
    let success: BTreeMap<u16, _> = responses
        .iter()
        .filter_map(|(status, resp)| {
            let status: u16 = status.parse().ok()?;
            if !(200..300).contains(&status) {
                return None;
            }
            object_or_component(resp, components, "#/components/responses/").map(|obj| (status, obj))
        })
        .collect();

    let Some((status, response)) = success.into_iter().next() else {
        return ResponseExamples::default();
    };

    let media = response
        .content
        .get_key_value("application/json")
        .or_else(|| response.content.iter().next());

    match media {
        Some((content_type, media)) => ResponseExamples {
            status,
            content_type: content_type.clone(),
            examples: media_type_examples(spec, media),
        },
        None => ResponseExamples {
            status,
            ..ResponseExamples::default()
        },
    }
}

/// Path of the first server URL, without a trailing `/`.
pub fn base_path(spec: &OpenApiV3Spec) -> String {
    let Some(server) = spec.servers.first() else {
        return String::new();
    };
    let url_str = &server.url;
    url::Url::parse(url_str)
        .or_else(|_| url::Url::parse(&format!("http://dummy{url_str}")))
        .map(|u| {
            let p = u.path().trim_end_matches('/');
            if p == "/" || p.is_empty() {
                String::new()
            } else {
                p.to_string()
            }
        })
        .unwrap_or_default()
}

/// Build the operation table of `spec`.
pub fn build_api_spec(spec: &OpenApiV3Spec) -> ApiSpec {
    let mut operations = Vec::new();

    if let Some(paths_map) = spec.paths.as_ref() {
        for (path, item) in paths_map {
            let path_params = extract_parameters(spec, &item.parameters);
            for (method, operation) in item.methods() {
                let (request_schema, request_body_required) = extract_request_schema(spec, operation);
                let parameters = merge_parameters(
                    path_params.clone(),
                    extract_parameters(spec, &operation.parameters),
                );
                let response = extract_response_examples(spec, operation);

                debug!(
                    method = %method,
                    path = %path,
                    parameters = parameters.len(),
                    examples = ?response.names(),
                    "Operation loaded"
                );

                operations.push(OperationSpec {
                    method: method.clone(),
                    path_pattern: path.clone(),
                    operation_id: operation.operation_id.clone(),
                    parameters,
                    request_body_required,
                    request_schema,
                    response,
                });
            }
        }
    }

    let api = ApiSpec {
        title: spec.info.title.clone(),
        base_path: base_path(spec),
        operations,
    };
    info!(
        title = %api.title,
        base_path = %api.base_path,
        operations_count = api.operations.len(),
        "Specification loaded"
    );
    api
}
