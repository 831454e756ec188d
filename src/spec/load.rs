use super::build::build_api_spec;
use super::types::ApiSpec;
use anyhow::Context;
use oas3::OpenApiV3Spec;
use std::path::Path;

/// Drop path-item keys that are neither HTTP methods nor fields the parser
/// knows, so documents with vendor verbs still load.
fn strip_unknown_verbs(val: &mut serde_json::Value) {
    const METHODS: [&str; 8] = ["get", "post", "put", "delete", "patch", "options", "head", "trace"];

    let Some(serde_json::Value::Object(paths_map)) = val.get_mut("paths") else {
        return;
    };
    for item in paths_map.values_mut() {
        if let serde_json::Value::Object(obj) = item {
            obj.retain(|k, _| {
                let lk = k.to_ascii_lowercase();
                match lk.as_str() {
                    "summary" | "description" | "servers" | "parameters" | "$ref" => true,
                    m if METHODS.contains(&m) => true,
                    _ => k.starts_with("x-"),
                }
            });
        }
    }
}

/// Parse an OpenAPI document from text. `yaml` selects the YAML parser.
pub fn parse_spec(content: &str, yaml: bool) -> anyhow::Result<OpenApiV3Spec> {
    let mut value: serde_json::Value = if yaml {
        serde_yaml::from_str(content).context("invalid YAML")?
    } else {
        serde_json::from_str(content).context("invalid JSON")?
    };
    strip_unknown_verbs(&mut value);
    serde_json::from_value(value).context("not an OpenAPI 3 document")
}

/// Load the operation table from a `.yaml`/`.yml` or JSON file.
pub fn load_spec(file_path: impl AsRef<Path>) -> anyhow::Result<ApiSpec> {
    let path = file_path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read specification {}", path.display()))?;
    let yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml" | "yml")
    );
    let spec = parse_spec(&content, yaml)
        .with_context(|| format!("failed to parse specification {}", path.display()))?;
    Ok(build_api_spec(&spec))
}
