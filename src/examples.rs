//! Response example selection for mock routes.
//!
//! Precedence:
//!
//! 1. the example named by the override header, when that name is declared
//! 2. otherwise the first declared example (this also covers the
//!    single-example case)
//!
//! An operation without examples fails with a coded `500`. Unknown override
//! names are ignored rather than rejected.

use crate::call::Call;
use crate::error::CodedError;
use crate::spec::{OperationSpec, ResponseExamples};
use serde_json::Value;
use tracing::debug;

/// Default request header naming the example to answer with.
pub const EXAMPLE_HEADER: &str = "X-Mock-Response-Example";

/// Pick an example by the precedence above. `None` only when none are declared.
#[must_use]
pub fn select_example<'a>(
    examples: &'a ResponseExamples,
    selector: Option<&str>,
) -> Option<(&'a str, &'a Value)> {
    if let Some(name) = selector {
        if let Some((n, v)) = examples.examples.iter().find(|(n, _)| n == name) {
            return Some((n.as_str(), v));
        }
    }
    examples.examples.first().map(|(n, v)| (n.as_str(), v))
}

/// The example `op` answers `call` with; `header` names the override header.
pub fn resolve_example<'a>(
    op: &'a OperationSpec,
    call: &Call,
    header: &str,
) -> Result<&'a Value, CodedError> {
    let selector = call.request.header(header);
    match select_example(&op.response, selector) {
        Some((name, value)) => {
            debug!(
                request_id = %call.request_id(),
                operation = %op,
                example = %name,
                requested = ?selector,
                "Example selected"
            );
            Ok(value)
        }
        None => Err(CodedError::new(
            500,
            format!("no example available for {} {}", op.method, op.path_pattern),
        )),
    }
}

/// Write `example` as the response of `op`.
///
/// Strings are sent verbatim as `text/plain`; anything else is serialised as
/// JSON under the operation's declared content type.
pub fn write_example(call: &mut Call, op: &OperationSpec, example: &Value) {
    call.response.status = op.response.status;
    match example {
        Value::String(s) => {
            call.response.set_content_type("text/plain");
            call.response.set_body(s.as_str());
        }
        other => {
            call.response.set_content_type(&op.response.content_type);
            call.response.set_body(other.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::call::Request;
    use http::Method;
    use serde_json::json;

    fn op() -> OperationSpec {
        OperationSpec::new(Method::GET, "/multiple")
            .with_example("example1", json!("foo"))
            .with_example("example2", json!("bar"))
    }

    #[test]
    fn test_override_wins() {
        let op = op();
        let call = Call::new(Request::get("/multiple").with_header(EXAMPLE_HEADER, "example2"));
        assert_eq!(resolve_example(&op, &call, EXAMPLE_HEADER), Ok(&json!("bar")));
    }

    #[test]
    fn test_default_is_first_declared() {
        let op = op();
        let call = Call::new(Request::get("/multiple"));
        assert_eq!(resolve_example(&op, &call, EXAMPLE_HEADER), Ok(&json!("foo")));

        let call = Call::new(Request::get("/multiple").with_header(EXAMPLE_HEADER, "nope"));
        assert_eq!(resolve_example(&op, &call, EXAMPLE_HEADER), Ok(&json!("foo")));
    }

    #[test]
    fn test_no_examples_is_500() {
        let op = OperationSpec::new(Method::POST, "/empty");
        let call = Call::new(Request::post("/empty"));
        let err = resolve_example(&op, &call, EXAMPLE_HEADER).unwrap_err();
        assert_eq!(err.code, 500);
        assert_eq!(err.message.as_deref(), Some("no example available for POST /empty"));
    }

    #[test]
    fn test_write_example_content_types() {
        let op = OperationSpec::new(Method::GET, "/x").with_status(201);
        let mut call = Call::new(Request::get("/x"));
        write_example(&mut call, &op, &json!({"id": 1}));
        assert_eq!(call.response.status, 201);
        assert_eq!(call.response.content_type(), Some("application/json"));
        assert_eq!(call.response.body_text(), r#"{"id":1}"#);

        write_example(&mut call, &op, &json!("plain"));
        assert_eq!(call.response.content_type(), Some("text/plain"));
        assert_eq!(call.response.body_text(), "plain");
    }
}
