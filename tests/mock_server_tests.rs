#![allow(clippy::unwrap_used, clippy::expect_used)]

use routecore::call::{Call, Request};
use routecore::examples::EXAMPLE_HEADER;
use routecore::mock::MockServer;
use routecore::runtime_config::RuntimeConfig;
use std::path::PathBuf;

mod common;
use common::write_spec;

const MOCK_SPEC: &str = r##"{
  "openapi": "3.1.0",
  "info": { "title": "Mock Routes", "version": "1.0.0" },
  "components": {
    "requestBodies": {
      "Needed": {
        "required": true,
        "content": { "application/json": { "schema": { "type": "string" } } }
      }
    },
    "examples": {
      "Foo": { "value": "foo" }
    },
    "responses": {
      "Shared": {
        "description": "shared response",
        "content": { "application/json": { "example": "shared" } }
      }
    }
  },
  "paths": {
    "/ref-body": {
      "post": {
        "requestBody": { "$ref": "#/components/requestBodies/Needed" },
        "responses": { "200": { "description": "ok", "content": { "application/json": { "example": "success" } } } }
      }
    },
    "/ref-examples": {
      "get": {
        "responses": {
          "200": {
            "description": "referenced example",
            "content": {
              "application/json": {
                "examples": {
                  "example1": { "$ref": "#/components/examples/Foo" },
                  "example2": { "value": "bar" }
                }
              }
            }
          }
        }
      }
    },
    "/ref-response": {
      "get": {
        "responses": { "200": { "$ref": "#/components/responses/Shared" } }
      }
    },
    "/ping": {
      "get": {
        "responses": {
          "200": {
            "description": "pong",
            "content": { "application/json": { "example": "pong" } }
          }
        }
      }
    },
    "/get-example-from-schema": {
      "get": {
        "responses": {
          "200": {
            "description": "schema example",
            "content": {
              "application/json": { "schema": { "type": "string", "example": "response" } }
            }
          }
        }
      }
    },
    "/get-example-from-mediatype": {
      "get": {
        "responses": {
          "200": {
            "description": "media type example",
            "content": {
              "application/json": { "schema": { "type": "string" }, "example": "response" }
            }
          }
        }
      }
    },
    "/get-from-multiple-examples": {
      "get": {
        "responses": {
          "200": {
            "description": "several examples",
            "content": {
              "application/json": {
                "examples": {
                  "example1": { "value": "foo" },
                  "example2": { "value": "bar" }
                }
              }
            }
          }
        }
      }
    },
    "/get-from-no-examples": {
      "get": {
        "responses": {
          "200": {
            "description": "no examples",
            "content": { "application/json": { "schema": { "type": "string" } } }
          }
        }
      }
    },
    "/get-json-object": {
      "get": {
        "responses": {
          "201": {
            "description": "object example",
            "content": { "application/json": { "example": { "id": 7, "name": "Widget" } } }
          }
        }
      }
    },
    "/check-query-param": {
      "get": {
        "parameters": [
          { "name": "queryParam", "in": "query", "required": true,
            "schema": { "type": "string", "enum": ["aValidValue"] } }
        ],
        "responses": { "200": { "description": "ok", "content": { "application/json": { "example": "success" } } } }
      }
    },
    "/check-optional-query-param": {
      "get": {
        "parameters": [
          { "name": "queryParam", "in": "query", "required": false,
            "schema": { "type": "string", "enum": ["aValidValue"] } }
        ],
        "responses": { "200": { "description": "ok", "content": { "application/json": { "example": "success" } } } }
      }
    },
    "/check-path-param/{pathParam}": {
      "get": {
        "parameters": [
          { "name": "pathParam", "in": "path", "required": true,
            "schema": { "type": "string", "enum": ["aValidValue"] } }
        ],
        "responses": { "200": { "description": "ok", "content": { "application/json": { "example": "success" } } } }
      }
    },
    "/check-header-param": {
      "get": {
        "parameters": [
          { "name": "headerParam", "in": "header", "required": true,
            "schema": { "type": "string", "enum": ["aValidValue"] } }
        ],
        "responses": { "200": { "description": "ok", "content": { "application/json": { "example": "success" } } } }
      }
    },
    "/check-optional-header-param": {
      "get": {
        "parameters": [
          { "name": "headerParam", "in": "header", "required": false,
            "schema": { "type": "string", "enum": ["aValidValue"] } }
        ],
        "responses": { "200": { "description": "ok", "content": { "application/json": { "example": "success" } } } }
      }
    },
    "/check-cookie-param": {
      "get": {
        "parameters": [
          { "name": "cookieParam", "in": "cookie", "required": true,
            "schema": { "type": "string", "enum": ["aValidValue"] } }
        ],
        "responses": { "200": { "description": "ok", "content": { "application/json": { "example": "success" } } } }
      }
    },
    "/check-optional-cookie-param": {
      "get": {
        "parameters": [
          { "name": "cookieParam", "in": "cookie", "required": false,
            "schema": { "type": "string", "enum": ["aValidValue"] } }
        ],
        "responses": { "200": { "description": "ok", "content": { "application/json": { "example": "success" } } } }
      }
    },
    "/check-body": {
      "get": {
        "requestBody": {
          "required": true,
          "content": { "application/json": { "schema": { "type": "string" } } }
        },
        "responses": { "200": { "description": "ok", "content": { "application/json": { "example": "success" } } } }
      }
    },
    "/items/{id}": {
      "parameters": [
        { "name": "id", "in": "path", "required": true, "schema": { "type": "integer" } }
      ],
      "get": {
        "parameters": [
          { "name": "limit", "in": "query", "schema": { "type": "integer", "maximum": 10 } }
        ],
        "responses": { "200": { "description": "ok", "content": { "application/json": { "example": "item" } } } }
      }
    }
  }
}"##;

struct Fixture {
    server: MockServer,
    _dir: tempfile::TempDir,
}

fn fixture() -> Fixture {
    let (dir, path): (tempfile::TempDir, PathBuf) = write_spec("openapi_test.json", MOCK_SPEC);
    let server = MockServer::from_file(&path).unwrap();
    Fixture { server, _dir: dir }
}

fn send(server: &MockServer, request: Request) -> (u16, String) {
    let mut call = Call::new(request);
    server.dispatch(&mut call);
    (call.response.status, call.response.body_text())
}

fn get(server: &MockServer, uri: &str) -> (u16, String) {
    send(server, Request::get(uri))
}

fn ok(body: &str) -> (u16, String) {
    (200, body.to_string())
}

fn bad(body: &str) -> (u16, String) {
    (400, body.to_string())
}

#[test]
fn test_basic_route() {
    let f = fixture();
    assert_eq!(get(&f.server, "/ping"), ok("pong"));
}

#[test]
fn test_examples_from_schema_and_media_type() {
    let f = fixture();
    assert_eq!(get(&f.server, "/get-example-from-schema"), ok("response"));
    assert_eq!(get(&f.server, "/get-example-from-mediatype"), ok("response"));
}

#[test]
fn test_multiple_examples_default_and_override() {
    let f = fixture();
    let (status, body) = get(&f.server, "/get-from-multiple-examples");
    assert_eq!(status, 200);
    assert!(body == "foo" || body == "bar", "unexpected body {body}");

    let request = Request::get("/get-from-multiple-examples").with_header(EXAMPLE_HEADER, "example2");
    assert_eq!(send(&f.server, request), ok("bar"));

    let request = Request::get("/get-from-multiple-examples").with_header(EXAMPLE_HEADER, "example1");
    assert_eq!(send(&f.server, request), ok("foo"));
}

#[test]
fn test_no_examples_is_server_error() {
    let f = fixture();
    let (status, _) = get(&f.server, "/get-from-no-examples");
    assert_eq!(status, 500);
}

#[test]
fn test_json_example_uses_declared_status() {
    let f = fixture();
    let mut call = Call::new(Request::get("/get-json-object"));
    f.server.dispatch(&mut call);
    assert_eq!(call.response.status, 201);
    assert_eq!(call.response.content_type(), Some("application/json"));
    let body: serde_json::Value = serde_json::from_str(&call.response.body_text()).unwrap();
    assert_eq!(body, serde_json::json!({"id": 7, "name": "Widget"}));
}

#[test]
fn test_unknown_path_is_not_found() {
    let f = fixture();
    assert_eq!(
        get(&f.server, "/unknown-path"),
        (404, "/unknown-path not found".to_string())
    );
}

#[test]
fn test_required_query_param() {
    let f = fixture();
    assert_eq!(get(&f.server, "/check-query-param"), bad("invalid or missing query param"));
    assert_eq!(get(&f.server, "/check-query-param?queryParam=aValidValue"), ok("success"));
    assert_eq!(
        get(&f.server, "/check-query-param?queryParam=anInvalidValue"),
        bad("invalid or missing query param")
    );
}

#[test]
fn test_optional_query_param() {
    let f = fixture();
    assert_eq!(get(&f.server, "/check-optional-query-param"), ok("success"));
    assert_eq!(
        get(&f.server, "/check-optional-query-param?queryParam=aValidValue"),
        ok("success")
    );
    assert_eq!(
        get(&f.server, "/check-optional-query-param?queryParam=anInvalidValue"),
        bad("invalid or missing query param")
    );
}

#[test]
fn test_path_param() {
    let f = fixture();
    assert_eq!(get(&f.server, "/check-path-param/aValidValue"), ok("success"));
    assert_eq!(
        get(&f.server, "/check-path-param/anInvalidValue"),
        bad("invalid or missing path param")
    );
}

#[test]
fn test_required_header_param() {
    let f = fixture();
    assert_eq!(get(&f.server, "/check-header-param"), bad("invalid or missing header param"));

    let valid = Request::get("/check-header-param").with_header("headerParam", "aValidValue");
    assert_eq!(send(&f.server, valid), ok("success"));

    let invalid = Request::get("/check-header-param").with_header("headerParam", "anInvalidValue");
    assert_eq!(send(&f.server, invalid), bad("invalid or missing header param"));
}

#[test]
fn test_optional_header_param() {
    let f = fixture();
    assert_eq!(get(&f.server, "/check-optional-header-param"), ok("success"));

    let valid = Request::get("/check-optional-header-param").with_header("headerParam", "aValidValue");
    assert_eq!(send(&f.server, valid), ok("success"));

    let invalid =
        Request::get("/check-optional-header-param").with_header("headerParam", "anInvalidValue");
    assert_eq!(send(&f.server, invalid), bad("invalid or missing header param"));
}

#[test]
fn test_required_cookie_param() {
    let f = fixture();
    let valid = Request::get("/check-cookie-param").with_cookie("cookieParam", "aValidValue");
    assert_eq!(send(&f.server, valid), ok("success"));

    let invalid = Request::get("/check-cookie-param").with_header("Cookie", "cookieParam=anInvalidValue");
    assert_eq!(send(&f.server, invalid), bad("invalid or missing cookie param"));

    assert_eq!(get(&f.server, "/check-cookie-param"), bad("invalid or missing cookie param"));
}

#[test]
fn test_optional_cookie_param() {
    let f = fixture();
    let valid = Request::get("/check-optional-cookie-param").with_cookie("cookieParam", "aValidValue");
    assert_eq!(send(&f.server, valid), ok("success"));

    let invalid =
        Request::get("/check-optional-cookie-param").with_cookie("cookieParam", "anInvalidValue");
    assert_eq!(send(&f.server, invalid), bad("invalid or missing cookie param"));

    assert_eq!(get(&f.server, "/check-optional-cookie-param"), ok("success"));
}

#[test]
fn test_required_body() {
    let f = fixture();
    let with_body = Request::get("/check-body").with_body("Some body content");
    assert_eq!(send(&f.server, with_body), ok("success"));
    assert_eq!(get(&f.server, "/check-body"), bad("invalid or missing request body"));
}

#[test]
fn test_string_body_accepts_json_looking_text() {
    let f = fixture();
    for body in ["42", "true", "{\"id\": 1}", "\"quoted\""] {
        let request = Request::get("/check-body").with_body(body);
        assert_eq!(send(&f.server, request), ok("success"), "body {body}");
    }
}

#[test]
fn test_referenced_request_body_is_enforced() {
    let f = fixture();
    assert_eq!(
        send(&f.server, Request::post("/ref-body")),
        bad("invalid or missing request body")
    );
    assert_eq!(
        send(&f.server, Request::post("/ref-body").with_body("payload")),
        ok("success")
    );
}

#[test]
fn test_referenced_examples_and_responses() {
    let f = fixture();
    let request = Request::get("/ref-examples").with_header(EXAMPLE_HEADER, "example1");
    assert_eq!(send(&f.server, request), ok("foo"));
    let request = Request::get("/ref-examples").with_header(EXAMPLE_HEADER, "example2");
    assert_eq!(send(&f.server, request), ok("bar"));

    assert_eq!(get(&f.server, "/ref-response"), ok("shared"));
}

#[test]
fn test_path_level_and_typed_params() {
    let f = fixture();
    assert_eq!(get(&f.server, "/items/3"), ok("item"));
    assert_eq!(get(&f.server, "/items/3?limit=5"), ok("item"));
    assert_eq!(get(&f.server, "/items/abc"), bad("invalid or missing path param"));
    assert_eq!(get(&f.server, "/items/3?limit=50"), bad("invalid or missing query param"));
}

#[test]
fn test_custom_example_header_and_extra_handlers() {
    let (_dir, path) = write_spec("openapi_test.json", MOCK_SPEC);
    let spec = routecore::load_spec(&path).unwrap();
    let config = RuntimeConfig {
        example_header: "X-Example".to_string(),
        ..RuntimeConfig::default()
    };
    let mut server = MockServer::with_config(spec, config).unwrap();
    server
        .router_mut()
        .add_error_code_handler(404, |call, err| call.send(err.code, "custom not found"));

    let request = Request::get("/get-from-multiple-examples").with_header("X-Example", "example2");
    assert_eq!(send(&server, request), ok("bar"));
    assert_eq!(get(&server, "/nowhere"), (404, "custom not found".to_string()));
}
