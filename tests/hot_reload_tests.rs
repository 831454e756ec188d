#![allow(clippy::unwrap_used, clippy::expect_used)]

use routecore::call::{Call, Request};
use routecore::hot_reload::watch_spec;
use routecore::load_spec;
use routecore::mock::build_mock_router;
use routecore::router::SharedRouter;
use routecore::runtime_config::RuntimeConfig;
use std::sync::Arc;
use std::time::Duration;

mod common;
use common::write_spec;

const SPEC_V1: &str = r#"openapi: 3.1.0
info:
  title: Reload Test
  version: '1.0'
paths:
  /foo:
    get:
      responses:
        '200':
          description: OK
          content:
            application/json:
              example: one
"#;

const SPEC_V2: &str = r#"openapi: 3.1.0
info:
  title: Reload Test
  version: '1.0'
paths:
  /foo:
    get:
      responses:
        '200':
          description: OK
          content:
            application/json:
              example: two
  /bar:
    get:
      responses:
        '200':
          description: OK
          content:
            application/json:
              example: bar
"#;

fn body(shared: &SharedRouter, uri: &str) -> (u16, String) {
    let mut call = Call::new(Request::get(uri));
    shared.dispatch(&mut call);
    (call.response.status, call.response.body_text())
}

fn wait_for(shared: &SharedRouter, uri: &str, expected: (u16, &str)) -> bool {
    for _ in 0..40 {
        let (status, text) = body(shared, uri);
        if status == expected.0 && text == expected.1 {
            return true;
        }
        std::thread::sleep(Duration::from_millis(50));
    }
    false
}

#[test]
fn test_watch_spec_reload() {
    let (_dir, path) = write_spec("reload.yaml", SPEC_V1);
    let config = RuntimeConfig::default();
    let router = build_mock_router(&load_spec(&path).unwrap(), &config).unwrap();
    let shared = Arc::new(SharedRouter::new(router));

    assert_eq!(body(&shared, "/foo"), (200, "one".to_string()));
    assert_eq!(body(&shared, "/bar").0, 404);

    let watcher = watch_spec(&path, Arc::clone(&shared), config, |router| {
        router.add_error_code_handler(404, |call, _| call.send(404, "reloaded 404"));
    })
    .expect("watch_spec");

    // allow watcher thread to start
    std::thread::sleep(Duration::from_millis(100));
    std::fs::write(&path, SPEC_V2).unwrap();

    assert!(wait_for(&shared, "/bar", (200, "bar")));
    assert_eq!(body(&shared, "/foo"), (200, "two".to_string()));
    assert_eq!(body(&shared, "/nowhere"), (404, "reloaded 404".to_string()));

    drop(watcher);
}

#[test]
fn test_broken_spec_keeps_previous_router() {
    let (_dir, path) = write_spec("reload.yaml", SPEC_V1);
    let config = RuntimeConfig::default();
    let router = build_mock_router(&load_spec(&path).unwrap(), &config).unwrap();
    let shared = Arc::new(SharedRouter::new(router));

    let watcher = watch_spec(&path, Arc::clone(&shared), config, |_| {}).expect("watch_spec");
    std::thread::sleep(Duration::from_millis(100));

    std::fs::write(&path, "openapi: [broken").unwrap();
    std::thread::sleep(Duration::from_millis(300));
    assert_eq!(body(&shared, "/foo"), (200, "one".to_string()));

    drop(watcher);
}

#[test]
fn test_watch_missing_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let shared = Arc::new(SharedRouter::new(routecore::Router::new()));
    let result = watch_spec(
        dir.path().join("absent.yaml"),
        shared,
        RuntimeConfig::default(),
        |_| {},
    );
    assert!(result.is_err());
}
