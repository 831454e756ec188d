//! # Hot Reload Module
//!
//! Live reloading of a mock server's specification.
//!
//! [`watch_spec`] watches the OpenAPI file and, on every modify/create event,
//! loads it again, builds a fresh mock router, lets the caller re-apply its
//! own registrations, and publishes the result through a [`SharedRouter`].
//! Calls already dispatching keep the router they started with.
//!
//! ## Error Handling
//!
//! If the new spec fails to load or build, the error is logged and the
//! previous router stays active.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use routecore::hot_reload::watch_spec;
//! use routecore::mock::MockServer;
//! use routecore::router::SharedRouter;
//! use routecore::runtime_config::RuntimeConfig;
//! use std::sync::Arc;
//!
//! # fn main() -> anyhow::Result<()> {
//! let server = MockServer::from_file("openapi.yaml")?;
//! let shared = Arc::new(SharedRouter::new(server.into_router()));
//!
//! let _watcher = watch_spec("openapi.yaml", Arc::clone(&shared), RuntimeConfig::from_env(), |router| {
//!     router.add_error_code_handler(404, |call, _| call.send(404, "nothing here"));
//! })?;
//! # Ok(())
//! # }
//! ```

use crate::mock::build_mock_router;
use crate::router::{Router, SharedRouter};
use crate::runtime_config::RuntimeConfig;
use crate::spec::load_spec;
use anyhow::Context;
use notify::{Config, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

fn reload(path: &Path, config: &RuntimeConfig) -> anyhow::Result<Router> {
    let spec = load_spec(path)?;
    build_mock_router(&spec, config).context("failed to build mock router")
}

/// Watch `spec_path` and rebuild `shared` when it changes.
///
/// `customize` runs on every freshly built router before it is published.
/// The returned watcher stops watching when dropped.
pub fn watch_spec<P, F>(
    spec_path: P,
    shared: Arc<SharedRouter>,
    config: RuntimeConfig,
    customize: F,
) -> anyhow::Result<RecommendedWatcher>
where
    P: AsRef<Path>,
    F: Fn(&mut Router) + Send + 'static,
{
    let path: PathBuf = spec_path.as_ref().to_path_buf();
    let watch_path = path.clone();

    let mut watcher = RecommendedWatcher::new(
        move |res: Result<notify::Event, notify::Error>| match res {
            Ok(event) => {
                if !matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
                    return;
                }
                match reload(&watch_path, &config) {
                    Ok(mut router) => {
                        customize(&mut router);
                        let handlers_count = router.handlers().len();
                        shared.replace(router);
                        info!(
                            path = %watch_path.display(),
                            handlers_count,
                            "hot-reload: router rebuilt"
                        );
                    }
                    Err(e) => {
                        warn!(
                            path = %watch_path.display(),
                            error = ?e,
                            "hot-reload: keeping previous router"
                        );
                    }
                }
            }
            Err(e) => error!(error = %e, "hot-reload: watch error"),
        },
        Config::default(),
    )
    .context("failed to create file watcher")?;

    watcher
        .watch(&path, RecursiveMode::NonRecursive)
        .with_context(|| format!("failed to watch {}", path.display()))?;
    info!(path = %path.display(), "hot-reload: watching specification");
    Ok(watcher)
}
