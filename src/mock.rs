//! Mock serving from an OpenAPI operation table.
//!
//! Every operation becomes a route that validates the call against the
//! declared parameters and body, then answers with one of the declared
//! response examples. Paths the table does not describe get the router's
//! default `404`.

use crate::call::Call;
use crate::error::ConfigError;
use crate::examples::{resolve_example, write_example};
use crate::router::{Flow, Route, Router};
use crate::runtime_config::RuntimeConfig;
use crate::spec::{load_spec, ApiSpec, OperationSpec};
use crate::static_files::StaticFiles;
use crate::validator::OperationValidator;
use anyhow::Context;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Build a router with one validating, example-answering route per operation.
///
/// Routes are registered in table order under the document's base path. When
/// `config.static_dir` is set, that directory is served for every other `GET`.
pub fn build_mock_router(spec: &ApiSpec, config: &RuntimeConfig) -> Result<Router, ConfigError> {
    let mut router = Router::new();
    router.set_catch_panics(config.catch_panics);

    for op in &spec.operations {
        let route = Route::new(
            op.method.clone(),
            &format!("{}{}", spec.base_path, op.path_pattern),
        )?;
        add_mock_route(&mut router, route, op, &config.example_header)?;
    }

    if let Some(dir) = &config.static_dir {
        router.add_assets("/*", StaticFiles::new(dir))?;
    }

    info!(
        title = %spec.title,
        routes_count = spec.operations.len(),
        static_dir = ?config.static_dir,
        "Mock router built"
    );
    Ok(router)
}

fn add_mock_route(
    router: &mut Router,
    route: Route,
    op: &OperationSpec,
    example_header: &str,
) -> Result<(), ConfigError> {
    let validator = OperationValidator::new(op)?;
    let op = Arc::new(op.clone());
    let header = example_header.to_string();
    router.add_route(route, move |call: &mut Call| {
        validator.validate(call)?;
        let example = resolve_example(&op, call, &header)?;
        write_example(call, &op, example);
        Ok(Flow::Done)
    });
    Ok(())
}

/// An operation table together with the router serving it.
pub struct MockServer {
    spec: Arc<ApiSpec>,
    config: RuntimeConfig,
    router: Router,
}

impl MockServer {
    /// Mock server with the default [`RuntimeConfig`].
    pub fn new(spec: ApiSpec) -> Result<Self, ConfigError> {
        Self::with_config(spec, RuntimeConfig::default())
    }

    pub fn with_config(spec: ApiSpec, config: RuntimeConfig) -> Result<Self, ConfigError> {
        let router = build_mock_router(&spec, &config)?;
        Ok(Self {
            spec: Arc::new(spec),
            config,
            router,
        })
    }

    /// Load `path` and serve it with configuration read from the environment.
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let spec = load_spec(path)?;
        Self::with_config(spec, RuntimeConfig::from_env())
            .with_context(|| format!("failed to build mock router for {}", path.display()))
    }

    #[must_use]
    pub fn spec(&self) -> &ApiSpec {
        &self.spec
    }

    #[must_use]
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    #[must_use]
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Add filters or error handlers before serving.
    pub fn router_mut(&mut self) -> &mut Router {
        &mut self.router
    }

    #[must_use]
    pub fn into_router(self) -> Router {
        self.router
    }

    pub fn dispatch(&self, call: &mut Call) {
        self.router.dispatch(call);
    }
}
