//! Router core: the ordered handler sequence and the dispatch loop.
//!
//! A dispatch runs in three stages against the handler sequence:
//!
//! 1. every BEFORE filter whose route matches, in registration order
//! 2. the route stage: the first route, mount or assets handler that
//!    produces a result (a [`Flow::Pass`] moves on to the next candidate)
//! 3. every matching AFTER filter, also when an earlier stage failed
//!
//! Failures from any stage go through the router's [`ErrorResolver`]. When no
//! route stage candidate produces a result the call resolves as a `404`.

use super::handler::{
    ErrorCodeCallback, ExceptionCallback, FilterOrder, Flow, HandlerResult, RequestHandler,
    RouteCallback,
};
use super::pattern::{MethodMatch, ParamVec, PathPattern, Route, Segment};
use crate::call::{Body, Call};
use crate::error::{CodedError, ConfigError, Exception, ExceptionKind, Failure};
use crate::resolver::ErrorResolver;
use crate::static_files::ResourceStore;
use http::Method;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

/// Ordered handler sequence plus the error indices derived from it.
///
/// Cloning is cheap: callbacks and sub-routers are shared through `Arc`.
#[derive(Clone)]
pub struct Router {
    handlers: Vec<RequestHandler>,
    resolver: ErrorResolver,
    catch_panics: bool,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

fn default_not_found(call: &mut Call, err: &CodedError) {
    let body = match &err.message {
        Some(message) => message.clone(),
        None => format!("{} not found", call.request.path()),
    };
    call.send(err.code, body);
}

fn default_exception(call: &mut Call, err: &Exception) {
    call.send(500, err.summary());
}

fn default_handlers() -> Vec<RequestHandler> {
    vec![
        RequestHandler::ErrorCode {
            code: 404,
            callback: Arc::new(default_not_found),
        },
        RequestHandler::Exception {
            kind: ExceptionKind::EXCEPTION,
            callback: Arc::new(default_exception),
        },
    ]
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

impl Router {
    /// A router holding only the default 404 and root exception handlers.
    #[must_use]
    pub fn new() -> Self {
        let handlers = default_handlers();
        let resolver = ErrorResolver::from_handlers(&handlers);
        Self {
            handlers,
            resolver,
            catch_panics: true,
        }
    }

    #[must_use]
    pub fn builder() -> RouterBuilder {
        RouterBuilder::new()
    }

    /// Drop every registration and restore the two default handlers.
    pub fn reset(&mut self) {
        self.handlers = default_handlers();
        self.rebuild();
        info!(handlers_count = self.handlers.len(), "Router reset");
    }

    #[must_use]
    pub fn handlers(&self) -> &[RequestHandler] {
        &self.handlers
    }

    #[must_use]
    pub fn resolver(&self) -> &ErrorResolver {
        &self.resolver
    }

    /// Status codes with a registered handler.
    #[must_use]
    pub fn coded_errors(&self) -> Vec<u16> {
        self.resolver.codes()
    }

    /// Exception kinds with a registered handler.
    #[must_use]
    pub fn exception_errors(&self) -> Vec<&'static str> {
        self.resolver.kinds()
    }

    #[must_use]
    pub fn catch_panics(&self) -> bool {
        self.catch_panics
    }

    /// When disabled, a panicking callback unwinds through `dispatch`.
    pub fn set_catch_panics(&mut self, enabled: bool) {
        self.catch_panics = enabled;
    }

    fn rebuild(&mut self) {
        self.resolver = ErrorResolver::from_handlers(&self.handlers);
    }

    fn push(&mut self, handler: RequestHandler, target: &str) {
        info!(
            handler = handler.kind(),
            target = %target,
            position = self.handlers.len(),
            "Handler registered"
        );
        self.handlers.push(handler);
        self.rebuild();
    }

    pub fn add_filter<F>(&mut self, route: Route, order: FilterOrder, callback: F)
    where
        F: Fn(&mut Call) -> HandlerResult + Send + Sync + 'static,
    {
        let target = format!("{order:?} {route}");
        self.push(
            RequestHandler::Filter {
                route,
                order,
                callback: Arc::new(callback),
            },
            &target,
        );
    }

    pub fn add_route<F>(&mut self, route: Route, callback: F)
    where
        F: Fn(&mut Call) -> HandlerResult + Send + Sync + 'static,
    {
        self.add_route_callback(route, Arc::new(callback));
    }

    /// Register an already shared callback.
    pub fn add_route_callback(&mut self, route: Route, callback: RouteCallback) {
        let target = route.to_string();
        self.push(RequestHandler::Route { route, callback }, &target);
    }

    /// Delegate every path under `prefix` to `router`, with the prefix stripped.
    pub fn mount(&mut self, prefix: &str, router: Router) -> Result<(), ConfigError> {
        let prefix = PathPattern::parse(prefix)?;
        let target = prefix.to_string();
        self.push(
            RequestHandler::Path {
                prefix,
                router: Arc::new(router),
            },
            &target,
        );
        Ok(())
    }

    /// Serve `GET` requests matching `pattern` from `store`.
    ///
    /// With a trailing wildcard the part of the path under the pattern's
    /// prefix is looked up; otherwise the whole path is.
    pub fn add_assets<S>(&mut self, pattern: &str, store: S) -> Result<(), ConfigError>
    where
        S: ResourceStore + 'static,
    {
        self.add_assets_store(pattern, Arc::new(store))
    }

    pub fn add_assets_store(
        &mut self,
        pattern: &str,
        store: Arc<dyn ResourceStore>,
    ) -> Result<(), ConfigError> {
        let route = Route::new(Method::GET, pattern)?;
        let target = route.to_string();
        self.push(RequestHandler::Assets { route, store }, &target);
        Ok(())
    }

    pub fn add_error_code_handler<F>(&mut self, code: u16, callback: F)
    where
        F: Fn(&mut Call, &CodedError) + Send + Sync + 'static,
    {
        let callback: ErrorCodeCallback = Arc::new(callback);
        self.push(RequestHandler::ErrorCode { code, callback }, &code.to_string());
    }

    /// Fails for the reserved kinds ([`ExceptionKind::CODED`], [`ExceptionKind::PASS`]).
    pub fn add_exception_handler<F>(
        &mut self,
        kind: ExceptionKind,
        callback: F,
    ) -> Result<(), ConfigError>
    where
        F: Fn(&mut Call, &Exception) + Send + Sync + 'static,
    {
        if kind.is_reserved() {
            error!(kind = %kind, "Rejected handler for reserved exception kind");
            return Err(ConfigError::ReservedException { kind: kind.name() });
        }
        let callback: ExceptionCallback = Arc::new(callback);
        self.push(RequestHandler::Exception { kind, callback }, kind.name());
        Ok(())
    }

    /// Run the handler chain for `call`. Every failure is resolved into the
    /// call's response; nothing escapes.
    pub fn dispatch(&self, call: &mut Call) {
        let start = Instant::now();
        let path = call.request.path().to_string();
        debug!(
            request_id = %call.request_id(),
            method = %call.request.method(),
            path = %path,
            "Dispatching call"
        );

        self.handle(call, &path, &ParamVec::new(), false);

        info!(
            request_id = %call.request_id(),
            method = %call.request.method(),
            path = %path,
            status = call.response.status,
            duration_us = start.elapsed().as_micros(),
            "Call dispatched"
        );
    }

    /// Dispatch `path` (already relative to this router) and report whether
    /// the call was handled. A mounted router hands unmatched calls back to
    /// its parent with [`Flow::Pass`].
    fn handle(&self, call: &mut Call, path: &str, inherited: &ParamVec, mounted: bool) -> Flow {
        let method = call.request.method().clone();

        let outcome = match self.run_filters(call, FilterOrder::Before, &method, path, inherited) {
            Ok(()) => self.run_route_stage(call, &method, path, inherited),
            Err(failure) => Err(failure),
        };

        match outcome {
            Ok(Flow::Done) => {}
            Ok(Flow::Pass) if mounted => {
                debug!(path = %path, "No route in mounted router, passing to parent");
                return Flow::Pass;
            }
            Ok(Flow::Pass) => {
                let failure = Failure::Coded(CodedError::not_found(call.request.path()));
                self.resolve(&failure, call);
            }
            Err(failure) => self.resolve(&failure, call),
        }

        if let Err(failure) = self.run_filters(call, FilterOrder::After, &method, path, inherited) {
            self.resolve(&failure, call);
        }
        Flow::Done
    }

    fn run_filters(
        &self,
        call: &mut Call,
        order: FilterOrder,
        method: &Method,
        path: &str,
        inherited: &ParamVec,
    ) -> Result<(), Failure> {
        for handler in &self.handlers {
            let RequestHandler::Filter {
                route,
                order: filter_order,
                callback,
            } = handler
            else {
                continue;
            };
            if *filter_order != order {
                continue;
            }
            if let Some(params) = route.matches(method, path) {
                bind_params(call, inherited, params);
                self.invoke(call, callback)?;
            }
        }
        Ok(())
    }

    fn run_route_stage(
        &self,
        call: &mut Call,
        method: &Method,
        path: &str,
        inherited: &ParamVec,
    ) -> HandlerResult {
        for handler in &self.handlers {
            match handler {
                RequestHandler::Route { route, callback } => {
                    let Some(params) = route.matches(method, path) else {
                        continue;
                    };
                    bind_params(call, inherited, params);
                    match self.invoke(call, callback)? {
                        Flow::Done => return Ok(Flow::Done),
                        Flow::Pass => {
                            debug!(route = %route, "Route passed");
                        }
                    }
                }
                RequestHandler::Path { prefix, router } => {
                    let Some((params, rest)) = prefix.match_prefix(path) else {
                        continue;
                    };
                    let mut scope = inherited.clone();
                    scope.extend(params);
                    if router.handle(call, &rest, &scope, true) == Flow::Done {
                        return Ok(Flow::Done);
                    }
                }
                RequestHandler::Assets { route, store } => {
                    if !route.method.accepts(method) || path.ends_with('/') {
                        continue;
                    }
                    let Some((params, resource)) = asset_path(&route.pattern, path) else {
                        continue;
                    };
                    bind_params(call, inherited, params);
                    match store.load(&resource)? {
                        Some(asset) => {
                            debug!(resource = %resource, bytes = asset.bytes.len(), "Serving asset");
                            call.response.status = 200;
                            call.response.set_content_type(&asset.content_type);
                            call.response.body = Body::Bytes(asset.bytes);
                            return Ok(Flow::Done);
                        }
                        None => {
                            debug!(resource = %resource, "Asset not found, passing");
                        }
                    }
                }
                _ => {}
            }
        }
        Ok(Flow::Pass)
    }

    fn invoke(&self, call: &mut Call, callback: &RouteCallback) -> HandlerResult {
        if !self.catch_panics {
            return callback(call);
        }
        match panic::catch_unwind(AssertUnwindSafe(|| callback(call))) {
            Ok(result) => result,
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                error!(
                    request_id = %call.request_id(),
                    path = %call.request.path(),
                    panic = %message,
                    "Handler panicked"
                );
                Err(Failure::exception(ExceptionKind::PANIC, message))
            }
        }
    }

    fn resolve(&self, failure: &Failure, call: &mut Call) {
        if !self.catch_panics {
            self.resolver.resolve(failure, call);
            return;
        }
        let resolved = panic::catch_unwind(AssertUnwindSafe(|| self.resolver.resolve(failure, call)));
        if let Err(payload) = resolved {
            let message = panic_message(payload.as_ref());
            error!(
                request_id = %call.request_id(),
                panic = %message,
                "Error handler panicked"
            );
            call.send(500, Exception::new(ExceptionKind::PANIC, message).summary());
        }
    }
}

fn bind_params(call: &mut Call, inherited: &ParamVec, params: ParamVec) {
    if inherited.is_empty() {
        call.set_path_params(params);
    } else {
        call.set_path_params(inherited.clone());
        call.extend_path_params(&params);
    }
}

fn asset_path(pattern: &PathPattern, path: &str) -> Option<(ParamVec, String)> {
    if matches!(pattern.segments().last(), Some(Segment::Wildcard)) {
        pattern.match_prefix(path)
    } else {
        pattern.matches(path).map(|params| (params, path.to_string()))
    }
}

/// Chained registration. Pattern errors are kept and reported by
/// [`RouterBuilder::build`]; reserved exception kinds fail immediately.
pub struct RouterBuilder {
    router: Router,
    error: Option<ConfigError>,
}

impl Default for RouterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RouterBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            router: Router::new(),
            error: None,
        }
    }

    fn record(mut self, result: Result<(), ConfigError>) -> Self {
        if let Err(err) = result {
            error!(error = %err, "Invalid registration");
            self.error.get_or_insert(err);
        }
        self
    }

    #[must_use]
    pub fn filter<F>(mut self, route: Route, order: FilterOrder, callback: F) -> Self
    where
        F: Fn(&mut Call) -> HandlerResult + Send + Sync + 'static,
    {
        self.router.add_filter(route, order, callback);
        self
    }

    fn filter_pattern<F>(self, pattern: &str, order: FilterOrder, callback: F) -> Self
    where
        F: Fn(&mut Call) -> HandlerResult + Send + Sync + 'static,
    {
        match Route::all(pattern) {
            Ok(route) => self.filter(route, order, callback),
            Err(err) => self.record(Err(err)),
        }
    }

    #[must_use]
    pub fn before<F>(self, pattern: &str, callback: F) -> Self
    where
        F: Fn(&mut Call) -> HandlerResult + Send + Sync + 'static,
    {
        self.filter_pattern(pattern, FilterOrder::Before, callback)
    }

    #[must_use]
    pub fn after<F>(self, pattern: &str, callback: F) -> Self
    where
        F: Fn(&mut Call) -> HandlerResult + Send + Sync + 'static,
    {
        self.filter_pattern(pattern, FilterOrder::After, callback)
    }

    #[must_use]
    pub fn route<F>(mut self, route: Route, callback: F) -> Self
    where
        F: Fn(&mut Call) -> HandlerResult + Send + Sync + 'static,
    {
        self.router.add_route(route, callback);
        self
    }

    fn method_route<F>(self, method: MethodMatch, pattern: &str, callback: F) -> Self
    where
        F: Fn(&mut Call) -> HandlerResult + Send + Sync + 'static,
    {
        match Route::new(method, pattern) {
            Ok(route) => self.route(route, callback),
            Err(err) => self.record(Err(err)),
        }
    }

    #[must_use]
    pub fn get<F>(self, pattern: &str, callback: F) -> Self
    where
        F: Fn(&mut Call) -> HandlerResult + Send + Sync + 'static,
    {
        self.method_route(Method::GET.into(), pattern, callback)
    }

    #[must_use]
    pub fn head<F>(self, pattern: &str, callback: F) -> Self
    where
        F: Fn(&mut Call) -> HandlerResult + Send + Sync + 'static,
    {
        self.method_route(Method::HEAD.into(), pattern, callback)
    }

    #[must_use]
    pub fn post<F>(self, pattern: &str, callback: F) -> Self
    where
        F: Fn(&mut Call) -> HandlerResult + Send + Sync + 'static,
    {
        self.method_route(Method::POST.into(), pattern, callback)
    }

    #[must_use]
    pub fn put<F>(self, pattern: &str, callback: F) -> Self
    where
        F: Fn(&mut Call) -> HandlerResult + Send + Sync + 'static,
    {
        self.method_route(Method::PUT.into(), pattern, callback)
    }

    #[must_use]
    pub fn delete<F>(self, pattern: &str, callback: F) -> Self
    where
        F: Fn(&mut Call) -> HandlerResult + Send + Sync + 'static,
    {
        self.method_route(Method::DELETE.into(), pattern, callback)
    }

    #[must_use]
    pub fn trace<F>(self, pattern: &str, callback: F) -> Self
    where
        F: Fn(&mut Call) -> HandlerResult + Send + Sync + 'static,
    {
        self.method_route(Method::TRACE.into(), pattern, callback)
    }

    #[must_use]
    pub fn options<F>(self, pattern: &str, callback: F) -> Self
    where
        F: Fn(&mut Call) -> HandlerResult + Send + Sync + 'static,
    {
        self.method_route(Method::OPTIONS.into(), pattern, callback)
    }

    #[must_use]
    pub fn patch<F>(self, pattern: &str, callback: F) -> Self
    where
        F: Fn(&mut Call) -> HandlerResult + Send + Sync + 'static,
    {
        self.method_route(Method::PATCH.into(), pattern, callback)
    }

    /// Route accepting every method.
    #[must_use]
    pub fn all<F>(self, pattern: &str, callback: F) -> Self
    where
        F: Fn(&mut Call) -> HandlerResult + Send + Sync + 'static,
    {
        self.method_route(MethodMatch::All, pattern, callback)
    }

    #[must_use]
    pub fn mount(mut self, prefix: &str, router: Router) -> Self {
        let result = self.router.mount(prefix, router);
        self.record(result)
    }

    #[must_use]
    pub fn assets<S>(mut self, pattern: &str, store: S) -> Self
    where
        S: ResourceStore + 'static,
    {
        let result = self.router.add_assets(pattern, store);
        self.record(result)
    }

    #[must_use]
    pub fn error_code<F>(mut self, code: u16, callback: F) -> Self
    where
        F: Fn(&mut Call, &CodedError) + Send + Sync + 'static,
    {
        self.router.add_error_code_handler(code, callback);
        self
    }

    pub fn exception<F>(mut self, kind: ExceptionKind, callback: F) -> Result<Self, ConfigError>
    where
        F: Fn(&mut Call, &Exception) + Send + Sync + 'static,
    {
        self.router.add_exception_handler(kind, callback)?;
        Ok(self)
    }

    #[must_use]
    pub fn catch_panics(mut self, enabled: bool) -> Self {
        self.router.set_catch_panics(enabled);
        self
    }

    /// The configured router, or the first registration error.
    pub fn build(self) -> Result<Router, ConfigError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.router),
        }
    }
}
