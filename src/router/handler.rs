use super::core::Router;
use super::pattern::{PathPattern, Route};
use crate::call::Call;
use crate::error::{CodedError, Exception, ExceptionKind, Failure};
use crate::static_files::ResourceStore;
use std::fmt;
use std::sync::Arc;

/// How a handler finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// The handler produced the response.
    Done,
    /// The handler declined; try the next candidate of the same kind.
    Pass,
}

pub type HandlerResult = Result<Flow, Failure>;

pub type RouteCallback = Arc<dyn Fn(&mut Call) -> HandlerResult + Send + Sync>;
pub type FilterCallback = RouteCallback;
pub type ErrorCodeCallback = Arc<dyn Fn(&mut Call, &CodedError) + Send + Sync>;
pub type ExceptionCallback = Arc<dyn Fn(&mut Call, &Exception) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOrder {
    Before,
    After,
}

/// One entry of a router's ordered handler sequence.
#[derive(Clone)]
pub enum RequestHandler {
    Filter {
        route: Route,
        order: FilterOrder,
        callback: FilterCallback,
    },
    Route {
        route: Route,
        callback: RouteCallback,
    },
    ErrorCode {
        code: u16,
        callback: ErrorCodeCallback,
    },
    Exception {
        kind: ExceptionKind,
        callback: ExceptionCallback,
    },
    /// Sub-router receiving the path left after `prefix`.
    Path {
        prefix: PathPattern,
        router: Arc<Router>,
    },
    Assets {
        route: Route,
        store: Arc<dyn ResourceStore>,
    },
}

impl RequestHandler {
    /// Short label used in logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            RequestHandler::Filter { .. } => "filter",
            RequestHandler::Route { .. } => "route",
            RequestHandler::ErrorCode { .. } => "error_code",
            RequestHandler::Exception { .. } => "exception",
            RequestHandler::Path { .. } => "path",
            RequestHandler::Assets { .. } => "assets",
        }
    }
}

impl fmt::Debug for RequestHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestHandler::Filter { route, order, .. } => f
                .debug_struct("Filter")
                .field("route", &route.to_string())
                .field("order", order)
                .finish_non_exhaustive(),
            RequestHandler::Route { route, .. } => f
                .debug_struct("Route")
                .field("route", &route.to_string())
                .finish_non_exhaustive(),
            RequestHandler::ErrorCode { code, .. } => f
                .debug_struct("ErrorCode")
                .field("code", code)
                .finish_non_exhaustive(),
            RequestHandler::Exception { kind, .. } => f
                .debug_struct("Exception")
                .field("kind", kind)
                .finish_non_exhaustive(),
            RequestHandler::Path { prefix, router } => f
                .debug_struct("Path")
                .field("prefix", &prefix.as_str())
                .field("handlers", &router.handlers().len())
                .finish(),
            RequestHandler::Assets { route, .. } => f
                .debug_struct("Assets")
                .field("route", &route.to_string())
                .finish_non_exhaustive(),
        }
    }
}
