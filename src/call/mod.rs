//! Per-request context.
//!
//! A [`Call`] pairs the inbound [`Request`] with the [`Response`] being built
//! and the path parameters bound by the route currently running. It is owned
//! by a single dispatch and never shared.

mod request;
mod response;

pub use request::{parse_cookies, parse_query_params, Request};
pub use response::{Body, HeaderVec, Response, ResponseCookie, MAX_INLINE_HEADERS};

use crate::error::{CodedError, Failure};
use crate::ids::RequestId;
use crate::router::{Flow, HandlerResult, ParamVec};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct Call {
    pub request: Request,
    pub response: Response,
    path_params: ParamVec,
    request_id: RequestId,
}

impl Call {
    #[must_use]
    pub fn new(request: Request) -> Self {
        let request_id = RequestId::from_header_or_new(request.header("x-request-id"));
        Self {
            request,
            response: Response::default(),
            path_params: ParamVec::new(),
            request_id,
        }
    }

    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Value captured for `{name}` by the running route.
    ///
    /// Uses "last write wins": when a mount and its sub-route capture the same
    /// name, the innermost capture is returned.
    #[inline]
    #[must_use]
    pub fn path_param(&self, name: &str) -> Option<&str> {
        self.path_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn path_params(&self) -> &ParamVec {
        &self.path_params
    }

    pub fn set_path_params(&mut self, params: ParamVec) {
        self.path_params = params;
    }

    pub(crate) fn extend_path_params(&mut self, params: &ParamVec) {
        self.path_params
            .extend(params.iter().map(|(k, v)| (Arc::clone(k), v.clone())));
    }

    /// Set the body and finish the handler.
    pub fn ok(&mut self, body: impl Into<Body>) -> HandlerResult {
        self.response.set_body(body);
        Ok(Flow::Done)
    }

    /// Decline; the router tries the next candidate.
    #[must_use]
    pub fn pass(&self) -> HandlerResult {
        Ok(Flow::Pass)
    }

    /// Set status and body.
    pub fn send(&mut self, status: u16, body: impl Into<Body>) {
        self.response.status = status;
        self.response.set_body(body);
    }

    /// Abort with a coded failure, resolved by the status-code handlers.
    pub fn fail(&self, code: u16, message: impl Into<String>) -> HandlerResult {
        Err(Failure::Coded(CodedError::new(code, message)))
    }
}
