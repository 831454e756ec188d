//! Error resolution.
//!
//! The resolver holds two indices projected from a router's handler
//! sequence: status code → callback and exception kind → callback. It is
//! rebuilt from scratch whenever the sequence changes, never edited in place.

use crate::call::Call;
use crate::error::{CodedError, Exception, ExceptionKind, Failure};
use crate::router::{ErrorCodeCallback, ExceptionCallback, RequestHandler};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Clone, Default)]
pub struct ErrorResolver {
    coded: HashMap<u16, ErrorCodeCallback>,
    exceptions: HashMap<ExceptionKind, ExceptionCallback>,
}

impl ErrorResolver {
    /// Project the error handlers out of `handlers`. Later registrations
    /// replace earlier ones for the same code or kind.
    #[must_use]
    pub fn from_handlers(handlers: &[RequestHandler]) -> Self {
        let mut resolver = Self::default();
        for handler in handlers {
            match handler {
                RequestHandler::ErrorCode { code, callback } => {
                    resolver.coded.insert(*code, Arc::clone(callback));
                }
                RequestHandler::Exception { kind, callback } => {
                    resolver
                        .exceptions
                        .insert(*kind, Arc::clone(callback));
                }
                _ => {}
            }
        }
        resolver
    }

    #[must_use]
    pub fn coded_handler(&self, code: u16) -> Option<&ErrorCodeCallback> {
        self.coded.get(&code)
    }

    #[must_use]
    pub fn exception_handler(&self, kind: ExceptionKind) -> Option<&ExceptionCallback> {
        self.exceptions.get(&kind)
    }

    /// Registered status codes, ascending.
    #[must_use]
    pub fn codes(&self) -> Vec<u16> {
        let mut codes: Vec<u16> = self.coded.keys().copied().collect();
        codes.sort_unstable();
        codes
    }

    /// Registered exception kind names, sorted.
    #[must_use]
    pub fn kinds(&self) -> Vec<&'static str> {
        let mut kinds: Vec<&'static str> = self.exceptions.keys().map(|k| k.name()).collect();
        kinds.sort_unstable();
        kinds
    }

    /// Most specific handler for `kind`, walking up its ancestors.
    #[must_use]
    pub fn closest_exception_handler(
        &self,
        kind: ExceptionKind,
    ) -> Option<(ExceptionKind, &ExceptionCallback)> {
        kind.ancestors()
            .find_map(|k| self.exceptions.get(&k).map(|cb| (k, cb)))
    }

    /// Turn `failure` into a response on `call`.
    pub fn resolve(&self, failure: &Failure, call: &mut Call) {
        match failure {
            Failure::Coded(err) => self.resolve_coded(err, call),
            Failure::Exception(err) => self.resolve_exception(err, call),
        }
    }

    fn resolve_coded(&self, err: &CodedError, call: &mut Call) {
        debug!(
            request_id = %call.request_id(),
            code = err.code,
            message = ?err.message,
            custom_handler = self.coded.contains_key(&err.code),
            "Resolving coded failure"
        );
        match self.coded.get(&err.code) {
            Some(callback) => callback(call, err),
            None => {
                call.response.status = err.code;
                call.response
                    .set_body(err.message.clone().unwrap_or_default());
            }
        }
    }

    fn resolve_exception(&self, err: &Exception, call: &mut Call) {
        match self.closest_exception_handler(err.kind) {
            Some((handled_as, callback)) => {
                warn!(
                    request_id = %call.request_id(),
                    kind = %err.kind,
                    handled_as = %handled_as,
                    message = ?err.message,
                    "Resolving exception"
                );
                callback(call, err);
            }
            None => {
                // The root handler was never registered; only reachable on a
                // hand-built resolver.
                warn!(
                    request_id = %call.request_id(),
                    kind = %err.kind,
                    message = ?err.message,
                    "No exception handler registered, answering 500"
                );
                call.response.status = 500;
                call.response.set_body(err.summary());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::call::Request;

    const VALIDATION: ExceptionKind =
        ExceptionKind::new("ValidationException", &ExceptionKind::ILLEGAL_ARGUMENT);

    fn handlers() -> Vec<RequestHandler> {
        vec![
            RequestHandler::ErrorCode {
                code: 404,
                callback: Arc::new(|call: &mut Call, _: &CodedError| call.send(404, "first")),
            },
            RequestHandler::ErrorCode {
                code: 404,
                callback: Arc::new(|call: &mut Call, _: &CodedError| call.send(404, "second")),
            },
            RequestHandler::Exception {
                kind: ExceptionKind::RUNTIME,
                callback: Arc::new(|call: &mut Call, e: &Exception| {
                    call.send(503, format!("runtime: {}", e.kind));
                }),
            },
        ]
    }

    #[test]
    fn test_last_registration_wins() {
        let resolver = ErrorResolver::from_handlers(&handlers());
        assert_eq!(resolver.codes(), vec![404]);
        let mut call = Call::new(Request::get("/x"));
        resolver.resolve(&Failure::Coded(CodedError::not_found("/x")), &mut call);
        assert_eq!(call.response.body_text(), "second");
    }

    #[test]
    fn test_unregistered_code_uses_message() {
        let resolver = ErrorResolver::from_handlers(&handlers());
        let mut call = Call::new(Request::get("/x"));
        resolver.resolve(&Failure::coded(418, "teapot"), &mut call);
        assert_eq!(call.response.status, 418);
        assert_eq!(call.response.body_text(), "teapot");

        let mut call = Call::new(Request::get("/x"));
        resolver.resolve(&Failure::Coded(CodedError::status(409)), &mut call);
        assert_eq!(call.response.status, 409);
        assert_eq!(call.response.body_text(), "");
    }

    #[test]
    fn test_walks_to_closest_ancestor() {
        let resolver = ErrorResolver::from_handlers(&handlers());
        let (found, _) = resolver.closest_exception_handler(VALIDATION).unwrap();
        assert_eq!(found, ExceptionKind::RUNTIME);
        assert!(resolver.closest_exception_handler(ExceptionKind::IO).is_none());

        let mut call = Call::new(Request::get("/x"));
        resolver.resolve(&Failure::exception(VALIDATION, "bad"), &mut call);
        assert_eq!(call.response.status, 503);
        assert_eq!(call.response.body_text(), "runtime: ValidationException");
    }

    #[test]
    fn test_missing_root_falls_back_to_500() {
        let resolver = ErrorResolver::default();
        let mut call = Call::new(Request::get("/x"));
        resolver.resolve(&Failure::exception(ExceptionKind::IO, "disk"), &mut call);
        assert_eq!(call.response.status, 500);
        assert_eq!(call.response.body_text(), "IOException (disk)");
    }
}
