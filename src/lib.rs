//! # routecore
//!
//! **routecore** is an embeddable HTTP dispatch core. It knows nothing about
//! sockets: an application hands it a [`Call`] (request plus mutable
//! response) and the [`Router`] runs it through an ordered chain of handlers.
//!
//! ## Overview
//!
//! - **Filters** run before and after the route stage, in registration order.
//! - **Routes** are matched by method and path pattern; the first match that
//!   does not [`pass`](crate::call::Call::pass) wins.
//! - **Mounts** delegate a path prefix to a sub-router.
//! - **Assets** serve resources from a directory or an in-memory store.
//! - **Errors** raised anywhere are resolved centrally: coded failures by
//!   status code, generic failures through an [`ExceptionKind`] hierarchy.
//!
//! On top of that, [`mock`] builds a router straight from an OpenAPI
//! document: each operation validates its parameters and body and answers
//! with one of the declared response examples.
//!
//! ## Architecture
//!
//! - **[`call`]** - Request, response and the per-dispatch [`Call`]
//! - **[`router`]** - Handler chain, path patterns and the dispatch loop
//! - **[`resolver`]** - Coded and exception error handler lookup
//! - **[`error`]** - Failure taxonomy and registration errors
//! - **[`static_files`]** - Resource stores for asset handlers
//! - **[`spec`]** - OpenAPI loading and the flattened operation table
//! - **[`validator`]** - Parameter and body validation for mock routes
//! - **[`examples`]** - Response example selection
//! - **[`mock`]** - Spec-driven mock router
//! - **[`hot_reload`]** - Rebuild a mock router when its spec changes
//! - **[`runtime_config`]** / **[`logging`]** - Environment-driven setup
//!
//! ## Quick Start
//!
//! ```rust
//! use routecore::{Call, Request, Router};
//!
//! let router = Router::builder()
//!     .get("/ping", |call: &mut Call| call.ok("pong"))
//!     .build()
//!     .unwrap();
//!
//! let mut call = Call::new(Request::get("/ping"));
//! router.dispatch(&mut call);
//! assert_eq!(call.response.status, 200);
//! assert_eq!(call.response.body_text(), "pong");
//! ```

pub mod call;
pub mod error;
pub mod examples;
pub mod hot_reload;
pub mod ids;
pub mod logging;
pub mod mock;
pub mod resolver;
pub mod router;
pub mod runtime_config;
pub mod spec;
pub mod static_files;
pub mod validator;

pub use call::{Call, Request, Response};
pub use error::{CodedError, ConfigError, Exception, ExceptionKind, Failure};
pub use mock::MockServer;
pub use router::{Flow, HandlerResult, Route, Router, SharedRouter};
pub use spec::{load_spec, ApiSpec};
