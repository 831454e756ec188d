//! # Router Module
//!
//! The router owns an ordered sequence of [`RequestHandler`]s and dispatches
//! [`Call`](crate::call::Call)s through it.
//!
//! ## Overview
//!
//! - [`pattern`]: path patterns with `{name}` captures and trailing wildcards
//! - [`Router`] / [`RouterBuilder`]: registration and the dispatch loop
//! - [`SharedRouter`]: copy-on-write handle for reconfiguring a live router
//!
//! Registration order is dispatch precedence: for two routes matching the same
//! request the one registered first runs first, and only yields to the second
//! by returning [`Flow::Pass`].
//!
//! ## Example
//!
//! ```rust
//! use routecore::call::{Call, Request};
//! use routecore::router::Router;
//!
//! let router = Router::builder()
//!     .before("/*", |call: &mut Call| {
//!         call.response.set_header("X-Served-By", "routecore");
//!         call.pass()
//!     })
//!     .get("/hello/{name}", |call: &mut Call| {
//!         let name = call.path_param("name").unwrap_or("world").to_string();
//!         call.ok(format!("Hello {name}"))
//!     })
//!     .build()?;
//!
//! let mut call = Call::new(Request::get("/hello/ferris"));
//! router.dispatch(&mut call);
//! assert_eq!(call.response.status, 200);
//! assert_eq!(call.response.body_text(), "Hello ferris");
//! assert_eq!(call.response.get_header("x-served-by"), Some("routecore"));
//!
//! let mut call = Call::new(Request::get("/missing"));
//! router.dispatch(&mut call);
//! assert_eq!(call.response.status, 404);
//! assert_eq!(call.response.body_text(), "/missing not found");
//! # Ok::<(), routecore::error::ConfigError>(())
//! ```

mod core;
mod handler;
pub mod pattern;
mod shared;

pub use self::core::{Router, RouterBuilder};
pub use handler::{
    ErrorCodeCallback, ExceptionCallback, FilterCallback, FilterOrder, Flow, HandlerResult,
    RequestHandler, RouteCallback,
};
pub use pattern::{MethodMatch, ParamVec, PathPattern, Route, Segment, MAX_INLINE_PARAMS};
pub use shared::SharedRouter;
