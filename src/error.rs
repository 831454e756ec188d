//! # Failure Taxonomy
//!
//! Everything that can go wrong while a [`Call`](crate::call::Call) is being
//! dispatched is expressed as a [`Failure`]:
//!
//! - [`CodedError`] carries an explicit HTTP status and is resolved by status
//!   code alone (validation errors, not-found, missing examples).
//! - [`Exception`] carries an [`ExceptionKind`] and is resolved by walking the
//!   kind's ancestor chain until a registered handler is found.
//!
//! Registration-time problems are reported separately as [`ConfigError`] and
//! never reach dispatch.
//!
//! ## Exception kinds
//!
//! Kinds form an explicit fallback table: each kind names its parent and the
//! chain always ends at [`ExceptionKind::EXCEPTION`]. Applications add their
//! own kinds as constants:
//!
//! ```rust
//! use routecore::error::ExceptionKind;
//!
//! const PAYMENT_DECLINED: ExceptionKind =
//!     ExceptionKind::new("PaymentDeclined", &ExceptionKind::ILLEGAL_STATE);
//!
//! let chain: Vec<&str> = PAYMENT_DECLINED.ancestors().map(|k| k.name()).collect();
//! assert_eq!(
//!     chain,
//!     ["PaymentDeclined", "IllegalStateException", "RuntimeException", "Exception"]
//! );
//! ```

use std::fmt;
use std::hash::{Hash, Hasher};

/// Identifier of a generic failure type with a link to its supertype.
///
/// Two kinds are equal when their names are equal, so names must be unique
/// within an application.
#[derive(Clone, Copy)]
pub struct ExceptionKind {
    name: &'static str,
    parent: Option<&'static ExceptionKind>,
}

impl ExceptionKind {
    /// Root of every chain. A handler for it is always registered.
    pub const EXCEPTION: ExceptionKind = ExceptionKind {
        name: "Exception",
        parent: None,
    };
    pub const RUNTIME: ExceptionKind = ExceptionKind::new("RuntimeException", &Self::EXCEPTION);
    pub const ILLEGAL_ARGUMENT: ExceptionKind =
        ExceptionKind::new("IllegalArgumentException", &Self::RUNTIME);
    pub const ILLEGAL_STATE: ExceptionKind =
        ExceptionKind::new("IllegalStateException", &Self::RUNTIME);
    pub const UNSUPPORTED_OPERATION: ExceptionKind =
        ExceptionKind::new("UnsupportedOperationException", &Self::RUNTIME);
    pub const IO: ExceptionKind = ExceptionKind::new("IOException", &Self::EXCEPTION);
    /// A callback panicked; the payload text becomes the message.
    pub const PANIC: ExceptionKind = ExceptionKind::new("Panic", &Self::RUNTIME);
    /// Reserved: coded failures never go through the kind table.
    pub const CODED: ExceptionKind = ExceptionKind::new("CodedException", &Self::RUNTIME);
    /// Reserved: the pass signal is a [`Flow`](crate::router::Flow) value, not a failure.
    pub const PASS: ExceptionKind = ExceptionKind::new("PassException", &Self::RUNTIME);

    /// Declare a kind whose fallback is `parent`.
    #[must_use]
    pub const fn new(name: &'static str, parent: &'static ExceptionKind) -> Self {
        Self {
            name,
            parent: Some(parent),
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub fn parent(&self) -> Option<ExceptionKind> {
        self.parent.copied()
    }

    /// This kind followed by each supertype up to the root.
    pub fn ancestors(self) -> impl Iterator<Item = ExceptionKind> {
        std::iter::successors(Some(self), |kind| kind.parent())
    }

    /// Kinds handled internally by the router that must not get user handlers.
    #[must_use]
    pub fn is_reserved(&self) -> bool {
        *self == Self::CODED || *self == Self::PASS
    }
}

impl PartialEq for ExceptionKind {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for ExceptionKind {}

impl Hash for ExceptionKind {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl fmt::Debug for ExceptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.parent {
            Some(parent) => write!(f, "{} < {}", self.name, parent.name),
            None => write!(f, "{}", self.name),
        }
    }
}

impl fmt::Display for ExceptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// A failure with an explicit HTTP status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodedError {
    pub code: u16,
    pub message: Option<String>,
}

impl CodedError {
    #[must_use]
    pub fn new(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            message: Some(message.into()),
        }
    }

    /// A coded failure without a message; the default handler answers with an empty body.
    #[must_use]
    pub fn status(code: u16) -> Self {
        Self {
            code,
            message: None,
        }
    }

    #[must_use]
    pub fn not_found(path: &str) -> Self {
        Self::new(404, format!("{path} not found"))
    }

    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(400, message)
    }
}

impl fmt::Display for CodedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(message) => write!(f, "{} {}", self.code, message),
            None => write!(f, "{}", self.code),
        }
    }
}

impl std::error::Error for CodedError {}

/// A generic failure resolved through the [`ExceptionKind`] hierarchy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exception {
    pub kind: ExceptionKind,
    pub message: Option<String>,
}

impl Exception {
    #[must_use]
    pub fn new(kind: ExceptionKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: Some(message.into()),
        }
    }

    #[must_use]
    pub fn of_kind(kind: ExceptionKind) -> Self {
        Self {
            kind,
            message: None,
        }
    }

    /// `"<kind> (<message or 'no details'>)"`, the body of the default 500 handler.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "{} ({})",
            self.kind.name(),
            self.message.as_deref().unwrap_or("no details")
        )
    }
}

impl fmt::Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary())
    }
}

impl std::error::Error for Exception {}

impl From<std::io::Error> for Exception {
    fn from(err: std::io::Error) -> Self {
        Exception::new(ExceptionKind::IO, err.to_string())
    }
}

/// Any failure raised while handling a call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    Coded(CodedError),
    Exception(Exception),
}

impl Failure {
    #[must_use]
    pub fn coded(code: u16, message: impl Into<String>) -> Self {
        Failure::Coded(CodedError::new(code, message))
    }

    #[must_use]
    pub fn exception(kind: ExceptionKind, message: impl Into<String>) -> Self {
        Failure::Exception(Exception::new(kind, message))
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Failure::Coded(e) => write!(f, "coded failure: {e}"),
            Failure::Exception(e) => write!(f, "exception: {e}"),
        }
    }
}

impl std::error::Error for Failure {}

impl From<CodedError> for Failure {
    fn from(err: CodedError) -> Self {
        Failure::Coded(err)
    }
}

impl From<Exception> for Failure {
    fn from(err: Exception) -> Self {
        Failure::Exception(err)
    }
}

impl From<std::io::Error> for Failure {
    fn from(err: std::io::Error) -> Self {
        Failure::Exception(err.into())
    }
}

impl From<anyhow::Error> for Failure {
    fn from(err: anyhow::Error) -> Self {
        let err = match err.downcast::<CodedError>() {
            Ok(coded) => return Failure::Coded(coded),
            Err(err) => err,
        };
        match err.downcast::<Exception>() {
            Ok(exception) => Failure::Exception(exception),
            Err(err) => Failure::Exception(Exception::new(ExceptionKind::RUNTIME, format!("{err:#}"))),
        }
    }
}

/// Registration-time configuration error.
///
/// Returned while building a router or compiling a specification; never
/// produced during dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A handler was registered for a kind the router handles itself.
    ReservedException {
        /// The reserved kind name
        kind: &'static str,
    },
    /// A path pattern could not be parsed.
    InvalidPattern {
        /// The offending pattern
        pattern: String,
        /// What is wrong with it
        reason: &'static str,
    },
    /// A parameter schema is not a valid JSON Schema.
    InvalidSchema {
        /// Parameter (or body) the schema belongs to
        parameter: String,
        /// Compiler message
        reason: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ReservedException { kind } => {
                write!(f, "{kind} is internal and must not be handled")
            }
            ConfigError::InvalidPattern { pattern, reason } => {
                write!(f, "invalid path pattern '{pattern}': {reason}")
            }
            ConfigError::InvalidSchema { parameter, reason } => {
                write!(f, "invalid schema for '{parameter}': {reason}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    const CUSTOM: ExceptionKind = ExceptionKind::new("Custom", &ExceptionKind::ILLEGAL_ARGUMENT);

    #[test]
    fn test_ancestor_chain_ends_at_root() {
        let names: Vec<_> = CUSTOM.ancestors().map(|k| k.name()).collect();
        assert_eq!(
            names,
            vec![
                "Custom",
                "IllegalArgumentException",
                "RuntimeException",
                "Exception"
            ]
        );
        assert_eq!(ExceptionKind::EXCEPTION.ancestors().count(), 1);
    }

    #[test]
    fn test_reserved_kinds() {
        assert!(ExceptionKind::CODED.is_reserved());
        assert!(ExceptionKind::PASS.is_reserved());
        assert!(!ExceptionKind::RUNTIME.is_reserved());
        assert!(!CUSTOM.is_reserved());
    }

    #[test]
    fn test_summary_without_message() {
        let e = Exception::of_kind(ExceptionKind::ILLEGAL_STATE);
        assert_eq!(e.summary(), "IllegalStateException (no details)");
        let e = Exception::new(ExceptionKind::IO, "disk gone");
        assert_eq!(e.summary(), "IOException (disk gone)");
    }

    #[test]
    fn test_anyhow_conversion_keeps_coded() {
        let err = anyhow::Error::new(CodedError::new(418, "teapot"));
        assert_eq!(Failure::from(err), Failure::coded(418, "teapot"));

        let err = anyhow::anyhow!("boom");
        match Failure::from(err) {
            Failure::Exception(e) => {
                assert_eq!(e.kind, ExceptionKind::RUNTIME);
                assert_eq!(e.message.as_deref(), Some("boom"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_io_error_maps_to_io_kind() {
        let err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        match Failure::from(err) {
            Failure::Exception(e) => assert_eq!(e.kind, ExceptionKind::IO),
            other => panic!("unexpected {other:?}"),
        }
    }
}
