//! # Runtime Configuration Module
//!
//! Environment variable-based configuration for the router and mock server.
//!
//! ## Environment Variables
//!
//! ### `ROUTECORE_EXAMPLE_HEADER`
//!
//! Request header naming the response example a mock route should answer
//! with. Default: `X-Mock-Response-Example`.
//!
//! ### `ROUTECORE_CATCH_PANICS`
//!
//! `true`/`false`, `1`/`0`, `on`/`off`. When on (the default) a panicking
//! callback is resolved as a `Panic` exception instead of unwinding through
//! `dispatch`.
//!
//! ### `ROUTECORE_STATIC_DIR`
//!
//! Optional directory served as assets by the mock server for paths no
//! operation matches.
//!
//! ## Usage
//!
//! ```rust
//! use routecore::runtime_config::RuntimeConfig;
//!
//! let config = RuntimeConfig::from_env();
//! println!("Example header: {}", config.example_header);
//! ```

use crate::examples::EXAMPLE_HEADER;
use std::env;
use std::path::PathBuf;

/// Runtime configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub example_header: String,
    pub catch_panics: bool,
    pub static_dir: Option<PathBuf>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            example_header: EXAMPLE_HEADER.to_string(),
            catch_panics: true,
            static_dir: None,
        }
    }
}

fn parse_flag(val: &str) -> Option<bool> {
    match val.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" => Some(false),
        _ => None,
    }
}

impl RuntimeConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup` instead of the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            example_header: lookup("ROUTECORE_EXAMPLE_HEADER")
                .map(|h| h.trim().to_string())
                .filter(|h| !h.is_empty())
                .unwrap_or(defaults.example_header),
            catch_panics: lookup("ROUTECORE_CATCH_PANICS")
                .and_then(|v| parse_flag(&v))
                .unwrap_or(defaults.catch_panics),
            static_dir: lookup("ROUTECORE_STATIC_DIR")
                .filter(|d| !d.trim().is_empty())
                .map(PathBuf::from),
        }
    }
}
