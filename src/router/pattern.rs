//! Route patterns and matching.
//!
//! A pattern is a sequence of segments split on `/`:
//!
//! - literal segments match exactly (case-sensitive)
//! - `{name}` or `:name` matches one non-empty segment and binds it to `name`
//! - a trailing `*` matches any remaining suffix, including nothing
//!
//! Empty segments are ignored on both sides, so `/a//b/` and `/a/b` are the
//! same path to the matcher.

use crate::error::ConfigError;
use http::Method;
use smallvec::SmallVec;
use std::fmt;
use std::sync::Arc;

/// Maximum number of path parameters before heap allocation.
/// Most REST APIs have ≤4 path params (e.g., /users/{id}/posts/{postId}).
pub const MAX_INLINE_PARAMS: usize = 8;

/// Captured path parameters, in pattern order.
///
/// Names are `Arc<str>` shared with the pattern, so a match only allocates
/// the captured values.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Param(Arc<str>),
    Wildcard,
}

/// A parsed path pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    source: String,
    segments: Vec<Segment>,
}

fn split_path(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

fn invalid(pattern: &str, reason: &'static str) -> ConfigError {
    ConfigError::InvalidPattern {
        pattern: pattern.to_string(),
        reason,
    }
}

impl PathPattern {
    pub fn parse(pattern: &str) -> Result<Self, ConfigError> {
        if !pattern.starts_with('/') {
            return Err(invalid(pattern, "must start with '/'"));
        }

        let raw: Vec<&str> = split_path(pattern).collect();
        let mut segments = Vec::with_capacity(raw.len());
        for (i, seg) in raw.iter().enumerate() {
            let segment = if *seg == "*" {
                if i + 1 != raw.len() {
                    return Err(invalid(pattern, "wildcard must be the last segment"));
                }
                Segment::Wildcard
            } else if let Some(name) = seg.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                Segment::Param(param_name(pattern, name)?)
            } else if let Some(name) = seg.strip_prefix(':') {
                Segment::Param(param_name(pattern, name)?)
            } else if seg.contains('{') || seg.contains('}') {
                return Err(invalid(pattern, "parameters must span a whole segment"));
            } else {
                Segment::Literal((*seg).to_string())
            };
            segments.push(segment);
        }

        Ok(Self {
            source: pattern.to_string(),
            segments,
        })
    }

    /// Pattern matching every path.
    #[must_use]
    pub fn any() -> Self {
        Self {
            source: "/*".to_string(),
            segments: vec![Segment::Wildcard],
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    #[must_use]
    pub fn param_names(&self) -> Vec<&str> {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Param(name) => Some(name.as_ref()),
                _ => None,
            })
            .collect()
    }

    /// Match the whole path, returning the captured parameters.
    #[must_use]
    pub fn matches(&self, path: &str) -> Option<ParamVec> {
        let mut params = ParamVec::new();
        let mut parts = split_path(path);
        for segment in &self.segments {
            match segment {
                Segment::Wildcard => return Some(params),
                Segment::Literal(lit) => {
                    if parts.next()? != lit {
                        return None;
                    }
                }
                Segment::Param(name) => {
                    let value = parts.next()?;
                    params.push((Arc::clone(name), value.to_string()));
                }
            }
        }
        if parts.next().is_some() {
            return None;
        }
        Some(params)
    }

    /// Match the pattern against the start of `path`.
    ///
    /// Returns the captures and the unmatched remainder, which always starts
    /// with `/` (`"/"` when nothing is left). A trailing wildcard in a prefix
    /// pattern is ignored.
    #[must_use]
    pub fn match_prefix(&self, path: &str) -> Option<(ParamVec, String)> {
        let mut params = ParamVec::new();
        let mut parts = split_path(path);
        for segment in &self.segments {
            match segment {
                Segment::Wildcard => break,
                Segment::Literal(lit) => {
                    if parts.next()? != lit {
                        return None;
                    }
                }
                Segment::Param(name) => {
                    let value = parts.next()?;
                    params.push((Arc::clone(name), value.to_string()));
                }
            }
        }
        let mut remaining = String::new();
        for part in parts {
            remaining.push('/');
            remaining.push_str(part);
        }
        if remaining.is_empty() {
            remaining.push('/');
        } else if path.ends_with('/') {
            remaining.push('/');
        }
        Some((params, remaining))
    }
}

fn param_name(pattern: &str, name: &str) -> Result<Arc<str>, ConfigError> {
    if name.is_empty() {
        return Err(invalid(pattern, "parameter name must not be empty"));
    }
    if name.contains('{') || name.contains('}') {
        return Err(invalid(pattern, "parameter name must not contain braces"));
    }
    Ok(Arc::from(name))
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Which methods a route accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MethodMatch {
    All,
    Only(Method),
}

impl MethodMatch {
    #[inline]
    #[must_use]
    pub fn accepts(&self, method: &Method) -> bool {
        match self {
            MethodMatch::All => true,
            MethodMatch::Only(m) => m == method,
        }
    }
}

impl From<Method> for MethodMatch {
    fn from(method: Method) -> Self {
        MethodMatch::Only(method)
    }
}

impl fmt::Display for MethodMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MethodMatch::All => f.write_str("ALL"),
            MethodMatch::Only(m) => write!(f, "{m}"),
        }
    }
}

/// Immutable (method, pattern) registration target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub method: MethodMatch,
    pub pattern: PathPattern,
}

impl Route {
    pub fn new(method: impl Into<MethodMatch>, pattern: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            method: method.into(),
            pattern: PathPattern::parse(pattern)?,
        })
    }

    /// Route accepting every method.
    pub fn all(pattern: &str) -> Result<Self, ConfigError> {
        Self::new(MethodMatch::All, pattern)
    }

    #[inline]
    #[must_use]
    pub fn matches(&self, method: &Method, path: &str) -> Option<ParamVec> {
        if !self.method.accepts(method) {
            return None;
        }
        self.pattern.matches(path)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.pattern)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_match_is_case_sensitive() {
        let p = PathPattern::parse("/pets/list").unwrap();
        assert!(p.matches("/pets/list").is_some());
        assert!(p.matches("/pets/list/").is_some());
        assert!(p.matches("/Pets/list").is_none());
        assert!(p.matches("/pets").is_none());
        assert!(p.matches("/pets/list/extra").is_none());
    }

    #[test]
    fn test_param_captures() {
        let p = PathPattern::parse("/users/{id}/posts/:post").unwrap();
        let params = p.matches("/users/42/posts/7").unwrap();
        assert_eq!(params.len(), 2);
        assert_eq!(params[0].0.as_ref(), "id");
        assert_eq!(params[0].1, "42");
        assert_eq!(params[1].0.as_ref(), "post");
        assert_eq!(params[1].1, "7");
        assert_eq!(p.param_names(), vec!["id", "post"]);
    }

    #[test]
    fn test_trailing_wildcard() {
        let p = PathPattern::parse("/static/*").unwrap();
        assert!(p.matches("/static").is_some());
        assert!(p.matches("/static/css/site.css").is_some());
        assert!(p.matches("/other").is_none());
        assert!(PathPattern::any().matches("/").is_some());
    }

    #[test]
    fn test_root_pattern() {
        let p = PathPattern::parse("/").unwrap();
        assert!(p.matches("/").is_some());
        assert!(p.matches("/a").is_none());
    }

    #[test]
    fn test_invalid_patterns() {
        assert!(PathPattern::parse("no-slash").is_err());
        assert!(PathPattern::parse("/a/*/b").is_err());
        assert!(PathPattern::parse("/a/{}").is_err());
        assert!(PathPattern::parse("/a/:").is_err());
        assert!(PathPattern::parse("/a/x{id}").is_err());
    }

    #[test]
    fn test_match_prefix_remaining() {
        let p = PathPattern::parse("/api/{version}").unwrap();
        let (params, rest) = p.match_prefix("/api/v1/users/5").unwrap();
        assert_eq!(params[0].1, "v1");
        assert_eq!(rest, "/users/5");
        let (_, rest) = p.match_prefix("/api/v2").unwrap();
        assert_eq!(rest, "/");
        let (_, rest) = p.match_prefix("/api/v2/dir/").unwrap();
        assert_eq!(rest, "/dir/");
        assert!(p.match_prefix("/other/v1").is_none());
    }

    #[test]
    fn test_route_method() {
        let r = Route::new(Method::GET, "/a").unwrap();
        assert!(r.matches(&Method::GET, "/a").is_some());
        assert!(r.matches(&Method::POST, "/a").is_none());
        let all = Route::all("/a").unwrap();
        assert!(all.matches(&Method::PATCH, "/a").is_some());
        assert_eq!(r.to_string(), "GET /a");
        assert_eq!(all.to_string(), "ALL /a");
    }
}
