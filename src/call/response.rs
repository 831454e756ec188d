use smallvec::SmallVec;
use std::sync::Arc;

/// Maximum inline headers before heap allocation
pub const MAX_INLINE_HEADERS: usize = 16;

/// Response header storage. Names are `Arc<str>` so static names clone in O(1).
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

/// Outbound response body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Body {
    #[default]
    Empty,
    Text(String),
    Bytes(Vec<u8>),
}

impl Body {
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Body::Empty => &[],
            Body::Text(s) => s.as_bytes(),
            Body::Bytes(b) => b,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.as_bytes().is_empty()
    }
}

impl From<String> for Body {
    fn from(s: String) -> Self {
        Body::Text(s)
    }
}

impl From<&str> for Body {
    fn from(s: &str) -> Self {
        Body::Text(s.to_string())
    }
}

impl From<Vec<u8>> for Body {
    fn from(b: Vec<u8>) -> Self {
        Body::Bytes(b)
    }
}

/// A cookie the client should store, or drop when `removed` is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseCookie {
    pub name: String,
    pub value: String,
    pub removed: bool,
}

impl ResponseCookie {
    /// The `Set-Cookie` header value for this cookie.
    #[must_use]
    pub fn header_value(&self) -> String {
        if self.removed {
            format!("{}=; Path=/; Max-Age=0", self.name)
        } else {
            format!("{}={}; Path=/", self.name, self.value)
        }
    }
}

/// Response being built for a call. Starts as an empty `200`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub headers: HeaderVec,
    pub cookies: Vec<ResponseCookie>,
    pub body: Body,
}

impl Default for Response {
    fn default() -> Self {
        Self {
            status: 200,
            headers: HeaderVec::new(),
            cookies: Vec::new(),
            body: Body::Empty,
        }
    }
}

impl Response {
    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Add or replace a header (case-insensitive on the name).
    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((Arc::from(name), value.into()));
    }

    /// Append a header, keeping existing values with the same name.
    pub fn add_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.push((Arc::from(name), value.into()));
    }

    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.get_header("content-type")
    }

    pub fn set_content_type(&mut self, content_type: &str) {
        self.set_header("Content-Type", content_type);
    }

    pub fn set_body(&mut self, body: impl Into<Body>) {
        self.body = body.into();
    }

    /// Body as text, lossily decoded.
    #[must_use]
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(self.body.as_bytes()).into_owned()
    }

    pub fn add_cookie(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.cookies.retain(|c| c.name != name);
        self.cookies.push(ResponseCookie {
            name,
            value: value.into(),
            removed: false,
        });
    }

    pub fn remove_cookie(&mut self, name: impl Into<String>) {
        let name = name.into();
        self.cookies.retain(|c| c.name != name);
        self.cookies.push(ResponseCookie {
            name,
            value: String::new(),
            removed: true,
        });
    }

    /// `Set-Cookie` header values for every cookie change, in the order they were made.
    #[must_use]
    pub fn set_cookie_headers(&self) -> Vec<String> {
        self.cookies.iter().map(ResponseCookie::header_value).collect()
    }
}
