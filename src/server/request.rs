//! Transport-neutral HTTP request and response values.
//!
//! A transport (hyper, axum, a test harness) copies method, target, headers
//! and body into a [`ScimRequest`] and writes the returned [`ScimResponse`]
//! back out.

use crate::error::{ScimError, ScimResult};
use crate::marshal::MediaType;

use std::fmt;
use std::str::FromStr;

pub const ACCEPT: &str = "Accept";
pub const AUTHORIZATION: &str = "Authorization";
pub const CONTENT_TYPE: &str = "Content-Type";
pub const ETAG: &str = "ETag";
pub const IF_MATCH: &str = "If-Match";
pub const LOCATION: &str = "Location";

/// HTTP methods the protocol binding uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = ScimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "PATCH" => Ok(Self::Patch),
            "DELETE" => Ok(Self::Delete),
            other => Err(ScimError::NotImplemented {
                operation: other.to_string(),
            }),
        }
    }
}

/// Header list with case-insensitive lookup. Insertion order is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers(Vec<(String, String)>);

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// First value of `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Set `name`, replacing any earlier values.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.0.retain(|(key, _)| !key.eq_ignore_ascii_case(&name));
        self.0.push((name, value.into()));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Headers {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Self::new();
        for (name, value) in iter {
            headers.insert(name, value);
        }
        headers
    }
}

/// One inbound request.
#[derive(Debug, Clone, PartialEq)]
pub struct ScimRequest {
    pub method: Method,
    /// Path plus optional `?query`, e.g. `/scim/Users?filter=...`.
    pub target: String,
    pub headers: Headers,
    pub body: Vec<u8>,
}

impl ScimRequest {
    pub fn new(method: Method, target: impl Into<String>) -> Self {
        Self {
            method,
            target: target.into(),
            headers: Headers::new(),
            body: Vec::new(),
        }
    }

    pub fn get(target: impl Into<String>) -> Self {
        Self::new(Method::Get, target)
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Attach a body together with its `Content-Type`.
    pub fn with_body(mut self, media: MediaType, body: Vec<u8>) -> Self {
        self.headers.insert(CONTENT_TYPE, media.mime());
        self.body = body;
        self
    }

    /// Media type declared for the body, if any.
    pub fn content_type(&self) -> ScimResult<Option<MediaType>> {
        self.headers
            .get(CONTENT_TYPE)
            .map(MediaType::from_content_type)
            .transpose()
    }
}

/// One outbound response.
#[derive(Debug, Clone, PartialEq)]
pub struct ScimResponse {
    pub status: u16,
    pub headers: Headers,
    pub body: Vec<u8>,
}

impl ScimResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: Headers::new(),
            body: Vec::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_body(mut self, media: MediaType, body: Vec<u8>) -> Self {
        self.headers.insert(CONTENT_TYPE, media.mime());
        self.body = body;
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn content_type(&self) -> ScimResult<Option<MediaType>> {
        self.headers
            .get(CONTENT_TYPE)
            .map(MediaType::from_content_type)
            .transpose()
    }
}
