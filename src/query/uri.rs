//! Request URI assembly and parsing.
//!
//! A URI is `<base>/<Endpoint>[/<id>][.json|.xml][?<query>]`. The id segment is
//! percent-encoded; the query string comes from
//! [`QueryDescriptor::to_query_string`] and is omitted when empty.

use super::descriptor::QueryDescriptor;
use super::page::StartIndexPolicy;
use crate::error::{ScimError, ScimResult};
use crate::marshal::MediaType;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use std::fmt;

/// Characters escaped in an id segment: everything except RFC 3986
/// unreserved characters, plus `.` so an id never reads as a format suffix.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'~');

/// Normalize a base URI: a leading `/` unless it is absolute, no trailing `/`.
pub fn normalize_base(base: &str) -> String {
    let trimmed = base.trim().trim_end_matches('/');
    if trimmed.is_empty() || trimmed.contains("://") || trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}

/// A resource or collection URI with its query.
#[derive(Debug, Clone, PartialEq)]
pub struct ScimUri {
    base: String,
    endpoint: String,
    id: Option<String>,
    suffix: Option<MediaType>,
    query: QueryDescriptor,
}

impl ScimUri {
    pub fn new(base: &str, endpoint: impl Into<String>) -> Self {
        Self {
            base: normalize_base(base),
            endpoint: endpoint.into(),
            id: None,
            suffix: None,
            query: QueryDescriptor::default(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_query(mut self, query: QueryDescriptor) -> Self {
        self.query = query;
        self
    }

    pub fn with_suffix(mut self, media: MediaType) -> Self {
        self.suffix = Some(media);
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn suffix(&self) -> Option<MediaType> {
        self.suffix
    }

    pub fn query(&self) -> &QueryDescriptor {
        &self.query
    }

    pub fn into_query(self) -> QueryDescriptor {
        self.query
    }

    /// Path part only, without the query string.
    pub fn path(&self) -> String {
        let mut path = format!("{}/{}", self.base, self.endpoint);
        if let Some(id) = &self.id {
            path.push('/');
            path.extend(utf8_percent_encode(id, SEGMENT));
        }
        if let Some(media) = self.suffix {
            path.push('.');
            path.push_str(media.suffix());
        }
        path
    }

    /// Parse a request target (path plus optional query) relative to `base`.
    pub fn parse(base: &str, target: &str, policy: StartIndexPolicy) -> ScimResult<Self> {
        let base = normalize_base(base);
        let base_path = match base.split_once("://") {
            Some((_, rest)) => rest.find('/').map_or("", |i| &rest[i..]),
            None => base.as_str(),
        };

        let (path, query) = target.split_once('?').unwrap_or((target, ""));
        let relative = path
            .strip_prefix(base_path)
            .and_then(|rest| rest.strip_prefix('/'))
            .ok_or_else(|| ScimError::invalid_request(format!("'{}' is outside '{}'", path, base_path)))?;

        let segments: Vec<&str> = relative.trim_end_matches('/').split('/').collect();
        let (endpoint, id) = match segments.as_slice() {
            [endpoint] if !endpoint.is_empty() => (*endpoint, None),
            [endpoint, id] if !endpoint.is_empty() && !id.is_empty() => (*endpoint, Some(*id)),
            _ => {
                return Err(ScimError::invalid_request(format!("'{}' is not a resource path", path)));
            }
        };

        let (endpoint, id, suffix) = match id {
            Some(id) => {
                let (id, suffix) = split_suffix(id);
                (endpoint, Some(id), suffix)
            }
            None => {
                let (endpoint, suffix) = split_suffix(endpoint);
                (endpoint, None, suffix)
            }
        };

        let id = id
            .map(|raw| {
                percent_decode_str(raw)
                    .decode_utf8()
                    .map(|decoded| decoded.into_owned())
                    .map_err(|_| ScimError::invalid_request(format!("'{}' is not valid UTF-8", raw)))
            })
            .transpose()?;

        Ok(Self {
            base,
            endpoint: endpoint.to_string(),
            id,
            suffix,
            query: QueryDescriptor::parse_with(query, policy)?,
        })
    }
}

fn split_suffix(segment: &str) -> (&str, Option<MediaType>) {
    match segment.rsplit_once('.') {
        Some((head, tail)) if !head.is_empty() => match MediaType::from_suffix(tail) {
            Some(media) => (head, Some(media)),
            None => (segment, None),
        },
        _ => (segment, None),
    }
}

impl fmt::Display for ScimUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())?;
        let query = self.query.to_query_string();
        if !query.is_empty() {
            write!(f, "?{}", query)?;
        }
        Ok(())
    }
}
