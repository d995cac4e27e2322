//! Weak entity tags derived from resource content.
//!
//! The tag is a hash of the resource's JSON encoding, so every server
//! instance computes the same tag for the same content without storing
//! version numbers.

use crate::error::ScimError;

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// Opaque entity tag, rendered as `W/"<opaque>"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityTag {
    opaque: String,
}

impl EntityTag {
    /// Tag for `content`: the first 8 bytes of its SHA-256, base64 encoded.
    pub fn from_content(content: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(content);
        let hash = hasher.finalize();
        Self {
            opaque: BASE64.encode(&hash[..8]),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.opaque
    }

    /// Whether an `If-Match` header value accepts this tag. `*` matches any
    /// tag; otherwise the header is a comma-separated list of tags, compared
    /// by opaque value.
    pub fn matches_header(&self, if_match: &str) -> bool {
        let if_match = if_match.trim();
        if if_match == "*" {
            return true;
        }
        if_match
            .split(',')
            .filter_map(|candidate| candidate.parse::<EntityTag>().ok())
            .any(|candidate| candidate == *self)
    }
}

impl fmt::Display for EntityTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "W/\"{}\"", self.opaque)
    }
}

impl FromStr for EntityTag {
    type Err = ScimError;

    fn from_str(header: &str) -> Result<Self, Self::Err> {
        let trimmed = header.trim();
        let value = trimmed.strip_prefix("W/").unwrap_or(trimmed);
        let opaque = value
            .strip_prefix('"')
            .and_then(|v| v.strip_suffix('"'))
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ScimError::invalid_request(format!("Invalid entity tag: {}", header)))?;
        Ok(Self {
            opaque: opaque.to_string(),
        })
    }
}
