//! Media types and content negotiation.

use crate::error::{ScimError, ScimResult};

use serde::{Deserialize, Serialize};
use std::fmt;

/// The two wire formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    #[default]
    Json,
    Xml,
}

impl MediaType {
    pub fn mime(&self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Xml => "application/xml",
        }
    }

    /// Legacy URI suffix selecting this format, without the dot.
    pub fn suffix(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Xml => "xml",
        }
    }

    pub fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix.to_ascii_lowercase().as_str() {
            "json" => Some(Self::Json),
            "xml" => Some(Self::Xml),
            _ => None,
        }
    }

    fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
        match essence.as_str() {
            "application/json" => Some(Self::Json),
            "application/xml" | "text/xml" => Some(Self::Xml),
            _ => None,
        }
    }

    /// Media type of a request body from its `Content-Type` header.
    pub fn from_content_type(content_type: &str) -> ScimResult<Self> {
        Self::from_mime(content_type)
            .ok_or_else(|| ScimError::UnsupportedMediaType(content_type.to_string()))
    }

    /// Pick the response format from an `Accept` header. Entries are tried
    /// highest `q` first, header order breaking ties; `q=0` entries are never
    /// chosen. Wildcards select `default`, as does a missing or blank header.
    pub fn negotiate(accept: Option<&str>, default: MediaType) -> ScimResult<Self> {
        let Some(accept) = accept.filter(|a| !a.trim().is_empty()) else {
            return Ok(default);
        };
        let mut entries: Vec<(&str, f32)> = accept.split(',').map(accept_entry).collect();
        entries.sort_by(|a, b| b.1.total_cmp(&a.1));
        for (essence, quality) in entries {
            if quality <= 0.0 {
                continue;
            }
            if essence == "*/*" || essence.eq_ignore_ascii_case("application/*") {
                return Ok(default);
            }
            if let Some(media) = Self::from_mime(essence) {
                return Ok(media);
            }
        }
        Err(ScimError::UnsupportedMediaType(accept.to_string()))
    }
}

/// Media range and quality of one `Accept` entry. A malformed `q` counts as 1.
fn accept_entry(entry: &str) -> (&str, f32) {
    let mut parts = entry.split(';');
    let essence = parts.next().unwrap_or("").trim();
    let quality = parts
        .filter_map(|param| param.split_once('='))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("q"))
        .and_then(|(_, value)| value.trim().parse::<f32>().ok())
        .filter(|q| q.is_finite())
        .unwrap_or(1.0);
    (essence, quality)
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime())
    }
}
