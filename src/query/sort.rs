//! The `sortBy` and `sortOrder` query parameters.

use super::path::AttributePath;
use crate::error::{ScimError, ScimResult};

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ascending => "ascending",
            Self::Descending => "descending",
        }
    }

    pub fn parse(text: &str) -> ScimResult<Self> {
        if text.eq_ignore_ascii_case("ascending") {
            Ok(Self::Ascending)
        } else if text.eq_ignore_ascii_case("descending") {
            Ok(Self::Descending)
        } else {
            Err(ScimError::invalid_parameter(
                "sortOrder",
                format!("'{}' is neither ascending nor descending", text),
            ))
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sort key and direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub path: AttributePath,
    pub order: SortOrder,
}

impl SortSpec {
    pub fn ascending(path: AttributePath) -> Self {
        Self {
            path,
            order: SortOrder::Ascending,
        }
    }

    pub fn descending(path: AttributePath) -> Self {
        Self {
            path,
            order: SortOrder::Descending,
        }
    }

    /// Build from the raw parameter values. A sort order without a sort key
    /// is rejected.
    pub fn from_parameters(sort_by: Option<&str>, sort_order: Option<&str>) -> ScimResult<Option<Self>> {
        let order = sort_order.map(SortOrder::parse).transpose()?.unwrap_or_default();
        match sort_by.map(str::trim) {
            Some(sort_by) if !sort_by.is_empty() => Ok(Some(Self {
                path: AttributePath::parse(sort_by, "sortBy")?,
                order,
            })),
            _ if sort_order.is_some() => Err(ScimError::invalid_parameter(
                "sortOrder",
                "sortOrder requires sortBy",
            )),
            _ => Ok(None),
        }
    }
}
