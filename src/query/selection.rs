//! The `attributes` query parameter.

use super::path::AttributePath;
use crate::error::ScimResult;

/// Requested attribute set. Empty means every attribute.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeSelection {
    paths: Vec<AttributePath>,
}

impl AttributeSelection {
    /// Selection of every attribute.
    pub fn all() -> Self {
        Self::default()
    }

    /// Selection of the given paths; repeated paths are kept once.
    pub fn of(paths: impl IntoIterator<Item = AttributePath>) -> Self {
        let mut selection = Self::default();
        for path in paths {
            if !selection.paths.contains(&path) {
                selection.paths.push(path);
            }
        }
        selection
    }

    /// Parse a comma-separated list. Blank entries are ignored.
    pub fn parse(text: &str) -> ScimResult<Self> {
        let paths = text
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(|entry| AttributePath::parse(entry, "attributes"))
            .collect::<ScimResult<Vec<_>>>()?;
        Ok(Self::of(paths))
    }

    pub fn is_all(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn paths(&self) -> &[AttributePath] {
        &self.paths
    }

    /// Wire form, entries in the order they were given.
    pub fn to_query_value(&self) -> String {
        self.paths
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",")
    }
}
