//! Top-level document shapes shared by both wire formats.

use crate::error::ScimError;
use crate::resource::ScimResource;

use std::collections::HashSet;

/// One entry of an error document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorEntry {
    pub description: String,
    pub code: Option<String>,
    pub uri: Option<String>,
}

impl ErrorEntry {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            code: None,
            uri: None,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }
}

impl From<&ScimError> for ErrorEntry {
    fn from(error: &ScimError) -> Self {
        ErrorEntry::new(error.to_string()).with_code(error.error_code())
    }
}

/// A collection response.
///
/// `start_index` and `items_per_page` are only carried when the request asked
/// for paging.
#[derive(Debug, Clone, PartialEq)]
pub struct ListResponse {
    pub total_results: u64,
    pub start_index: Option<u64>,
    pub items_per_page: Option<u64>,
    pub resources: Vec<ScimResource>,
}

impl ListResponse {
    /// Unpaged list whose total is the number of resources.
    pub fn new(resources: Vec<ScimResource>) -> Self {
        Self {
            total_results: resources.len() as u64,
            start_index: None,
            items_per_page: None,
            resources,
        }
    }

    pub fn with_total(mut self, total_results: u64) -> Self {
        self.total_results = total_results;
        self
    }

    /// Record the page actually returned.
    pub fn with_page(mut self, start_index: u64) -> Self {
        self.start_index = Some(start_index);
        self.items_per_page = Some(self.resources.len() as u64);
        self
    }

    /// True when the resources are not all of one resource type. Encoders
    /// then tag every element with its type.
    pub fn is_heterogeneous(&self) -> bool {
        let types: HashSet<&str> = self.resources.iter().map(|r| r.resource_type()).collect();
        types.len() > 1
    }
}

/// Any decoded top-level document.
#[derive(Debug, Clone, PartialEq)]
pub enum ScimDocument {
    Resource(ScimResource),
    List(ListResponse),
    Errors(Vec<ErrorEntry>),
}

impl ScimDocument {
    pub fn into_resource(self) -> Option<ScimResource> {
        match self {
            Self::Resource(resource) => Some(resource),
            _ => None,
        }
    }

    pub fn into_list(self) -> Option<ListResponse> {
        match self {
            Self::List(list) => Some(list),
            _ => None,
        }
    }

    pub fn into_errors(self) -> Option<Vec<ErrorEntry>> {
        match self {
            Self::Errors(errors) => Some(errors),
            _ => None,
        }
    }
}
