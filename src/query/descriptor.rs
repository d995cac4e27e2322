//! Parsed query parameters.

use super::filter::Filter;
use super::page::{PageSpec, StartIndexPolicy};
use super::path::AttributePath;
use super::selection::AttributeSelection;
use super::sort::{SortOrder, SortSpec};
use crate::error::{ScimError, ScimResult};
use crate::schema::{ResourceDescriptor, SchemaRegistry};

use std::collections::HashMap;
use url::form_urlencoded;

const ATTRIBUTES: &str = "attributes";
const FILTER: &str = "filter";
const SORT_BY: &str = "sortBy";
const SORT_ORDER: &str = "sortOrder";
const START_INDEX: &str = "startIndex";
const COUNT: &str = "count";

/// Backend-neutral bundle of attribute selection, filter, sort and paging.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryDescriptor {
    pub selection: AttributeSelection,
    pub filter: Option<Filter>,
    pub sort: Option<SortSpec>,
    pub page: Option<PageSpec>,
}

impl QueryDescriptor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_selection(mut self, selection: AttributeSelection) -> Self {
        self.selection = selection;
        self
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn with_sort(mut self, sort: SortSpec) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn with_page(mut self, page: PageSpec) -> Self {
        self.page = Some(page);
        self
    }

    /// True when no parameter differs from its default.
    pub fn is_empty(&self) -> bool {
        self.selection.is_all() && self.filter.is_none() && self.sort.is_none() && self.page.is_none()
    }

    /// Parse a query string, with or without its leading `?`, clamping
    /// non-positive start indexes.
    pub fn parse(query: &str) -> ScimResult<Self> {
        Self::parse_with(query, StartIndexPolicy::Clamp)
    }

    /// Parse a query string. Unknown parameters are ignored; a repeated
    /// parameter is an error.
    pub fn parse_with(query: &str, policy: StartIndexPolicy) -> ScimResult<Self> {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut parameters: HashMap<String, String> = HashMap::new();
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            if !is_known(&key) {
                continue;
            }
            if parameters.contains_key(&*key) {
                return Err(ScimError::invalid_parameter(
                    key.into_owned(),
                    "parameter given more than once",
                ));
            }
            parameters.insert(key.into_owned(), value.into_owned());
        }
        let get = |name: &str| parameters.get(name).map(String::as_str);

        let selection = match get(ATTRIBUTES) {
            Some(text) => AttributeSelection::parse(text)?,
            None => AttributeSelection::all(),
        };
        let filter = match get(FILTER).map(str::trim) {
            Some(text) if !text.is_empty() => Some(Filter::parse(text)?),
            _ => None,
        };
        let sort = SortSpec::from_parameters(get(SORT_BY), get(SORT_ORDER))?;
        let page = PageSpec::from_parameters(get(START_INDEX), get(COUNT), policy)?;

        Ok(Self {
            selection,
            filter,
            sort,
            page,
        })
    }

    /// Query string without the leading `?`. Parameters appear in a fixed
    /// order and only when they differ from their defaults.
    pub fn to_query_string(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        if !self.selection.is_all() {
            serializer.append_pair(ATTRIBUTES, &self.selection.to_query_value());
        }
        if let Some(filter) = &self.filter {
            serializer.append_pair(FILTER, &filter.to_string());
        }
        if let Some(sort) = &self.sort {
            serializer.append_pair(SORT_BY, &sort.path.to_string());
            if sort.order == SortOrder::Descending {
                serializer.append_pair(SORT_ORDER, sort.order.as_str());
            }
        }
        if let Some(page) = &self.page {
            serializer.append_pair(START_INDEX, &page.start_index().to_string());
            if let Some(count) = page.count() {
                serializer.append_pair(COUNT, &count.to_string());
            }
        }
        serializer.finish()
    }

    /// Every attribute path named by the selection, filter and sort key.
    pub fn paths(&self) -> Vec<&AttributePath> {
        let mut paths: Vec<&AttributePath> = self.selection.paths().iter().collect();
        if let Some(filter) = &self.filter {
            paths.extend(filter.paths());
        }
        if let Some(sort) = &self.sort {
            paths.push(&sort.path);
        }
        paths
    }

    /// Check that every path names an attribute registered for `resource`.
    pub fn validate(&self, registry: &SchemaRegistry, resource: &ResourceDescriptor) -> ScimResult<()> {
        for path in self.paths() {
            if path.resolve(registry, resource).is_none() {
                return Err(ScimError::unknown_attribute(
                    path.schema_or(resource.schema()),
                    path.to_string(),
                ));
            }
        }
        Ok(())
    }
}

fn is_known(key: &str) -> bool {
    matches!(key, ATTRIBUTES | FILTER | SORT_BY | SORT_ORDER | START_INDEX | COUNT)
}
