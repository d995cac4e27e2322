//! Per-encode namespace prefix assignment.

use quick_xml::events::BytesStart;

/// Ordered schema URI to prefix bindings built fresh for every encode call.
/// The default schema is unprefixed; every other schema receives `nsN` in the
/// order it is first assigned.
#[derive(Debug)]
pub(super) struct Namespaces {
    default: String,
    prefixes: Vec<(String, String)>,
}

impl Namespaces {
    pub fn new(default: &str) -> Self {
        Self {
            default: default.to_string(),
            prefixes: Vec::new(),
        }
    }

    pub fn assign(&mut self, schema: &str) {
        if schema == self.default || self.prefixes.iter().any(|(s, _)| s == schema) {
            return;
        }
        let prefix = format!("ns{}", self.prefixes.len() + 1);
        self.prefixes.push((schema.to_string(), prefix));
    }

    fn prefix(&self, schema: &str) -> Option<&str> {
        self.prefixes
            .iter()
            .find(|(s, _)| s == schema)
            .map(|(_, p)| p.as_str())
    }

    /// Element name for `local` in `schema`.
    pub fn qualify(&self, schema: &str, local: &str) -> String {
        match self.prefix(schema) {
            Some(prefix) => format!("{}:{}", prefix, local),
            None => local.to_string(),
        }
    }

    /// Add the `xmlns` declarations to a root element.
    pub fn declare(&self, element: &mut BytesStart<'_>) {
        element.push_attribute(("xmlns", self.default.as_str()));
        for (schema, prefix) in &self.prefixes {
            let key = format!("xmlns:{}", prefix);
            element.push_attribute((key.as_str(), schema.as_str()));
        }
    }
}
