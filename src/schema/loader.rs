//! Schema definition documents.
//!
//! A document declares the attributes of one schema URI and, optionally, the
//! resource types whose primary schema it is:
//!
//! ```json
//! {
//!   "schema": "urn:scim:schemas:core:1.0",
//!   "attributes": [
//!     {"name": "userName", "type": "string", "required": true},
//!     {"name": "emails", "plural": true,
//!      "subAttributes": [{"name": "type"}, {"name": "value"}]}
//!   ],
//!   "resources": [
//!     {"name": "User", "endpoint": "Users", "attributes": ["userName", "emails"]}
//!   ]
//! }
//! ```

use super::registry::SchemaRegistry;
use super::types::{AttributeDescriptor, DataType, ResourceDescriptor};
use crate::error::ConfigError;

use log::debug;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SchemaDocument {
    pub schema: String,
    #[serde(default)]
    pub attributes: Vec<AttributeDefinition>,
    #[serde(default)]
    pub resources: Vec<ResourceDefinition>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AttributeDefinition {
    pub name: String,
    #[serde(rename = "type", default)]
    pub data_type: DataType,
    #[serde(default)]
    pub plural: bool,
    #[serde(default)]
    pub plural_element: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub case_exact: bool,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub sub_attributes: Vec<AttributeDefinition>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ResourceDefinition {
    pub name: String,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub description: String,
    pub attributes: Vec<String>,
}

fn invalid(message: String) -> ConfigError {
    ConfigError::InvalidDefinition { message }
}

pub(crate) fn parse_document(content: &str, origin: &str) -> Result<SchemaDocument, ConfigError> {
    serde_json::from_str(content).map_err(|source| ConfigError::Json {
        path: origin.to_string(),
        source,
    })
}

pub(crate) fn read_file(path: &Path) -> Result<String, ConfigError> {
    fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })
}

/// `*.json` files directly inside `dir`, sorted by file name.
pub(crate) fn schema_files(dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let io_error = |source| ConfigError::Io {
        path: dir.display().to_string(),
        source,
    };
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_error)? {
        let path = entry.map_err(io_error)?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn build_attribute(schema: &str, definition: &AttributeDefinition) -> Result<AttributeDescriptor, ConfigError> {
    if definition.name.is_empty() {
        return Err(invalid(format!("attribute without a name in schema '{}'", schema)));
    }

    let mut builder = AttributeDescriptor::builder(schema, definition.name.as_str())
        .data_type(definition.data_type)
        .description(definition.description.as_str());
    if definition.plural {
        builder = builder.plural();
    }
    if definition.required {
        builder = builder.required();
    }
    if definition.case_exact {
        builder = builder.case_exact();
    }
    if let Some(element) = &definition.plural_element {
        builder = builder.plural_element(element.as_str());
    }

    let mut seen = HashSet::new();
    for sub in &definition.sub_attributes {
        if !sub.sub_attributes.is_empty() {
            return Err(invalid(format!(
                "sub-attribute '{}.{}' cannot itself be complex",
                definition.name, sub.name
            )));
        }
        if !seen.insert(sub.name.as_str()) {
            return Err(invalid(format!(
                "sub-attribute '{}.{}' is declared twice",
                definition.name, sub.name
            )));
        }
        builder = builder.sub_attribute_descriptor(build_attribute(schema, sub)?);
    }

    Ok(builder.build())
}

/// Register the attributes and then the resources of a parsed document.
pub(crate) fn install(registry: &SchemaRegistry, document: SchemaDocument) -> Result<(), ConfigError> {
    let schema = document.schema.as_str();
    if schema.is_empty() {
        return Err(invalid("document without a schema URI".to_string()));
    }

    let mut declared: HashMap<&str, Arc<AttributeDescriptor>> = HashMap::new();
    for definition in &document.attributes {
        if declared.contains_key(definition.name.as_str()) {
            return Err(invalid(format!(
                "attribute '{}' is declared twice in schema '{}'",
                definition.name, schema
            )));
        }
        let descriptor = registry.register_attribute(build_attribute(schema, definition)?)?;
        declared.insert(definition.name.as_str(), descriptor);
    }

    for definition in &document.resources {
        let mut resource = ResourceDescriptor::new(definition.name.as_str(), schema)
            .with_description(definition.description.as_str());
        if let Some(endpoint) = &definition.endpoint {
            resource = resource.with_endpoint(endpoint.as_str());
        }
        for name in &definition.attributes {
            let descriptor = declared.get(name.as_str()).ok_or_else(|| {
                invalid(format!(
                    "resource '{}' lists attribute '{}' which schema '{}' does not declare",
                    definition.name, name, schema
                ))
            })?;
            resource = resource.with_attribute(Arc::clone(descriptor));
        }
        registry.register_resource(resource)?;
    }

    debug!(
        "Loaded schema {} ({} attributes, {} resource types)",
        schema,
        document.attributes.len(),
        document.resources.len()
    );
    Ok(())
}
