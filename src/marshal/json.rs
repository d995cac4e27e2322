//! Key-value (JSON) codec.
//!
//! A resource is an object holding `schemas`, its primary-schema attributes as
//! top-level members, and one nested object per extension schema keyed by the
//! schema URI. Collections wrap resources in `Resources` next to
//! `totalResults`, `itemsPerPage` and `startIndex`; errors are an `Errors`
//! array. Elements of a heterogeneous collection carry a `resourceType`
//! member.

use super::document::{ErrorEntry, ListResponse, ScimDocument};
use super::media::MediaType;
use super::plan::{EmissionPlan, Resolver, assemble, ordered_sub_attributes};
use super::Codec;
use crate::error::{ScimError, ScimResult};
use crate::resource::{Attribute, AttributeValue, AttributeValues, ComplexValue, ScimResource, SimpleValue};
use crate::schema::{AttributeDescriptor, CORE_SCHEMA, DataType, SchemaRegistry};

use log::debug;
use serde_json::{Map, Value, json};
use std::sync::Arc;

const SCHEMAS: &str = "schemas";
const RESOURCE_TYPE: &str = "resourceType";
const RESOURCES: &str = "Resources";
const TOTAL_RESULTS: &str = "totalResults";
const ITEMS_PER_PAGE: &str = "itemsPerPage";
const START_INDEX: &str = "startIndex";
const ERRORS: &str = "Errors";

/// JSON codec bound to a schema registry.
#[derive(Debug, Clone)]
pub struct JsonCodec {
    registry: Arc<SchemaRegistry>,
    strict: bool,
}

impl JsonCodec {
    /// Lenient codec: unknown attributes are dropped on decode.
    pub fn new(registry: Arc<SchemaRegistry>) -> Self {
        Self {
            registry,
            strict: false,
        }
    }

    /// Fail decoding with [`ScimError::UnknownAttribute`] instead of dropping.
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// JSON tree of a single resource.
    pub fn to_value(&self, resource: &ScimResource) -> Value {
        Value::Object(self.resource_object(resource, false))
    }

    /// Decode an already parsed JSON tree.
    pub fn from_value(&self, value: &Value, resource_type: Option<&str>) -> ScimResult<ScimDocument> {
        let object = value
            .as_object()
            .ok_or_else(|| ScimError::malformed(format!("top-level JSON {} is not an object", kind(value))))?;
        let resolver = Resolver::new(&self.registry, self.strict);

        if let Some(errors) = object.get(ERRORS) {
            return decode_errors(errors).map(ScimDocument::Errors);
        }
        if object.contains_key(RESOURCES) || object.contains_key(TOTAL_RESULTS) {
            return decode_list(resolver, object, resource_type).map(ScimDocument::List);
        }

        let resource_type = resource_type
            .or_else(|| object.get(RESOURCE_TYPE).and_then(Value::as_str))
            .ok_or_else(|| ScimError::malformed("cannot determine the resource type of the document"))?;
        decode_resource(resolver, object, resource_type).map(ScimDocument::Resource)
    }

    fn resource_object(&self, resource: &ScimResource, discriminator: bool) -> Map<String, Value> {
        let plan = EmissionPlan::new(&self.registry, resource);
        let mut object = Map::new();
        object.insert(SCHEMAS.to_string(), json!(resource.schemas()));
        if discriminator {
            object.insert(RESOURCE_TYPE.to_string(), json!(resource.resource_type()));
        }
        for attribute in plan.primary {
            object.insert(attribute.name().to_string(), attribute_json(attribute));
        }
        for (schema, attributes) in plan.extensions {
            let nested: Map<String, Value> = attributes
                .iter()
                .map(|a| (a.name().to_string(), attribute_json(a)))
                .collect();
            object.insert(schema.to_string(), Value::Object(nested));
        }
        object
    }
}

impl Codec for JsonCodec {
    fn media_type(&self) -> MediaType {
        MediaType::Json
    }

    fn encode(&self, resource: &ScimResource) -> ScimResult<Vec<u8>> {
        to_bytes(&self.to_value(resource))
    }

    fn encode_list(&self, list: &ListResponse) -> ScimResult<Vec<u8>> {
        let discriminator = list.is_heterogeneous();
        let mut object = Map::new();
        object.insert(SCHEMAS.to_string(), json!([CORE_SCHEMA]));
        object.insert(TOTAL_RESULTS.to_string(), json!(list.total_results));
        if let Some(items_per_page) = list.items_per_page {
            object.insert(ITEMS_PER_PAGE.to_string(), json!(items_per_page));
        }
        if let Some(start_index) = list.start_index {
            object.insert(START_INDEX.to_string(), json!(start_index));
        }
        let resources: Vec<Value> = list
            .resources
            .iter()
            .map(|r| Value::Object(self.resource_object(r, discriminator)))
            .collect();
        object.insert(RESOURCES.to_string(), Value::Array(resources));
        to_bytes(&Value::Object(object))
    }

    fn encode_errors(&self, errors: &[ErrorEntry]) -> ScimResult<Vec<u8>> {
        let entries: Vec<Value> = errors
            .iter()
            .map(|error| {
                let mut entry = Map::new();
                entry.insert("description".to_string(), json!(error.description));
                if let Some(code) = &error.code {
                    entry.insert("code".to_string(), json!(code));
                }
                if let Some(uri) = &error.uri {
                    entry.insert("uri".to_string(), json!(uri));
                }
                Value::Object(entry)
            })
            .collect();
        to_bytes(&json!({ ERRORS: entries }))
    }

    fn decode_document(&self, bytes: &[u8], resource_type: Option<&str>) -> ScimResult<ScimDocument> {
        let value: Value = serde_json::from_slice(bytes)
            .map_err(|e| ScimError::malformed(format!("invalid JSON: {}", e)))?;
        self.from_value(&value, resource_type)
    }
}

fn to_bytes(value: &Value) -> ScimResult<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| ScimError::internal(format!("JSON encoding failed: {}", e)))
}

fn attribute_json(attribute: &Attribute) -> Value {
    let descriptor = attribute.descriptor();
    match attribute.values() {
        AttributeValues::Singular(value) => value_json(descriptor, value),
        AttributeValues::Plural(values) => Value::Array(values.iter().map(|v| value_json(descriptor, v)).collect()),
    }
}

fn value_json(descriptor: &AttributeDescriptor, value: &AttributeValue) -> Value {
    match value {
        AttributeValue::Simple(simple) => simple_json(simple),
        AttributeValue::Complex(complex) => Value::Object(
            ordered_sub_attributes(descriptor, complex)
                .into_iter()
                .map(|sub| (sub.name().to_string(), attribute_json(sub)))
                .collect(),
        ),
    }
}

fn simple_json(value: &SimpleValue) -> Value {
    match value {
        SimpleValue::String(s) => Value::String(s.clone()),
        SimpleValue::Boolean(b) => Value::Bool(*b),
        SimpleValue::Integer(i) => json!(i),
        SimpleValue::DateTime(_) | SimpleValue::Binary(_) => Value::String(value.to_text()),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn decode_resource(
    resolver: Resolver<'_>,
    object: &Map<String, Value>,
    resource_type: &str,
) -> ScimResult<ScimResource> {
    let descriptor = resolver.resource(resource_type)?;
    let primary = descriptor.schema();
    let mut builder = ScimResource::builder(&descriptor);

    for (key, value) in object {
        if key == SCHEMAS || key == RESOURCE_TYPE {
            continue;
        }
        if key.contains(':') {
            let members = value.as_object().ok_or_else(|| {
                ScimError::malformed(format!("schema member '{}' must be an object, found {}", key, kind(value)))
            })?;
            if !resolver.registry.is_known_schema(key) {
                debug!("Document references unregistered schema '{}'", key);
            }
            for (name, value) in members {
                if let Some(attribute) = decode_attribute(resolver, key, name, value)? {
                    builder.add_attribute(attribute)?;
                }
            }
            continue;
        }
        if let Some(attribute) = decode_attribute(resolver, primary, key, value)? {
            builder.add_attribute(attribute)?;
        }
    }
    Ok(builder.build())
}

fn decode_attribute(
    resolver: Resolver<'_>,
    schema: &str,
    name: &str,
    value: &Value,
) -> ScimResult<Option<Attribute>> {
    let Some(descriptor) = resolver.attribute(schema, name)? else {
        return Ok(None);
    };
    let values = json_values(resolver, &descriptor, value)?;
    assemble(descriptor, values)
}

fn json_values(
    resolver: Resolver<'_>,
    descriptor: &AttributeDescriptor,
    value: &Value,
) -> ScimResult<Vec<AttributeValue>> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) if descriptor.is_plural() => {
            let mut values = Vec::with_capacity(items.len());
            for item in items {
                if let Some(value) = json_value(resolver, descriptor, item)? {
                    values.push(value);
                }
            }
            Ok(values)
        }
        Value::Array(_) => Err(ScimError::PluralityMismatch {
            attribute: descriptor.name().to_string(),
            expected: "singular",
        }),
        _ if descriptor.is_plural() => Err(ScimError::PluralityMismatch {
            attribute: descriptor.name().to_string(),
            expected: "plural",
        }),
        _ => Ok(json_value(resolver, descriptor, value)?.into_iter().collect()),
    }
}

fn json_value(
    resolver: Resolver<'_>,
    descriptor: &AttributeDescriptor,
    value: &Value,
) -> ScimResult<Option<AttributeValue>> {
    if value.is_null() {
        return Ok(None);
    }
    if !descriptor.is_complex() {
        return json_simple(descriptor, value).map(|simple| Some(AttributeValue::Simple(simple)));
    }

    let members = value
        .as_object()
        .ok_or_else(|| ScimError::type_mismatch(descriptor.name(), "complex", kind(value)))?;
    let mut attributes = Vec::with_capacity(members.len());
    for (name, value) in members {
        let Some(sub) = resolver.sub_attribute(descriptor, name)? else {
            continue;
        };
        let values = json_values(resolver, &sub, value)?;
        if let Some(attribute) = assemble(sub, values)? {
            attributes.push(attribute);
        }
    }
    let complex = ComplexValue::new(attributes)?;
    Ok((!complex.is_empty()).then_some(AttributeValue::Complex(complex)))
}

fn json_simple(descriptor: &AttributeDescriptor, value: &Value) -> ScimResult<SimpleValue> {
    let data_type = descriptor.data_type();
    let mismatch = || ScimError::type_mismatch(descriptor.name(), data_type.as_str(), kind(value));
    match (data_type, value) {
        (DataType::String, Value::String(s)) => Ok(SimpleValue::String(s.clone())),
        (DataType::Boolean, Value::Bool(b)) => Ok(SimpleValue::Boolean(*b)),
        (DataType::Integer, Value::Number(n)) => n.as_i64().map(SimpleValue::Integer).ok_or_else(mismatch),
        (DataType::DateTime | DataType::Binary, Value::String(s)) => {
            SimpleValue::from_text(descriptor.name(), data_type, s)
        }
        _ => Err(mismatch()),
    }
}

fn decode_list(
    resolver: Resolver<'_>,
    object: &Map<String, Value>,
    resource_type: Option<&str>,
) -> ScimResult<ListResponse> {
    let mut resources = Vec::new();
    if let Some(items) = object.get(RESOURCES) {
        let items = items
            .as_array()
            .ok_or_else(|| ScimError::malformed(format!("'{}' must be an array", RESOURCES)))?;
        for item in items {
            let element = item
                .as_object()
                .ok_or_else(|| ScimError::malformed(format!("list element is {}, not an object", kind(item))))?;
            let element_type = element
                .get(RESOURCE_TYPE)
                .and_then(Value::as_str)
                .or(resource_type)
                .ok_or_else(|| ScimError::malformed("list element carries no resource type"))?;
            resources.push(decode_resource(resolver, element, element_type)?);
        }
    }

    let counter = |name: &str| -> ScimResult<Option<u64>> {
        match object.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => value
                .as_u64()
                .map(Some)
                .ok_or_else(|| ScimError::malformed(format!("'{}' must be a non-negative integer", name))),
        }
    };
    Ok(ListResponse {
        total_results: counter(TOTAL_RESULTS)?.unwrap_or(resources.len() as u64),
        start_index: counter(START_INDEX)?,
        items_per_page: counter(ITEMS_PER_PAGE)?,
        resources,
    })
}

fn decode_errors(value: &Value) -> ScimResult<Vec<ErrorEntry>> {
    let items = value
        .as_array()
        .ok_or_else(|| ScimError::malformed(format!("'{}' must be an array", ERRORS)))?;
    items
        .iter()
        .map(|item| -> ScimResult<ErrorEntry> {
            let text = |name: &str| match item.get(name) {
                Some(Value::String(s)) => Some(s.clone()),
                Some(Value::Number(n)) => Some(n.to_string()),
                _ => None,
            };
            Ok(ErrorEntry {
                description: text("description")
                    .ok_or_else(|| ScimError::malformed("error entry without a description"))?,
                code: text("code"),
                uri: text("uri"),
            })
        })
        .collect()
}
