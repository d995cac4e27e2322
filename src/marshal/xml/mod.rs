//! Tag/namespace (XML) codec.
//!
//! A resource is an element named after its resource type. The primary schema
//! is the default namespace; each extension schema gets a prefix `ns1`, `ns2`,
//! ... in the order it is first met during that encode call. A plural
//! attribute wraps one child per value named by the descriptor's plural
//! element (`<emails><email>...</email></emails>`). Collections and errors are
//! wrapped in `<Response>`; elements of a heterogeneous collection carry an
//! `xsi:type` naming their resource type.

mod dom;
mod namespaces;

use self::dom::Element;
use self::namespaces::Namespaces;
use super::document::{ErrorEntry, ListResponse, ScimDocument};
use super::media::MediaType;
use super::plan::{EmissionPlan, Resolver, assemble, ordered_sub_attributes};
use super::Codec;
use crate::error::{ScimError, ScimResult};
use crate::resource::{Attribute, AttributeValue, AttributeValues, ComplexValue, ScimResource, SimpleValue};
use crate::schema::{AttributeDescriptor, CORE_SCHEMA, SchemaRegistry};

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use std::sync::Arc;

const XSI: &str = "http://www.w3.org/2001/XMLSchema-instance";
const RESPONSE: &str = "Response";
const RESOURCES: &str = "Resources";
const RESOURCE: &str = "Resource";
const ERRORS: &str = "Errors";
const ERROR: &str = "Error";

/// XML codec bound to a schema registry.
#[derive(Debug, Clone)]
pub struct XmlCodec {
    registry: Arc<SchemaRegistry>,
    strict: bool,
}

impl XmlCodec {
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
}

/// Thin wrapper mapping writer failures into [`ScimError`].
struct XmlWriter {
    inner: Writer<Vec<u8>>,
}

impl XmlWriter {
    fn new() -> ScimResult<Self> {
        let mut writer = Self {
            inner: Writer::new(Vec::new()),
        };
        writer.event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        Ok(writer)
    }

    fn event(&mut self, event: Event<'_>) -> ScimResult<()> {
        self.inner
            .write_event(event)
            .map_err(|e| ScimError::internal(format!("XML encoding failed: {}", e)))
    }

    fn start(&mut self, start: BytesStart<'_>) -> ScimResult<()> {
        self.event(Event::Start(start))
    }

    fn open(&mut self, name: &str) -> ScimResult<()> {
        self.start(BytesStart::new(name))
    }

    fn close(&mut self, name: &str) -> ScimResult<()> {
        self.event(Event::End(BytesEnd::new(name)))
    }

    fn leaf(&mut self, name: &str, text: &str) -> ScimResult<()> {
        self.open(name)?;
        self.event(Event::Text(BytesText::new(text)))?;
        self.close(name)
    }

    fn finish(self) -> Vec<u8> {
        self.inner.into_inner()
    }
}

fn write_attribute(writer: &mut XmlWriter, namespaces: &Namespaces, attribute: &Attribute) -> ScimResult<()> {
    let descriptor = attribute.descriptor();
    let element = namespaces.qualify(attribute.schema(), attribute.name());
    match attribute.values() {
        AttributeValues::Singular(value) => write_value(writer, namespaces, &element, descriptor, value),
        AttributeValues::Plural(values) => {
            let item = namespaces.qualify(attribute.schema(), descriptor.plural_element());
            writer.open(&element)?;
            for value in values {
                write_value(writer, namespaces, &item, descriptor, value)?;
            }
            writer.close(&element)
        }
    }
}

fn write_value(
    writer: &mut XmlWriter,
    namespaces: &Namespaces,
    element: &str,
    descriptor: &AttributeDescriptor,
    value: &AttributeValue,
) -> ScimResult<()> {
    match value {
        AttributeValue::Simple(simple) => writer.leaf(element, &simple.to_text()),
        AttributeValue::Complex(complex) => {
            writer.open(element)?;
            for sub in ordered_sub_attributes(descriptor, complex) {
                write_attribute(writer, namespaces, sub)?;
            }
            writer.close(element)
        }
    }
}

fn write_resource_body(writer: &mut XmlWriter, namespaces: &Namespaces, plan: &EmissionPlan<'_>) -> ScimResult<()> {
    for attribute in &plan.primary {
        write_attribute(writer, namespaces, attribute)?;
    }
    for (_, attributes) in &plan.extensions {
        for attribute in attributes.iter() {
            write_attribute(writer, namespaces, attribute)?;
        }
    }
    Ok(())
}

impl Codec for XmlCodec {
    fn media_type(&self) -> MediaType {
        MediaType::Xml
    }

    fn encode(&self, resource: &ScimResource) -> ScimResult<Vec<u8>> {
        let plan = EmissionPlan::new(&self.registry, resource);
        let mut namespaces = Namespaces::new(plan.primary_schema);
        for (schema, _) in &plan.extensions {
            namespaces.assign(schema);
        }

        let mut writer = XmlWriter::new()?;
        let mut root = BytesStart::new(resource.resource_type());
        namespaces.declare(&mut root);
        writer.start(root)?;
        write_resource_body(&mut writer, &namespaces, &plan)?;
        writer.close(resource.resource_type())?;
        Ok(writer.finish())
    }

    fn encode_list(&self, list: &ListResponse) -> ScimResult<Vec<u8>> {
        let heterogeneous = list.is_heterogeneous();
        let plans: Vec<EmissionPlan<'_>> = list
            .resources
            .iter()
            .map(|r| EmissionPlan::new(&self.registry, r))
            .collect();
        let mut namespaces = Namespaces::new(CORE_SCHEMA);
        for plan in &plans {
            namespaces.assign(plan.primary_schema);
            for (schema, _) in &plan.extensions {
                namespaces.assign(schema);
            }
        }

        let mut writer = XmlWriter::new()?;
        let mut root = BytesStart::new(RESPONSE);
        namespaces.declare(&mut root);
        if heterogeneous {
            root.push_attribute(("xmlns:xsi", XSI));
        }
        writer.start(root)?;
        writer.leaf("totalResults", &list.total_results.to_string())?;
        if let Some(items_per_page) = list.items_per_page {
            writer.leaf("itemsPerPage", &items_per_page.to_string())?;
        }
        if let Some(start_index) = list.start_index {
            writer.leaf("startIndex", &start_index.to_string())?;
        }
        writer.open(RESOURCES)?;
        for (resource, plan) in list.resources.iter().zip(&plans) {
            let mut element = BytesStart::new(RESOURCE);
            if heterogeneous {
                element.push_attribute(("xsi:type", resource.resource_type()));
            }
            writer.start(element)?;
            write_resource_body(&mut writer, &namespaces, plan)?;
            writer.close(RESOURCE)?;
        }
        writer.close(RESOURCES)?;
        writer.close(RESPONSE)?;
        Ok(writer.finish())
    }

    fn encode_errors(&self, errors: &[ErrorEntry]) -> ScimResult<Vec<u8>> {
        let mut writer = XmlWriter::new()?;
        let mut root = BytesStart::new(RESPONSE);
        Namespaces::new(CORE_SCHEMA).declare(&mut root);
        writer.start(root)?;
        writer.open(ERRORS)?;
        for error in errors {
            writer.open(ERROR)?;
            writer.leaf("description", &error.description)?;
            if let Some(code) = &error.code {
                writer.leaf("code", code)?;
            }
            if let Some(uri) = &error.uri {
                writer.leaf("uri", uri)?;
            }
            writer.close(ERROR)?;
        }
        writer.close(ERRORS)?;
        writer.close(RESPONSE)?;
        Ok(writer.finish())
    }

    fn decode_document(&self, bytes: &[u8], resource_type: Option<&str>) -> ScimResult<ScimDocument> {
        let root = dom::parse(bytes)?;
        let resolver = Resolver::new(&self.registry, self.strict);

        if root.name == RESPONSE {
            if let Some(errors) = root.child(ERRORS) {
                return decode_errors(errors).map(ScimDocument::Errors);
            }
            return decode_list(resolver, &root, resource_type).map(ScimDocument::List);
        }
        let resource_type = resource_type.unwrap_or(root.name.as_str());
        decode_resource(resolver, &root, resource_type).map(ScimDocument::Resource)
    }
}

fn decode_resource(resolver: Resolver<'_>, element: &Element, resource_type: &str) -> ScimResult<ScimResource> {
    let descriptor = resolver.resource(resource_type)?;
    let primary = descriptor.schema();
    let mut builder = ScimResource::builder(&descriptor);
    for child in &element.children {
        let schema = child.namespace.as_deref().unwrap_or(primary);
        if let Some(attribute) = decode_attribute(resolver, schema, child)? {
            builder.add_attribute(attribute)?;
        }
    }
    Ok(builder.build())
}

fn decode_attribute(resolver: Resolver<'_>, schema: &str, element: &Element) -> ScimResult<Option<Attribute>> {
    let Some(descriptor) = resolver.attribute(schema, &element.name)? else {
        return Ok(None);
    };
    let values = element_values(resolver, &descriptor, element)?;
    assemble(descriptor, values)
}

/// Values of an attribute element: one per child for a plural attribute, the
/// element itself otherwise.
fn element_values(
    resolver: Resolver<'_>,
    descriptor: &AttributeDescriptor,
    element: &Element,
) -> ScimResult<Vec<AttributeValue>> {
    if !descriptor.is_plural() {
        return Ok(element_value(resolver, descriptor, element)?.into_iter().collect());
    }
    if element.children.is_empty() && element.has_text() {
        return Err(ScimError::PluralityMismatch {
            attribute: descriptor.name().to_string(),
            expected: "plural",
        });
    }
    let mut values = Vec::with_capacity(element.children.len());
    for child in &element.children {
        if let Some(value) = element_value(resolver, descriptor, child)? {
            values.push(value);
        }
    }
    Ok(values)
}

fn element_value(
    resolver: Resolver<'_>,
    descriptor: &AttributeDescriptor,
    element: &Element,
) -> ScimResult<Option<AttributeValue>> {
    if !descriptor.is_complex() {
        if !element.children.is_empty() {
            return Err(ScimError::type_mismatch(
                descriptor.name(),
                descriptor.data_type().as_str(),
                "element",
            ));
        }
        let simple = SimpleValue::from_text(descriptor.name(), descriptor.data_type(), &element.text)?;
        return Ok(Some(AttributeValue::Simple(simple)));
    }

    if element.children.is_empty() && element.has_text() {
        return Err(ScimError::type_mismatch(descriptor.name(), "complex", "text"));
    }
    let mut attributes = Vec::with_capacity(element.children.len());
    for child in &element.children {
        let Some(sub) = resolver.sub_attribute(descriptor, &child.name)? else {
            continue;
        };
        let values = element_values(resolver, &sub, child)?;
        if let Some(attribute) = assemble(sub, values)? {
            attributes.push(attribute);
        }
    }
    let complex = ComplexValue::new(attributes)?;
    Ok((!complex.is_empty()).then_some(AttributeValue::Complex(complex)))
}

fn counter(element: &Element, name: &str) -> ScimResult<Option<u64>> {
    element
        .child(name)
        .map(|c| {
            c.text
                .trim()
                .parse::<u64>()
                .map_err(|_| ScimError::malformed(format!("'{}' must be a non-negative integer", name)))
        })
        .transpose()
}

fn decode_list(resolver: Resolver<'_>, root: &Element, resource_type: Option<&str>) -> ScimResult<ListResponse> {
    let mut resources = Vec::new();
    if let Some(items) = root.child(RESOURCES) {
        for item in &items.children {
            let declared = item
                .attribute(XSI, "type")
                .map(|t| t.rsplit(':').next().unwrap_or(t));
            let element_type = declared
                .or(resource_type)
                .ok_or_else(|| ScimError::malformed("list element carries no resource type"))?;
            resources.push(decode_resource(resolver, item, element_type)?);
        }
    }
    Ok(ListResponse {
        total_results: counter(root, "totalResults")?.unwrap_or(resources.len() as u64),
        start_index: counter(root, "startIndex")?,
        items_per_page: counter(root, "itemsPerPage")?,
        resources,
    })
}

fn decode_errors(errors: &Element) -> ScimResult<Vec<ErrorEntry>> {
    errors
        .children
        .iter()
        .map(|error| -> ScimResult<ErrorEntry> {
            let text = |name: &str| error.child(name).map(|c| c.text.clone());
            Ok(ErrorEntry {
                description: text("description")
                    .ok_or_else(|| ScimError::malformed("error entry without a description"))?,
                code: text("code"),
                uri: text("uri"),
            })
        })
        .collect()
}
