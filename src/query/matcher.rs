//! In-process evaluation of filters and sort keys against resources.
//!
//! Adapters whose backend cannot filter natively can fetch candidates and
//! narrow them here. A comparison on a plural attribute matches when any value
//! matches; a path naming a complex attribute without a sub-attribute compares
//! its `value` sub-attribute.

use super::filter::{CompareOp, Filter, FilterValue};
use super::path::AttributePath;
use super::sort::{SortOrder, SortSpec};
use crate::resource::{ScimResource, SimpleValue};

use chrono::{DateTime, Utc};
use std::cmp::Ordering;

/// A simple value reached through a path, with the case sensitivity declared
/// by its descriptor.
struct Operand<'a> {
    value: &'a SimpleValue,
    case_exact: bool,
}

fn operands<'a>(resource: &'a ScimResource, path: &AttributePath) -> Vec<Operand<'a>> {
    let Some(attribute) = resource.attribute_at(path) else {
        return Vec::new();
    };
    let descriptor = attribute.descriptor();
    let sub = match path.sub_attribute() {
        Some(sub) => Some(sub),
        None if descriptor.is_complex() => Some("value"),
        None => None,
    };

    let mut found = Vec::new();
    for value in attribute.all_values() {
        match (sub, value.as_complex(), value.as_simple()) {
            (Some(sub), Some(complex), _) => {
                if let Some(sub_attribute) = complex.sub_attribute(sub) {
                    let case_exact = sub_attribute.descriptor().is_case_exact();
                    for sub_value in sub_attribute.all_values() {
                        if let Some(simple) = sub_value.as_simple() {
                            found.push(Operand {
                                value: simple,
                                case_exact,
                            });
                        }
                    }
                }
            }
            (None, _, Some(simple)) => found.push(Operand {
                value: simple,
                case_exact: descriptor.is_case_exact(),
            }),
            _ => {}
        }
    }
    found
}

/// True when `resource` satisfies `filter`.
pub fn matches(filter: &Filter, resource: &ScimResource) -> bool {
    match filter {
        Filter::And(parts) => parts.iter().all(|part| matches(part, resource)),
        Filter::Or(parts) => parts.iter().any(|part| matches(part, resource)),
        Filter::Not(inner) => !matches(inner, resource),
        Filter::Present(path) => !operands(resource, path).is_empty(),
        Filter::Compare {
            path,
            op: CompareOp::Ne,
            value,
        } => !compare_any(resource, path, CompareOp::Eq, value),
        Filter::Compare { path, op, value } => compare_any(resource, path, *op, value),
    }
}

fn compare_any(resource: &ScimResource, path: &AttributePath, op: CompareOp, expected: &FilterValue) -> bool {
    let operands = operands(resource, path);
    if matches!(expected, FilterValue::Null) {
        return op == CompareOp::Eq && operands.is_empty();
    }
    operands.iter().any(|operand| compare(operand, op, expected))
}

fn fold(text: &str, case_exact: bool) -> String {
    if case_exact { text.to_string() } else { text.to_lowercase() }
}

fn compare(operand: &Operand<'_>, op: CompareOp, expected: &FilterValue) -> bool {
    let ordering = match (operand.value, expected) {
        (SimpleValue::Boolean(actual), FilterValue::Boolean(wanted)) => {
            return op == CompareOp::Eq && actual == wanted;
        }
        (SimpleValue::Integer(actual), FilterValue::Number(wanted)) => match wanted.as_i64() {
            Some(wanted) => actual.cmp(&wanted),
            None => match wanted.as_f64() {
                Some(wanted) => match (*actual as f64).partial_cmp(&wanted) {
                    Some(ordering) => ordering,
                    None => return false,
                },
                None => return false,
            },
        },
        (SimpleValue::DateTime(actual), FilterValue::String(wanted)) => {
            match DateTime::parse_from_rfc3339(wanted) {
                Ok(wanted) => actual.cmp(&wanted.with_timezone(&Utc)),
                Err(_) => return false,
            }
        }
        (SimpleValue::String(actual), FilterValue::String(wanted)) => {
            let actual = fold(actual, operand.case_exact);
            let wanted = fold(wanted, operand.case_exact);
            match op {
                CompareOp::Co => return actual.contains(&wanted),
                CompareOp::Sw => return actual.starts_with(&wanted),
                CompareOp::Ew => return actual.ends_with(&wanted),
                _ => actual.cmp(&wanted),
            }
        }
        (SimpleValue::Binary(_), FilterValue::String(wanted)) => {
            return op == CompareOp::Eq && operand.value.to_text() == *wanted;
        }
        _ => return false,
    };

    match op {
        CompareOp::Eq => ordering == Ordering::Equal,
        CompareOp::Gt => ordering == Ordering::Greater,
        CompareOp::Ge => ordering != Ordering::Less,
        CompareOp::Lt => ordering == Ordering::Less,
        CompareOp::Le => ordering != Ordering::Greater,
        CompareOp::Ne | CompareOp::Co | CompareOp::Sw | CompareOp::Ew => false,
    }
}

fn sort_key<'a>(resource: &'a ScimResource, path: &AttributePath) -> Option<Operand<'a>> {
    operands(resource, path).into_iter().next()
}

fn compare_simple(a: &Operand<'_>, b: &Operand<'_>) -> Ordering {
    match (a.value, b.value) {
        (SimpleValue::String(x), SimpleValue::String(y)) => {
            let exact = a.case_exact && b.case_exact;
            fold(x, exact).cmp(&fold(y, exact))
        }
        (SimpleValue::Integer(x), SimpleValue::Integer(y)) => x.cmp(y),
        (SimpleValue::DateTime(x), SimpleValue::DateTime(y)) => x.cmp(y),
        (SimpleValue::Boolean(x), SimpleValue::Boolean(y)) => x.cmp(y),
        (x, y) => x.to_text().cmp(&y.to_text()),
    }
}

/// Order two resources by a sort key. Resources without a value for the key
/// sort last in either direction.
pub fn compare_resources(a: &ScimResource, b: &ScimResource, sort: &SortSpec) -> Ordering {
    match (sort_key(a, &sort.path), sort_key(b, &sort.path)) {
        (Some(x), Some(y)) => {
            let ordering = compare_simple(&x, &y);
            match sort.order {
                SortOrder::Ascending => ordering,
                SortOrder::Descending => ordering.reverse(),
            }
        }
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Stable in-place sort of resources by `sort`.
pub fn sort_resources(resources: &mut [ScimResource], sort: &SortSpec) {
    resources.sort_by(|a, b| compare_resources(a, b, sort));
}
