//! # SCIM Schema Validator
//!
//! A command-line utility that loads schema definition files into a fresh
//! schema registry and reports what they declare, or the first error.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --bin schema-validator schemas/badges.json
//! cargo run --bin schema-validator ./schemas/
//! cargo run --bin schema-validator --with-core ./extensions/
//! ```
//!
//! With `--with-core` the embedded SCIM 1.0 core and enterprise schemas are
//! loaded first, so extension files may reuse their attributes.
//!
//! ## Output Example
//!
//! ```text
//! Validating schema file: schemas/badges.json
//! ✓ Schemas are valid!
//!
//! Resource types: 1
//!   - Badge at /Badges (urn:example:badges:1.0)
//!     Attributes: 4 (required: 1, plural: 1, complex: 1)
//!     Attribute types:
//!       - string: 2
//!       - complex: 1
//!       - dateTime: 1
//! ```
//!
//! The exit code is 1 when loading fails.

use scim_sdk::schema::{ResourceDescriptor, SchemaRegistry};
use std::collections::BTreeMap;
use std::env;
use std::path::Path;
use std::process;

fn main() {
    let args: Vec<String> = env::args().collect();
    let with_core = args.iter().any(|a| a == "--with-core");
    let target = args.iter().skip(1).find(|a| !a.starts_with("--"));

    let Some(target) = target else {
        eprintln!("Usage: {} [--with-core] <schema-file-or-directory>", args[0]);
        eprintln!();
        eprintln!("Examples:");
        eprintln!("  {} schemas/badges.json", args[0]);
        eprintln!("  {} --with-core ./extensions/", args[0]);
        process::exit(1);
    };

    let registry = if with_core {
        match SchemaRegistry::with_core_schemas() {
            Ok(registry) => registry,
            Err(e) => {
                eprintln!("❌ Failed to load the embedded core schemas: {}", e);
                process::exit(1);
            }
        }
    } else {
        SchemaRegistry::new()
    };
    let builtin = registry.resource_descriptors().len();

    let path = Path::new(target);
    let result = if path.is_file() {
        println!("Validating schema file: {}", path.display());
        registry.load_file(path).map(|()| 1)
    } else if path.is_dir() {
        println!("Validating schemas in directory: {}", path.display());
        registry.load_dir(path)
    } else {
        eprintln!("Error: '{}' is not a valid file or directory", path.display());
        process::exit(1);
    };

    match result {
        Ok(files) => {
            println!("✓ Schemas are valid! ({} file(s) loaded)", files);
            let loaded: Vec<_> = registry.resource_descriptors().into_iter().skip(builtin).collect();
            print_summary(&loaded);
        }
        Err(e) => {
            eprintln!("❌ Schema validation failed: {}", e);
            process::exit(1);
        }
    }
}

fn print_summary(resources: &[std::sync::Arc<ResourceDescriptor>]) {
    println!();
    println!("Resource types: {}", resources.len());
    for resource in resources {
        println!(
            "  - {} at /{} ({})",
            resource.name(),
            resource.endpoint(),
            resource.schema()
        );
        if !resource.description().is_empty() {
            println!("    Description: {}", resource.description());
        }

        let attributes = resource.attributes();
        let required = attributes.iter().filter(|a| a.is_required()).count();
        let plural = attributes.iter().filter(|a| a.is_plural()).count();
        let complex = attributes.iter().filter(|a| a.is_complex()).count();
        println!(
            "    Attributes: {} (required: {}, plural: {}, complex: {})",
            attributes.len(),
            required,
            plural,
            complex
        );

        let mut type_counts: BTreeMap<String, usize> = BTreeMap::new();
        for attribute in attributes {
            let kind = if attribute.is_complex() {
                "complex".to_string()
            } else {
                attribute.data_type().as_str().to_string()
            };
            *type_counts.entry(kind).or_insert(0) += 1;
        }
        println!("    Attribute types:");
        for (kind, count) in type_counts {
            println!("      - {}: {}", kind, count);
        }

        let required_names: Vec<&str> = attributes
            .iter()
            .filter(|a| a.is_required())
            .map(|a| a.name())
            .collect();
        if !required_names.is_empty() {
            println!("    Required attribute names: {}", required_names.join(", "));
        }
    }
}
