#![deny(missing_docs)]

//! # Document Validation
//!
//! Structural checks run on every composed document before it is returned:
//! - Every local `$ref` resolves to an existing node.
//! - Component keys match `^[a-zA-Z0-9._-]+$`.
//! - operationIds are unique across all operations.

use crate::error::{AppError, AppResult, DOCUMENT_CONTEXT};
use percent_encoding::percent_decode_str;
use regex::Regex;
use serde_json::Value;
use std::collections::HashSet;

const COMPONENT_KEY_PATTERN: &str = r"^[a-zA-Z0-9._-]+$";
const COMPONENT_SECTIONS: [&str; 3] = ["schemas", "responses", "securitySchemes"];

/// Validates a composed OpenAPI document.
pub fn validate_document(doc: &Value) -> AppResult<()> {
    validate_component_keys(doc)?;
    validate_operation_ids(doc)?;
    let mut refs = Vec::new();
    collect_refs(doc, "#", &mut refs);
    for (location, reference) in refs {
        resolve_local_ref(doc, &reference).ok_or_else(|| {
            AppError::config(
                DOCUMENT_CONTEXT,
                format!("unresolved reference `{}` at {}", reference, location),
            )
        })?;
    }
    Ok(())
}

/// Resolves a local `#/...` reference against `doc`.
pub fn resolve_local_ref<'a>(doc: &'a Value, reference: &str) -> Option<&'a Value> {
    let fragment = reference.strip_prefix('#')?;
    let decoded = percent_decode_str(fragment).decode_utf8_lossy();
    doc.pointer(&decoded)
}

/// Escapes a single JSON Pointer segment (`~` -> `~0`, `/` -> `~1`).
pub fn encode_pointer_segment(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

fn collect_refs(value: &Value, location: &str, out: &mut Vec<(String, String)>) {
    match value {
        Value::Object(map) => {
            if let Some(Value::String(reference)) = map.get("$ref") {
                out.push((location.to_string(), reference.clone()));
            }
            for (key, child) in map {
                let child_location = format!("{}/{}", location, encode_pointer_segment(key));
                collect_refs(child, &child_location, out);
            }
        }
        Value::Array(items) => {
            for (idx, child) in items.iter().enumerate() {
                collect_refs(child, &format!("{}/{}", location, idx), out);
            }
        }
        _ => {}
    }
}

fn validate_component_keys(doc: &Value) -> AppResult<()> {
    let Some(components) = doc.get("components").and_then(Value::as_object) else {
        return Ok(());
    };
    let re = Regex::new(COMPONENT_KEY_PATTERN).expect("Invalid regex constant");
    for section in COMPONENT_SECTIONS {
        let Some(map) = components.get(section).and_then(Value::as_object) else {
            continue;
        };
        for key in map.keys() {
            if !re.is_match(key) {
                return Err(AppError::config(
                    DOCUMENT_CONTEXT,
                    format!(
                        "component key '{}' in '{}' must match {}",
                        key, section, COMPONENT_KEY_PATTERN
                    ),
                ));
            }
        }
    }
    Ok(())
}

fn validate_operation_ids(doc: &Value) -> AppResult<()> {
    let Some(paths) = doc.get("paths").and_then(Value::as_object) else {
        return Ok(());
    };
    let mut seen = HashSet::new();
    for item in paths.values().filter_map(Value::as_object) {
        for op in item.values() {
            let Some(op_id) = op.get("operationId").and_then(Value::as_str) else {
                continue;
            };
            if !seen.insert(op_id) {
                return Err(AppError::config(
                    op_id,
                    format!("duplicate operationId `{}`", op_id),
                ));
            }
        }
    }
    Ok(())
}
