#![deny(missing_docs)]

//! # Naming Utilities
//!
//! Helper functions for deriving OpenAPI component names from shape ids and operation ids.

use crate::shape::NamedShape;
use heck::ToUpperCamelCase;
use std::collections::HashSet;

/// Preferred component name of a declared shape: the explicit `name`, otherwise the last
/// segment of its `id` (`users::User` -> `User`, `models/user.ts#User` -> `User`).
pub fn preferred_name(named: &NamedShape) -> String {
    let raw = match &named.name {
        Some(name) => name.as_str(),
        None => named
            .id
            .rsplit(|c| matches!(c, ':' | '/' | '#'))
            .find(|segment| !segment.is_empty())
            .unwrap_or(named.id.as_str()),
    };
    sanitize_component_name(raw)
}

/// Replaces every character outside `[A-Za-z0-9._-]` with `_`.
pub fn sanitize_component_name(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "Schema".to_string()
    } else {
        cleaned
    }
}

/// Name for an anonymous route shape promoted to a component.
///
/// e.g. `listItems` + `Output` -> `ListItemsOutput`
pub fn generated_name(operation_id: &str, suffix: &str) -> String {
    sanitize_component_name(&format!("{}{}", operation_id.to_upper_camel_case(), suffix))
}

/// Hands out unique component names. On a clash the base name gets a numeric suffix,
/// starting at `2`, in first-seen order.
#[derive(Debug, Default)]
pub struct NameAllocator {
    taken: HashSet<String>,
}

impl NameAllocator {
    /// Creates an empty allocator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserves and returns a unique name derived from `base`.
    pub fn allocate(&mut self, base: &str) -> String {
        if self.taken.insert(base.to_string()) {
            return base.to_string();
        }
        let mut n = 2usize;
        loop {
            let candidate = format!("{}{}", base, n);
            if self.taken.insert(candidate.clone()) {
                return candidate;
            }
            n += 1;
        }
    }
}
