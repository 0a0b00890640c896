#![deny(missing_docs)]

//! # Schema Reducer
//!
//! Flattens every shape the router shares into one dictionary of named definitions so
//! that recurring shapes are emitted once under `components.schemas` and referenced by
//! pointer elsewhere.
//!
//! - Declared shapes ([`NamedShape`]) are keyed by their stable `id`. Identical content
//!   declared under the same preferred name collapses into one component; different
//!   content competing for a name gets a numeric suffix in first-seen order.
//! - Anonymous route-level shapes, and their nested sub-shapes, are keyed by content
//!   fingerprint. One that appears in two or more routes is promoted to a component and
//!   referenced wherever it occurs; the rest stay inline.

use crate::error::{AppError, AppResult};
use crate::naming::{generated_name, preferred_name, NameAllocator};
use crate::paths::sends_whole_input;
use crate::router::{Route, Router};
use crate::schema::{component_schema, with_description, RefStrategy};
use crate::shape::{NamedShape, ObjectShape, Shape};
use heck::ToUpperCamelCase;
use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Maximum `ref -> ref` hops followed when resolving a shape.
const MAX_REF_DEPTH: usize = 64;

/// The reduced definitions dictionary plus the lookups needed to rewrite references.
#[derive(Debug, Clone)]
pub struct Definitions {
    strategy: RefStrategy,
    /// Shape id -> canonical component name.
    names: IndexMap<String, String>,
    /// Shape id -> first declaration.
    shapes: IndexMap<String, NamedShape>,
    /// Fingerprint of a promoted route-level shape -> canonical component name.
    shared: HashMap<String, String>,
    /// Canonical component name -> JSON Schema.
    schemas: Map<String, Value>,
}

impl Definitions {
    fn empty(strategy: RefStrategy) -> Self {
        Self {
            strategy,
            names: IndexMap::new(),
            shapes: IndexMap::new(),
            shared: HashMap::new(),
            schemas: Map::new(),
        }
    }

    /// The reference style in effect.
    pub fn strategy(&self) -> RefStrategy {
        self.strategy
    }

    /// Canonical component name for a declared shape id.
    pub fn canonical_name(&self, id: &str) -> Option<&str> {
        self.names.get(id).map(String::as_str)
    }

    /// The declaration behind a shape id.
    pub fn resolve(&self, id: &str) -> Option<&NamedShape> {
        self.shapes.get(id)
    }

    /// Component name of a promoted route-level shape.
    pub fn shared_name(&self, shape: &Shape) -> Option<&str> {
        if self.shared.is_empty() || !is_promotable(shape) {
            return None;
        }
        self.shared.get(&shape.fingerprint()).map(String::as_str)
    }

    /// The flattened `components.schemas` dictionary.
    pub fn schemas(&self) -> &Map<String, Value> {
        &self.schemas
    }

    /// Consumes the definitions, returning `components.schemas`.
    pub fn into_schemas(self) -> Map<String, Value> {
        self.schemas
    }

    /// Follows `ref` shapes until a concrete shape is reached.
    pub fn resolve_shape<'a>(&'a self, shape: &'a Shape, context: &str) -> AppResult<&'a Shape> {
        let mut current = shape;
        for _ in 0..MAX_REF_DEPTH {
            let Shape::Ref { id } = current else {
                return Ok(current);
            };
            current = &self
                .resolve(id)
                .ok_or_else(|| {
                    AppError::config(context, format!("unresolvable schema reference `{}`", id))
                })?
                .shape;
        }
        Err(AppError::config(
            context,
            "reference chain too deep or cyclic".to_string(),
        ))
    }

    /// Resolves `shape` to an object shape, if it is one.
    pub fn resolve_object<'a>(
        &'a self,
        shape: &'a Shape,
        context: &str,
    ) -> AppResult<Option<&'a ObjectShape>> {
        Ok(self.resolve_shape(shape, context)?.as_object())
    }
}

/// Builds the definitions dictionary.
///
/// `external` definitions (pre-collected by the caller) are registered before the
/// router's own shapes. All declared shapes are registered, used or not.
pub fn reduce(
    external: &[NamedShape],
    router: &Router,
    strategy: RefStrategy,
) -> AppResult<Definitions> {
    let mut defs = Definitions::empty(strategy);
    let mut allocator = NameAllocator::new();
    let mut by_content: HashMap<(String, String, Option<String>), String> = HashMap::new();

    for named in external.iter().chain(router.shapes.iter()) {
        if let Some(existing) = defs.shapes.get(&named.id) {
            if existing == named {
                continue;
            }
            return Err(AppError::config(
                named.id.clone(),
                format!("shape id `{}` is declared twice with different content", named.id),
            ));
        }
        let preferred = preferred_name(named);
        let key = (
            preferred.clone(),
            named.shape.fingerprint(),
            named.description.clone(),
        );
        let canonical = by_content
            .entry(key)
            .or_insert_with(|| allocator.allocate(&preferred))
            .clone();
        defs.names.insert(named.id.clone(), canonical);
        defs.shapes.insert(named.id.clone(), named.clone());
    }

    if strategy == RefStrategy::None {
        debug!(
            declared = defs.shapes.len(),
            "inline strategy: no component schemas emitted"
        );
        return Ok(defs);
    }

    let promoted = promote_shared_route_shapes(&router.routes, &mut allocator);
    for (fingerprint, (name, _, _)) in &promoted {
        defs.shared.insert(fingerprint.clone(), name.clone());
    }

    let mut schemas = Map::new();
    let mut rendered = HashSet::new();
    for (id, canonical) in &defs.names {
        if !rendered.insert(canonical.clone()) {
            continue;
        }
        let named = &defs.shapes[id];
        let mut schema = component_schema(&named.shape, &defs, id)?;
        if let Some(desc) = &named.description {
            schema = with_description(schema, desc);
        }
        schemas.insert(canonical.clone(), schema);
    }
    for (name, shape, context) in promoted.values() {
        schemas.insert(name.clone(), component_schema(shape, &defs, context)?);
    }

    debug!(
        declared = defs.shapes.len(),
        shared = defs.shared.len(),
        components = schemas.len(),
        "reduced shape definitions"
    );
    defs.schemas = schemas;
    Ok(defs)
}

struct Usage<'a> {
    shape: &'a Shape,
    first_route: &'a str,
    suffix: String,
    routes: HashSet<usize>,
}

/// Anonymous route shapes (at any depth) used by two or more routes, keyed by
/// fingerprint, in first-seen order: `(component name, shape, first operationId)`.
///
/// An input only counts as a whole when the route sends it as its request body;
/// otherwise it is split into parameters and only its fields are considered.
fn promote_shared_route_shapes(
    routes: &[Route],
    allocator: &mut NameAllocator,
) -> IndexMap<String, (String, Shape, String)> {
    let mut usage: IndexMap<String, Usage<'_>> = IndexMap::new();
    for (idx, route) in routes.iter().enumerate() {
        if let Some(input) = &route.input {
            if sends_whole_input(route, input.as_object()) {
                record_usage(input, "Input".to_string(), idx, route, &mut usage);
            } else if let Some(obj) = input.as_object() {
                record_fields(obj, "Input", idx, route, &mut usage);
            }
        }
        record_usage(&route.output, "Output".to_string(), idx, route, &mut usage);
    }

    usage
        .into_iter()
        .filter(|(_, u)| u.routes.len() > 1)
        .map(|(fingerprint, u)| {
            let name = allocator.allocate(&generated_name(u.first_route, &u.suffix));
            (
                fingerprint,
                (name, u.shape.clone(), u.first_route.to_string()),
            )
        })
        .collect()
}

fn record_usage<'a>(
    shape: &'a Shape,
    suffix: String,
    idx: usize,
    route: &'a Route,
    usage: &mut IndexMap<String, Usage<'a>>,
) {
    if is_promotable(shape) {
        usage
            .entry(shape.fingerprint())
            .or_insert_with(|| Usage {
                shape,
                first_route: &route.operation_id,
                suffix: suffix.clone(),
                routes: HashSet::new(),
            })
            .routes
            .insert(idx);
    }
    match shape {
        Shape::Array { items } => record_usage(items, format!("{}Item", suffix), idx, route, usage),
        Shape::Record { values } => {
            record_usage(values, format!("{}Value", suffix), idx, route, usage)
        }
        Shape::Nullable { inner } => record_usage(inner, suffix, idx, route, usage),
        Shape::Union { variants } => {
            for (n, variant) in variants.iter().enumerate() {
                record_usage(variant, format!("{}Variant{}", suffix, n + 1), idx, route, usage);
            }
        }
        Shape::Object(obj) => record_fields(obj, &suffix, idx, route, usage),
        _ => {}
    }
}

fn record_fields<'a>(
    obj: &'a ObjectShape,
    suffix: &str,
    idx: usize,
    route: &'a Route,
    usage: &mut IndexMap<String, Usage<'a>>,
) {
    for (name, field) in &obj.fields {
        let field_suffix = format!("{}{}", suffix, name.to_upper_camel_case());
        record_usage(&field.shape, field_suffix, idx, route, usage);
    }
}

/// Only shapes with an object somewhere inside are worth a component; lists of scalars
/// and bare references stay inline.
fn is_promotable(shape: &Shape) -> bool {
    match shape {
        Shape::Object(_) => true,
        Shape::Array { items } => is_promotable(items),
        Shape::Record { values } => is_promotable(values),
        Shape::Nullable { inner } => is_promotable(inner),
        Shape::Union { variants } => variants.iter().any(is_promotable),
        _ => false,
    }
}
