#![deny(missing_docs)]

//! # Path Translation
//!
//! Turns each registered route into an OpenAPI Operation and groups the operations into
//! a `paths` object keyed by path template, in registration order.
//!
//! - `{param}` placeholders become required path parameters typed from the input field
//!   of the same name.
//! - For GET/DELETE the remaining input fields become query parameters.
//! - For POST/PUT/PATCH the remaining input fields form the JSON request body.
//! - Every operation has one `200` response and a `default` response pointing at the
//!   shared error response.

use crate::error::{AppError, AppResult};
use crate::reducer::Definitions;
use crate::router::{Route, Router};
use crate::schema::to_json_schema;
use crate::security::{build_security, SecuritySchemes};
use crate::shape::{Field, ObjectShape, Shape};
use indexmap::IndexMap;
use regex::Regex;
use serde_json::{json, Map, Value};
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// Media type of request and response bodies.
pub const JSON_MEDIA_TYPE: &str = "application/json";

/// Reference to the shared error response.
pub const ERROR_RESPONSE_REF: &str = "#/components/responses/error";

const PLACEHOLDER_PATTERN: &str = r"\{([^{}/]*)\}";

/// Builds the `paths` object for every route of `router`.
pub fn build_paths(
    router: &Router,
    defs: &Definitions,
    schemes: &SecuritySchemes,
) -> AppResult<Map<String, Value>> {
    let mut paths = Map::new();
    let mut operation_ids = HashSet::new();
    let mut templates: HashMap<String, String> = HashMap::new();

    for route in &router.routes {
        if route.operation_id.trim().is_empty() {
            return Err(AppError::config(
                format!("{} {}", route.method, route.path),
                "operationId must not be empty",
            ));
        }
        if !operation_ids.insert(route.operation_id.as_str()) {
            return Err(AppError::config(
                &route.operation_id,
                format!("duplicate operationId `{}`", route.operation_id),
            ));
        }

        let path = normalize_path(&route.path);
        let template = template_key(&path);
        match templates.get(&template) {
            Some(existing) if existing != &path => {
                return Err(AppError::config(
                    &route.operation_id,
                    format!(
                        "path `{}` conflicts with `{}` (same template, different parameter names)",
                        path, existing
                    ),
                ));
            }
            Some(_) => {}
            None => {
                templates.insert(template, path.clone());
            }
        }

        let op = build_operation(route, &path, defs, schemes)?;

        let entry = paths
            .entry(path.clone())
            .or_insert_with(|| Value::Object(Map::new()));
        let Value::Object(path_item) = entry else {
            return Err(AppError::General(format!(
                "path item for `{}` is not an object",
                path
            )));
        };
        let method_key = route.method.as_key();
        if path_item.contains_key(method_key) {
            return Err(AppError::config(
                &route.operation_id,
                format!("duplicate route {} {}", route.method, path),
            ));
        }
        path_item.insert(method_key.to_string(), op);
    }

    debug!(
        routes = router.routes.len(),
        paths = paths.len(),
        "translated routes into path items"
    );
    Ok(paths)
}

/// Ensures a leading `/` and drops trailing slashes (except for the root path).
pub fn normalize_path(path: &str) -> String {
    let trimmed = path.trim();
    let mut normalized = if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    };
    while normalized.len() > 1 && normalized.ends_with('/') {
        normalized.pop();
    }
    normalized
}

/// Extracts the `{param}` placeholder names of a path template, in order.
pub fn path_placeholders(path: &str) -> Vec<String> {
    let re = Regex::new(PLACEHOLDER_PATTERN).expect("Invalid regex constant");
    re.captures_iter(path)
        .map(|cap| cap[1].to_string())
        .collect()
}

/// Whether a body route sends its whole input as the request body: no path parameters
/// are split off and the input is not an object without fields.
pub(crate) fn sends_whole_input(route: &Route, input_object: Option<&ObjectShape>) -> bool {
    route.method.has_body()
        && route.input.is_some()
        && path_placeholders(&route.path).is_empty()
        && input_object.map_or(true, |obj| !obj.fields.is_empty())
}

fn template_key(path: &str) -> String {
    let re = Regex::new(PLACEHOLDER_PATTERN).expect("Invalid regex constant");
    re.replace_all(path, "{}").into_owned()
}

fn build_operation(
    route: &Route,
    path: &str,
    defs: &Definitions,
    schemes: &SecuritySchemes,
) -> AppResult<Value> {
    let op_id = route.operation_id.as_str();
    let mut op = Map::new();
    op.insert("operationId".to_string(), json!(op_id));
    if let Some(summary) = &route.summary {
        op.insert("summary".to_string(), json!(summary));
    }
    if let Some(desc) = &route.description {
        op.insert("description".to_string(), json!(desc));
    }
    if route.deprecated {
        op.insert("deprecated".to_string(), json!(true));
    }
    op.insert("tags".to_string(), json!(route.tags));

    let input = route.input.as_ref();
    let input_object = match input {
        Some(shape) => defs.resolve_object(shape, op_id)?,
        None => None,
    };

    let mut parameters = Vec::new();
    let mut consumed = HashSet::new();
    for name in path_placeholders(path) {
        if name.is_empty() {
            return Err(AppError::config(
                op_id,
                format!("empty path parameter in `{}`", path),
            ));
        }
        if name.chars().any(char::is_whitespace) {
            return Err(AppError::config(
                op_id,
                format!("path parameter `{}` in `{}` contains whitespace", name, path),
            ));
        }
        if !consumed.insert(name.clone()) {
            return Err(AppError::config(
                op_id,
                format!("path parameter `{}` appears more than once in `{}`", name, path),
            ));
        }
        let field = input_object
            .and_then(|obj| obj.fields.get(&name))
            .ok_or_else(|| {
                AppError::config(
                    op_id,
                    format!("path parameter `{}` not found in input shape", name),
                )
            })?;
        if field.optional {
            warn!(
                route = op_id,
                param = name.as_str(),
                "optional input field used as path parameter; emitting it as required"
            );
        }
        parameters.push(build_parameter(&name, "path", true, field, defs, op_id)?);
    }

    let remaining: IndexMap<String, Field> = input_object
        .map(|obj| {
            obj.fields
                .iter()
                .filter(|(name, _)| !consumed.contains(*name))
                .map(|(name, field)| (name.clone(), field.clone()))
                .collect()
        })
        .unwrap_or_default();

    if route.method.has_body() {
        let body_schema = match (input, input_object) {
            (Some(shape), _) if sends_whole_input(route, input_object) => {
                Some(to_json_schema(shape, defs, op_id)?)
            }
            (Some(_), Some(obj)) if !remaining.is_empty() => {
                let rest = Shape::Object(ObjectShape {
                    fields: remaining,
                    additional_properties: obj.additional_properties,
                });
                Some(to_json_schema(&rest, defs, op_id)?)
            }
            _ => None,
        };
        if let Some(schema) = body_schema {
            op.insert(
                "requestBody".to_string(),
                json!({
                    "required": true,
                    "content": { JSON_MEDIA_TYPE: { "schema": schema } }
                }),
            );
        }
    } else {
        if input.is_some() && input_object.is_none() {
            return Err(AppError::config(
                op_id,
                format!(
                    "input shape of a {} route must be an object so it can map onto query parameters",
                    route.method
                ),
            ));
        }
        for (name, field) in &remaining {
            parameters.push(build_parameter(
                name,
                "query",
                !field.optional,
                field,
                defs,
                op_id,
            )?);
        }
    }

    if !parameters.is_empty() {
        op.insert("parameters".to_string(), Value::Array(parameters));
    }

    op.insert(
        "responses".to_string(),
        build_responses(&route.output, defs, op_id)?,
    );

    if route.requires_auth {
        op.insert(
            "security".to_string(),
            build_security(schemes, &route.scopes),
        );
    }

    Ok(Value::Object(op))
}

fn build_parameter(
    name: &str,
    location: &str,
    required: bool,
    field: &Field,
    defs: &Definitions,
    context: &str,
) -> AppResult<Value> {
    let mut obj = Map::new();
    obj.insert("name".to_string(), json!(name));
    obj.insert("in".to_string(), json!(location));
    if let Some(desc) = &field.description {
        obj.insert("description".to_string(), json!(desc));
    }
    obj.insert("required".to_string(), json!(required));
    obj.insert(
        "schema".to_string(),
        to_json_schema(&field.shape, defs, context)?,
    );
    Ok(Value::Object(obj))
}

fn build_responses(output: &Shape, defs: &Definitions, context: &str) -> AppResult<Value> {
    let schema = to_json_schema(output, defs, context)?;
    Ok(json!({
        "200": {
            "description": "Successful response",
            "content": { JSON_MEDIA_TYPE: { "schema": schema } }
        },
        "default": { "$ref": ERROR_RESPONSE_REF }
    }))
}
