#![deny(missing_docs)]

//! # Schema Conversion
//!
//! Converts [`Shape`]s into JSON Schema objects in the OpenAPI 3.0 dialect
//! (`nullable: true` instead of type arrays, `$ref` without siblings).

use crate::error::{AppError, AppResult};
use crate::reducer::Definitions;
use crate::shape::{NumericShape, ObjectShape, Shape, StringShape};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Prefix of every schema reference emitted by the generator.
pub const SCHEMA_REF_PREFIX: &str = "#/components/schemas/";

/// How references between shapes are rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefStrategy {
    /// Named shapes live in `components.schemas` and are referenced by `$ref`.
    #[default]
    Root,
    /// Every reference is expanded in place; `components.schemas` stays empty.
    None,
}

/// Builds `{"$ref": "#/components/schemas/<name>"}`.
pub fn schema_ref(name: &str) -> Value {
    json!({ "$ref": format!("{}{}", SCHEMA_REF_PREFIX, name) })
}

/// Converts `shape` to a JSON Schema value.
///
/// `context` names the route or shape being converted and is reported on failure.
/// Shapes promoted to shared components are emitted as `$ref`, at any depth.
pub fn to_json_schema(shape: &Shape, defs: &Definitions, context: &str) -> AppResult<Value> {
    let mut stack = Vec::new();
    convert(shape, defs, context, &mut stack)
}

/// Converts the body of a component: the top-level shape is expanded even when it is
/// itself a shared component, nested shapes still become references.
pub(crate) fn component_schema(
    shape: &Shape,
    defs: &Definitions,
    context: &str,
) -> AppResult<Value> {
    let mut stack = Vec::new();
    expand(shape, defs, context, &mut stack)
}

fn convert(
    shape: &Shape,
    defs: &Definitions,
    context: &str,
    stack: &mut Vec<String>,
) -> AppResult<Value> {
    match defs.shared_name(shape) {
        Some(name) => Ok(schema_ref(name)),
        None => expand(shape, defs, context, stack),
    }
}

fn expand(
    shape: &Shape,
    defs: &Definitions,
    context: &str,
    stack: &mut Vec<String>,
) -> AppResult<Value> {
    let value = match shape {
        Shape::String(s) => string_schema(s),
        Shape::Integer(n) => numeric_schema("integer", n),
        Shape::Number(n) => numeric_schema("number", n),
        Shape::Boolean => json!({ "type": "boolean" }),
        Shape::Literal { value } => literal_schema(value),
        Shape::Array { items } => {
            json!({ "type": "array", "items": convert(items, defs, context, stack)? })
        }
        Shape::Object(obj) => object_schema(obj, defs, context, stack)?,
        Shape::Record { values } => json!({
            "type": "object",
            "additionalProperties": convert(values, defs, context, stack)?
        }),
        Shape::Union { variants } => {
            let any_of = variants
                .iter()
                .map(|v| convert(v, defs, context, stack))
                .collect::<AppResult<Vec<_>>>()?;
            json!({ "anyOf": any_of })
        }
        Shape::Nullable { inner } => make_nullable(convert(inner, defs, context, stack)?),
        Shape::Ref { id } => reference_schema(id, defs, context, stack)?,
        Shape::Any => Value::Object(Map::new()),
    };
    Ok(value)
}

fn reference_schema(
    id: &str,
    defs: &Definitions,
    context: &str,
    stack: &mut Vec<String>,
) -> AppResult<Value> {
    let unresolved = || {
        AppError::config(
            context,
            format!("unresolvable schema reference `{}`", id),
        )
    };

    match defs.strategy() {
        RefStrategy::Root => {
            let name = defs.canonical_name(id).ok_or_else(unresolved)?;
            Ok(schema_ref(name))
        }
        RefStrategy::None => {
            let named = defs.resolve(id).ok_or_else(unresolved)?;
            if stack.iter().any(|seen| seen == id) {
                return Err(AppError::config(
                    context,
                    format!("recursive shape `{}` cannot be inlined", id),
                ));
            }
            stack.push(id.to_string());
            let mut schema = convert(&named.shape, defs, context, stack)?;
            stack.pop();
            if let (Some(desc), Value::Object(map)) = (&named.description, &mut schema) {
                map.entry("description".to_string())
                    .or_insert_with(|| json!(desc));
            }
            Ok(schema)
        }
    }
}

fn string_schema(s: &StringShape) -> Value {
    let mut obj = Map::new();
    obj.insert("type".to_string(), json!("string"));
    if let Some(format) = &s.format {
        obj.insert("format".to_string(), json!(format));
    }
    if let Some(values) = &s.enum_values {
        obj.insert("enum".to_string(), json!(values));
    }
    if let Some(min) = s.min_length {
        obj.insert("minLength".to_string(), json!(min));
    }
    if let Some(max) = s.max_length {
        obj.insert("maxLength".to_string(), json!(max));
    }
    if let Some(pattern) = &s.pattern {
        obj.insert("pattern".to_string(), json!(pattern));
    }
    Value::Object(obj)
}

fn numeric_schema(type_name: &str, n: &NumericShape) -> Value {
    let mut obj = Map::new();
    obj.insert("type".to_string(), json!(type_name));
    if let Some(format) = &n.format {
        obj.insert("format".to_string(), json!(format));
    }
    if let Some(min) = n.minimum {
        obj.insert("minimum".to_string(), json!(min));
    }
    if let Some(max) = n.maximum {
        obj.insert("maximum".to_string(), json!(max));
    }
    Value::Object(obj)
}

fn literal_schema(value: &Value) -> Value {
    let type_name = match value {
        Value::Null => return json!({ "nullable": true, "enum": [null] }),
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "number",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    };
    json!({ "type": type_name, "enum": [value] })
}

fn object_schema(
    obj: &ObjectShape,
    defs: &Definitions,
    context: &str,
    stack: &mut Vec<String>,
) -> AppResult<Value> {
    let mut properties = Map::new();
    let mut required = Vec::new();
    for (name, field) in &obj.fields {
        let mut schema = convert(&field.shape, defs, context, stack)?;
        if let Some(desc) = &field.description {
            schema = with_description(schema, desc);
        }
        properties.insert(name.clone(), schema);
        if !field.optional {
            required.push(Value::String(name.clone()));
        }
    }

    let mut out = Map::new();
    out.insert("type".to_string(), json!("object"));
    out.insert("properties".to_string(), Value::Object(properties));
    if !required.is_empty() {
        out.insert("required".to_string(), Value::Array(required));
    }
    out.insert(
        "additionalProperties".to_string(),
        json!(obj.additional_properties),
    );
    Ok(Value::Object(out))
}

/// Adds `description`, wrapping references in `allOf` since 3.0 ignores `$ref` siblings.
pub(crate) fn with_description(schema: Value, description: &str) -> Value {
    match schema {
        Value::Object(mut map) if !map.contains_key("$ref") => {
            map.insert("description".to_string(), json!(description));
            Value::Object(map)
        }
        other => json!({ "allOf": [other], "description": description }),
    }
}

fn make_nullable(schema: Value) -> Value {
    match schema {
        Value::Object(mut map) if !map.contains_key("$ref") => {
            map.insert("nullable".to_string(), json!(true));
            Value::Object(map)
        }
        other => json!({ "allOf": [other], "nullable": true }),
    }
}
