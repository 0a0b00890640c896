#![deny(missing_docs)]

//! # Shapes
//!
//! A small structural type language describing the input and output data of a route.
//! Shapes are plain data: they deserialize from YAML/JSON router definitions and are
//! converted to JSON Schema by [`crate::schema`].
//!
//! Object fields are **required unless explicitly marked `optional`**. A `nullable`
//! shape is still required; nullability and optionality are independent.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

/// A structural description of a data value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Shape {
    /// A string, optionally constrained.
    String(StringShape),
    /// An integer number.
    Integer(NumericShape),
    /// A floating point number.
    Number(NumericShape),
    /// `true` / `false`.
    Boolean,
    /// A single constant value.
    Literal {
        /// The constant.
        value: Value,
    },
    /// A homogeneous list.
    Array {
        /// Element shape.
        items: Box<Shape>,
    },
    /// A record with named fields.
    Object(ObjectShape),
    /// A string-keyed map with uniform values.
    Record {
        /// Value shape.
        values: Box<Shape>,
    },
    /// Any one of several shapes.
    Union {
        /// The alternatives, in declaration order.
        variants: Vec<Shape>,
    },
    /// The inner shape or `null`.
    Nullable {
        /// The non-null shape.
        inner: Box<Shape>,
    },
    /// A reference to a named shape by its declaration id.
    Ref {
        /// Stable identity of the referenced [`NamedShape`].
        id: String,
    },
    /// Unconstrained.
    Any,
}

/// Constraints for string shapes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StringShape {
    /// JSON Schema `format` (e.g. `uuid`, `date-time`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Allowed values.
    #[serde(default, rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,
    /// Minimum length.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,
    /// Maximum length.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,
    /// ECMA-262 regular expression.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

/// Constraints for integer and number shapes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NumericShape {
    /// JSON Schema `format` (e.g. `int64`, `float`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Inclusive lower bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    /// Inclusive upper bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
}

/// An object shape: ordered named fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectShape {
    /// Fields in declaration order.
    #[serde(default)]
    pub fields: IndexMap<String, Field>,
    /// Whether keys not listed in `fields` are accepted.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub additional_properties: bool,
}

/// One field of an [`ObjectShape`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    /// The field's shape.
    #[serde(flatten)]
    pub shape: Shape,
    /// Explicit optionality marker. Absent means required.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub optional: bool,
    /// Human readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A shape declared once under a stable identity and shared by reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedShape {
    /// Stable identity (declaration site), e.g. `users::User`.
    pub id: String,
    /// Preferred component name. Defaults to the last segment of `id`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Description emitted on the component schema.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// The shape itself.
    pub shape: Shape,
}

impl Shape {
    /// A plain string.
    pub fn string() -> Self {
        Shape::String(StringShape::default())
    }

    /// A string with a `format`.
    pub fn formatted_string(format: impl Into<String>) -> Self {
        Shape::String(StringShape {
            format: Some(format.into()),
            ..StringShape::default()
        })
    }

    /// A string restricted to the given values.
    pub fn string_enum<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Shape::String(StringShape {
            enum_values: Some(values.into_iter().map(Into::into).collect()),
            ..StringShape::default()
        })
    }

    /// An integer.
    pub fn integer() -> Self {
        Shape::Integer(NumericShape::default())
    }

    /// A floating point number.
    pub fn number() -> Self {
        Shape::Number(NumericShape::default())
    }

    /// A boolean.
    pub fn boolean() -> Self {
        Shape::Boolean
    }

    /// Accepts any value.
    pub fn any() -> Self {
        Shape::Any
    }

    /// A list of `items`.
    pub fn array(items: Shape) -> Self {
        Shape::Array {
            items: Box::new(items),
        }
    }

    /// A map with `values`.
    pub fn record(values: Shape) -> Self {
        Shape::Record {
            values: Box::new(values),
        }
    }

    /// A closed object built from `(name, field)` pairs.
    pub fn object<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, Field)>,
        K: Into<String>,
    {
        Shape::Object(ObjectShape {
            fields: fields.into_iter().map(|(k, f)| (k.into(), f)).collect(),
            additional_properties: false,
        })
    }

    /// A reference to a named shape.
    pub fn reference(id: impl Into<String>) -> Self {
        Shape::Ref { id: id.into() }
    }

    /// Wraps `self` so that `null` is also accepted.
    pub fn nullable(self) -> Self {
        Shape::Nullable {
            inner: Box::new(self),
        }
    }

    /// Returns true for shapes that are always emitted inline.
    pub fn is_primitive(&self) -> bool {
        match self {
            Shape::String(_)
            | Shape::Integer(_)
            | Shape::Number(_)
            | Shape::Boolean
            | Shape::Literal { .. }
            | Shape::Any => true,
            Shape::Nullable { inner } => inner.is_primitive(),
            _ => false,
        }
    }

    /// Returns the object shape, if this is one.
    pub fn as_object(&self) -> Option<&ObjectShape> {
        match self {
            Shape::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Content fingerprint of the canonical serialized form.
    ///
    /// Two shapes with the same fingerprint describe the same data; references are
    /// compared by id, not by the content they point at.
    pub fn fingerprint(&self) -> String {
        let canonical = serde_json::to_vec(self).unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(&canonical);
        format!("{:x}", hasher.finalize())
    }
}

impl Field {
    /// A required field.
    pub fn required(shape: Shape) -> Self {
        Self {
            shape,
            optional: false,
            description: None,
        }
    }

    /// A field explicitly marked optional.
    pub fn optional(shape: Shape) -> Self {
        Self {
            shape,
            optional: true,
            description: None,
        }
    }

    /// Sets a description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

impl NamedShape {
    /// Declares a named shape under `id`.
    pub fn new(id: impl Into<String>, shape: Shape) -> Self {
        Self {
            id: id.into(),
            name: None,
            description: None,
            shape,
        }
    }

    /// Overrides the preferred component name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the component description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}
