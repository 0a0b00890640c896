#![deny(missing_docs)]

//! # Router Registry
//!
//! The ordered list of RPC routes (plus the named shapes they share) that the generator
//! describes. Registration order is the emission order of the generated document.

use crate::error::{AppError, AppResult};
use crate::shape::{NamedShape, Shape};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// HTTP methods a route can be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// GET
    #[serde(alias = "get")]
    Get,
    /// POST
    #[serde(alias = "post")]
    Post,
    /// PUT
    #[serde(alias = "put")]
    Put,
    /// PATCH
    #[serde(alias = "patch")]
    Patch,
    /// DELETE
    #[serde(alias = "delete")]
    Delete,
}

impl HttpMethod {
    /// Lower-case key used in an OpenAPI Path Item.
    pub fn as_key(&self) -> &'static str {
        match self {
            HttpMethod::Get => "get",
            HttpMethod::Post => "post",
            HttpMethod::Put => "put",
            HttpMethod::Patch => "patch",
            HttpMethod::Delete => "delete",
        }
    }

    /// Whether the remaining input fields travel in a JSON request body.
    pub fn has_body(&self) -> bool {
        matches!(self, HttpMethod::Post | HttpMethod::Put | HttpMethod::Patch)
    }
}

impl Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_key().to_ascii_uppercase())
    }
}

/// One RPC endpoint definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    /// HTTP method.
    pub method: HttpMethod,
    /// Path template with `{param}` placeholders, e.g. `/user/{id}`.
    pub path: String,
    /// Unique operation identifier.
    #[serde(alias = "operationId")]
    pub operation_id: String,
    /// Input shape. Absent for routes without input.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<Shape>,
    /// Output shape of the success response.
    pub output: Shape,
    /// Tags, carried through verbatim.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Whether a security requirement is attached.
    #[serde(default, alias = "protect", alias = "requiresAuth")]
    pub requires_auth: bool,
    /// Short summary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Long description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Marks the operation deprecated.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub deprecated: bool,
    /// OAuth2 scopes required when the route is protected.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scopes: Vec<String>,
}

impl Route {
    /// Creates a route with the required fields.
    pub fn new(
        method: HttpMethod,
        path: impl Into<String>,
        operation_id: impl Into<String>,
        output: Shape,
    ) -> Self {
        Self {
            method,
            path: path.into(),
            operation_id: operation_id.into(),
            input: None,
            output,
            tags: Vec::new(),
            requires_auth: false,
            summary: None,
            description: None,
            deprecated: false,
            scopes: Vec::new(),
        }
    }

    /// Shorthand for a GET route.
    pub fn get(path: impl Into<String>, operation_id: impl Into<String>, output: Shape) -> Self {
        Self::new(HttpMethod::Get, path, operation_id, output)
    }

    /// Shorthand for a POST route.
    pub fn post(path: impl Into<String>, operation_id: impl Into<String>, output: Shape) -> Self {
        Self::new(HttpMethod::Post, path, operation_id, output)
    }

    /// Sets the input shape.
    pub fn with_input(mut self, input: Shape) -> Self {
        self.input = Some(input);
        self
    }

    /// Adds a tag.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Marks the route as requiring authentication.
    pub fn protected(mut self) -> Self {
        self.requires_auth = true;
        self
    }

    /// Sets a summary.
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    /// Sets a description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Marks the route deprecated.
    pub fn deprecated(mut self) -> Self {
        self.deprecated = true;
        self
    }

    /// Sets the OAuth2 scopes.
    pub fn with_scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes = scopes.into_iter().map(Into::into).collect();
        self
    }
}

/// Ordered registry of routes and shared shapes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Router {
    /// Named shapes referenced from route shapes via `ref`.
    #[serde(default)]
    pub shapes: Vec<NamedShape>,
    /// Routes, in registration order.
    #[serde(default)]
    pub routes: Vec<Route>,
}

impl Router {
    /// Creates an empty router.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a named shape.
    pub fn shape(mut self, shape: NamedShape) -> Self {
        self.shapes.push(shape);
        self
    }

    /// Registers a route.
    pub fn route(mut self, route: Route) -> Self {
        self.routes.push(route);
        self
    }

    /// Parses a router definition from YAML.
    pub fn from_yaml_str(yaml: &str) -> AppResult<Self> {
        serde_yaml::from_str(yaml)
            .map_err(|e| AppError::General(format!("Failed to parse router YAML: {}", e)))
    }

    /// Parses a router definition from JSON.
    pub fn from_json_str(json: &str) -> AppResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| AppError::General(format!("Failed to parse router JSON: {}", e)))
    }
}
