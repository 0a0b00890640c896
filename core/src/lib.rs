#![deny(missing_docs)]

//! # rpc2oas Core
//!
//! Converts an ordered registry of RPC routes into an OpenAPI 3.0.3 document.
//!
//! The pipeline runs in one direction:
//! router -> **reducer** (shared definitions) -> **paths** (operations) -> **document**.
//! It is a pure function of its inputs: no I/O, no global state.

/// Shared error types.
pub mod error;

/// Shape language for route inputs and outputs.
pub mod shape;

/// Shape -> JSON Schema conversion.
pub mod schema;

/// Component naming.
pub mod naming;

/// Shared definition extraction and deduplication.
pub mod reducer;

/// Route registry.
pub mod router;

/// Security scheme definitions and requirements.
pub mod security;

/// Route -> Path Item translation.
pub mod paths;

/// Generator options.
pub mod options;

/// Top-level document composition.
pub mod document;

/// Structural checks on composed documents.
pub mod validation;

pub use document::{
    generate_openapi_document, generate_openapi_json, generate_openapi_yaml, OPENAPI_VERSION,
};
pub use error::{AppError, AppResult};
pub use options::GenerateOptions;
pub use reducer::{reduce, Definitions};
pub use router::{HttpMethod, Route, Router};
pub use schema::RefStrategy;
pub use security::{
    ApiKeyLocation, OAuthFlow, OAuthFlows, SecurityScheme, SecuritySchemeKind, SecuritySchemes,
};
pub use shape::{Field, NamedShape, NumericShape, ObjectShape, Shape, StringShape};
