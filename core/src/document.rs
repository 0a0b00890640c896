#![deny(missing_docs)]

//! # Document Composition
//!
//! Assembles the final OpenAPI 3.0.3 document from the caller's options, the reduced
//! schema definitions, and the translated paths:
//!
//! ```text
//! { openapi, info, servers, paths,
//!   components: { securitySchemes, responses: { error }, schemas },
//!   tags?, externalDocs? }
//! ```

use crate::error::{AppError, AppResult};
use crate::options::GenerateOptions;
use crate::paths::{build_paths, JSON_MEDIA_TYPE};
use crate::reducer::reduce;
use crate::router::Router;
use crate::security::security_schemes_value;
use crate::validation::validate_document;
use serde_json::{json, Map, Value};
use tracing::debug;

/// OpenAPI version emitted verbatim.
pub const OPENAPI_VERSION: &str = "3.0.3";

/// Key of the shared error response under `components.responses`.
pub const ERROR_RESPONSE_NAME: &str = "error";

/// Generates the OpenAPI document describing `router`.
///
/// Generation either fully succeeds or fails with the first configuration error found;
/// neither `router` nor `options` is modified.
pub fn generate_openapi_document(router: &Router, options: &GenerateOptions) -> AppResult<Value> {
    options.validate()?;
    let schemes = options.resolved_security_schemes();
    let external = options.defs.as_deref().unwrap_or(&[]);
    let defs = reduce(external, router, options.ref_strategy)?;
    let paths = build_paths(router, &defs, &schemes)?;

    let mut info = Map::new();
    info.insert("title".to_string(), json!(options.title));
    if let Some(desc) = &options.description {
        info.insert("description".to_string(), json!(desc));
    }
    info.insert("version".to_string(), json!(options.version));

    let mut responses = Map::new();
    responses.insert(ERROR_RESPONSE_NAME.to_string(), error_response_value());

    let mut components = Map::new();
    components.insert(
        "securitySchemes".to_string(),
        security_schemes_value(&schemes),
    );
    components.insert("responses".to_string(), Value::Object(responses));
    components.insert("schemas".to_string(), Value::Object(defs.into_schemas()));

    let mut doc = Map::new();
    doc.insert("openapi".to_string(), json!(OPENAPI_VERSION));
    doc.insert("info".to_string(), Value::Object(info));
    doc.insert("servers".to_string(), json!([{ "url": options.base_url }]));
    doc.insert("paths".to_string(), Value::Object(paths));
    doc.insert("components".to_string(), Value::Object(components));
    if let Some(tags) = options.tags.as_ref().filter(|tags| !tags.is_empty()) {
        let entries = tags
            .iter()
            .map(|tag| json!({ "name": tag }))
            .collect::<Vec<_>>();
        doc.insert("tags".to_string(), Value::Array(entries));
    }
    if let Some(url) = &options.docs_url {
        doc.insert("externalDocs".to_string(), json!({ "url": url }));
    }

    let doc = Value::Object(doc);
    validate_document(&doc)?;
    debug!(
        title = options.title.as_str(),
        routes = router.routes.len(),
        "generated OpenAPI document"
    );
    Ok(doc)
}

/// Generates the document as pretty-printed JSON.
pub fn generate_openapi_json(router: &Router, options: &GenerateOptions) -> AppResult<String> {
    let doc = generate_openapi_document(router, options)?;
    serde_json::to_string_pretty(&doc)
        .map_err(|e| AppError::General(format!("Failed to serialize OpenAPI JSON: {}", e)))
}

/// Generates the document as YAML.
pub fn generate_openapi_yaml(router: &Router, options: &GenerateOptions) -> AppResult<String> {
    let doc = generate_openapi_document(router, options)?;
    serde_yaml::to_string(&doc)
        .map_err(|e| AppError::General(format!("Failed to serialize OpenAPI YAML: {}", e)))
}

/// The shared failure envelope referenced by every operation's `default` response.
pub fn error_response_value() -> Value {
    json!({
        "description": "Error response",
        "content": {
            JSON_MEDIA_TYPE: {
                "schema": {
                    "type": "object",
                    "properties": {
                        "message": { "type": "string" },
                        "code": { "type": "string" }
                    },
                    "required": ["message", "code"],
                    "additionalProperties": false
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::Route;
    use crate::shape::Shape;

    #[test]
    fn test_minimal_document_layout() {
        let router = Router::new().route(Route::get("/ping", "ping", Shape::string()));
        let options = GenerateOptions::new("Ping API", "0.1.0", "https://api.example.com");
        let doc = generate_openapi_document(&router, &options).unwrap();

        let keys: Vec<_> = doc.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["openapi", "info", "servers", "paths", "components"]);
        assert_eq!(doc["openapi"], json!("3.0.3"));
        assert_eq!(doc["info"], json!({ "title": "Ping API", "version": "0.1.0" }));
        assert_eq!(doc["servers"], json!([{ "url": "https://api.example.com" }]));
        assert_eq!(doc["components"]["responses"]["error"], error_response_value());
        assert_eq!(doc["components"]["schemas"], json!({}));
    }

    #[test]
    fn test_tags_and_external_docs() {
        let router = Router::new();
        let options = GenerateOptions::new("T", "1", "https://api.example.com")
            .with_description("Desc")
            .with_tags(["users"])
            .with_docs_url("https://docs.example.com");
        let doc = generate_openapi_document(&router, &options).unwrap();
        assert_eq!(doc["info"]["description"], json!("Desc"));
        assert_eq!(doc["tags"], json!([{ "name": "users" }]));
        assert_eq!(doc["externalDocs"], json!({ "url": "https://docs.example.com" }));
    }

    #[test]
    fn test_empty_tags_are_not_emitted() {
        let options = GenerateOptions::new("T", "1", "https://api.example.com")
            .with_tags(Vec::<String>::new());
        let doc = generate_openapi_document(&Router::new(), &options).unwrap();
        assert!(doc.get("tags").is_none());
        assert!(doc.get("externalDocs").is_none());
    }

    #[test]
    fn test_invalid_options_abort() {
        let options = GenerateOptions::new("T", "", "https://api.example.com");
        assert!(generate_openapi_document(&Router::new(), &options).is_err());
    }

    #[test]
    fn test_yaml_and_json_output() {
        let router = Router::new().route(Route::get("/ping", "ping", Shape::string()));
        let options = GenerateOptions::new("Ping", "1", "https://api.example.com");
        let yaml = generate_openapi_yaml(&router, &options).unwrap();
        assert!(yaml.starts_with("openapi:"));
        assert!(yaml.contains("3.0.3"));
        let json = generate_openapi_json(&router, &options).unwrap();
        assert!(json.contains("\"operationId\": \"ping\""));
    }
}
