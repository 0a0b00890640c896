#![deny(missing_docs)]

//! # Security Schemes
//!
//! Security scheme definitions emitted under `components.securitySchemes`, and the
//! per-operation requirement lists that reference them by name.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Name of the scheme used when the caller supplies none.
pub const DEFAULT_SCHEME_NAME: &str = "Authorization";

/// Ordered registry of security schemes keyed by component name.
pub type SecuritySchemes = IndexMap<String, SecurityScheme>;

/// A security scheme definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityScheme {
    /// The kind of scheme and its settings.
    #[serde(flatten)]
    pub kind: SecuritySchemeKind,
    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Supported security scheme kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SecuritySchemeKind {
    /// `Authorization: Bearer <token>`.
    HttpBearer {
        /// Hint about the token format (e.g. `JWT`).
        #[serde(default, skip_serializing_if = "Option::is_none")]
        bearer_format: Option<String>,
    },
    /// HTTP basic authentication.
    HttpBasic,
    /// API key in a header, query parameter or cookie.
    ApiKey {
        /// Header / query / cookie name.
        name: String,
        /// Where the key is sent.
        #[serde(rename = "in")]
        location: ApiKeyLocation,
    },
    /// OAuth 2.0 flows.
    #[serde(rename = "oauth2")]
    OAuth2 {
        /// Supported flows.
        flows: OAuthFlows,
    },
    /// Any other OpenAPI security scheme object, emitted verbatim.
    Custom {
        /// The raw Security Scheme Object.
        definition: Value,
    },
}

/// Location of an API key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiKeyLocation {
    /// Request header.
    Header,
    /// Query string.
    Query,
    /// Cookie.
    Cookie,
}

/// OAuth2 flows object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OAuthFlows {
    /// Implicit flow.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub implicit: Option<OAuthFlow>,
    /// Resource owner password flow.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<OAuthFlow>,
    /// Client credentials flow.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_credentials: Option<OAuthFlow>,
    /// Authorization code flow.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorization_code: Option<OAuthFlow>,
}

/// A single OAuth2 flow.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OAuthFlow {
    /// Authorization endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorization_url: Option<String>,
    /// Token endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_url: Option<String>,
    /// Refresh endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_url: Option<String>,
    /// Scope name -> description.
    #[serde(default)]
    pub scopes: IndexMap<String, String>,
}

impl SecurityScheme {
    /// An HTTP bearer scheme.
    pub fn bearer() -> Self {
        Self {
            kind: SecuritySchemeKind::HttpBearer {
                bearer_format: None,
            },
            description: None,
        }
    }

    /// An API key scheme.
    pub fn api_key(name: impl Into<String>, location: ApiKeyLocation) -> Self {
        Self {
            kind: SecuritySchemeKind::ApiKey {
                name: name.into(),
                location,
            },
            description: None,
        }
    }

    /// An OAuth2 scheme.
    pub fn oauth2(flows: OAuthFlows) -> Self {
        Self {
            kind: SecuritySchemeKind::OAuth2 { flows },
            description: None,
        }
    }

    /// A verbatim Security Scheme Object.
    pub fn custom(definition: Value) -> Self {
        Self {
            kind: SecuritySchemeKind::Custom { definition },
            description: None,
        }
    }

    /// Sets a description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Whether requirements on this scheme carry scope lists.
    pub fn uses_scopes(&self) -> bool {
        match &self.kind {
            SecuritySchemeKind::OAuth2 { .. } => true,
            SecuritySchemeKind::Custom { definition } => matches!(
                definition.get("type").and_then(Value::as_str),
                Some("oauth2") | Some("openIdConnect")
            ),
            _ => false,
        }
    }

    /// Renders the Security Scheme Object.
    pub fn to_value(&self) -> Value {
        let mut obj = Map::new();
        match &self.kind {
            SecuritySchemeKind::HttpBearer { bearer_format } => {
                obj.insert("type".to_string(), json!("http"));
                obj.insert("scheme".to_string(), json!("bearer"));
                if let Some(fmt) = bearer_format {
                    obj.insert("bearerFormat".to_string(), json!(fmt));
                }
            }
            SecuritySchemeKind::HttpBasic => {
                obj.insert("type".to_string(), json!("http"));
                obj.insert("scheme".to_string(), json!("basic"));
            }
            SecuritySchemeKind::ApiKey { name, location } => {
                obj.insert("type".to_string(), json!("apiKey"));
                obj.insert("name".to_string(), json!(name));
                obj.insert("in".to_string(), json!(location));
            }
            SecuritySchemeKind::OAuth2 { flows } => {
                obj.insert("type".to_string(), json!("oauth2"));
                obj.insert("flows".to_string(), oauth_flows_value(flows));
            }
            SecuritySchemeKind::Custom { definition } => {
                return match (definition, &self.description) {
                    (Value::Object(map), Some(desc)) if !map.contains_key("description") => {
                        let mut map = map.clone();
                        map.insert("description".to_string(), json!(desc));
                        Value::Object(map)
                    }
                    _ => definition.clone(),
                };
            }
        }
        if let Some(desc) = &self.description {
            obj.insert("description".to_string(), json!(desc));
        }
        Value::Object(obj)
    }
}

/// The registry used when the caller supplies no schemes: one bearer scheme named
/// `Authorization`.
pub fn default_security_schemes() -> SecuritySchemes {
    let mut schemes = SecuritySchemes::new();
    schemes.insert(DEFAULT_SCHEME_NAME.to_string(), SecurityScheme::bearer());
    schemes
}

/// Renders `components.securitySchemes`.
pub fn security_schemes_value(schemes: &SecuritySchemes) -> Value {
    let map = schemes
        .iter()
        .map(|(name, scheme)| (name.clone(), scheme.to_value()))
        .collect::<Map<String, Value>>();
    Value::Object(map)
}

/// Builds an operation `security` list: one requirement object per scheme, so that
/// satisfying any one of them suffices.
pub fn build_security(schemes: &SecuritySchemes, scopes: &[String]) -> Value {
    let list = schemes
        .iter()
        .map(|(name, scheme)| {
            let scopes = if scheme.uses_scopes() {
                scopes.iter().cloned().map(Value::String).collect()
            } else {
                Vec::new()
            };
            let mut req = Map::new();
            req.insert(name.clone(), Value::Array(scopes));
            Value::Object(req)
        })
        .collect::<Vec<_>>();
    Value::Array(list)
}

fn oauth_flows_value(flows: &OAuthFlows) -> Value {
    let mut map = Map::new();
    if let Some(flow) = flows.implicit.as_ref() {
        map.insert("implicit".to_string(), oauth_flow_value(flow));
    }
    if let Some(flow) = flows.password.as_ref() {
        map.insert("password".to_string(), oauth_flow_value(flow));
    }
    if let Some(flow) = flows.client_credentials.as_ref() {
        map.insert("clientCredentials".to_string(), oauth_flow_value(flow));
    }
    if let Some(flow) = flows.authorization_code.as_ref() {
        map.insert("authorizationCode".to_string(), oauth_flow_value(flow));
    }
    Value::Object(map)
}

fn oauth_flow_value(flow: &OAuthFlow) -> Value {
    let mut map = Map::new();
    if let Some(url) = &flow.authorization_url {
        map.insert("authorizationUrl".to_string(), json!(url));
    }
    if let Some(url) = &flow.token_url {
        map.insert("tokenUrl".to_string(), json!(url));
    }
    if let Some(url) = &flow.refresh_url {
        map.insert("refreshUrl".to_string(), json!(url));
    }
    map.insert("scopes".to_string(), json!(flow.scopes));
    Value::Object(map)
}
