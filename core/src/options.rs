#![deny(missing_docs)]

//! # Generator Options
//!
//! Caller-supplied document metadata and generation settings.

use crate::error::{AppError, AppResult, OPTIONS_CONTEXT};
use crate::schema::RefStrategy;
use crate::security::{default_security_schemes, SecurityScheme, SecuritySchemes};
use crate::shape::NamedShape;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use url::Url;

const DUMMY_BASE: &str = "http://example.invalid/";

/// Options for [`crate::generate_openapi_document`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateOptions {
    /// API title.
    pub title: String,
    /// API description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// API version, emitted verbatim. Must not be empty.
    pub version: String,
    /// URL of the single server entry.
    pub base_url: String,
    /// URL emitted as top-level `externalDocs`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docs_url: Option<String>,
    /// Top-level tag names.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    /// Security schemes; one bearer scheme named `Authorization` when absent or empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security_schemes: Option<SecuritySchemes>,
    /// Shape definitions collected outside the router, registered first.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defs: Option<Vec<NamedShape>>,
    /// Reference rendering strategy.
    #[serde(default)]
    pub ref_strategy: RefStrategy,
}

impl GenerateOptions {
    /// Creates options with the required fields.
    pub fn new(
        title: impl Into<String>,
        version: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            description: None,
            version: version.into(),
            base_url: base_url.into(),
            docs_url: None,
            tags: None,
            security_schemes: None,
            defs: None,
            ref_strategy: RefStrategy::Root,
        }
    }

    /// Sets the API description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the external docs URL.
    pub fn with_docs_url(mut self, url: impl Into<String>) -> Self {
        self.docs_url = Some(url.into());
        self
    }

    /// Replaces the top-level tags.
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    /// Adds a security scheme.
    pub fn with_security_scheme(mut self, name: impl Into<String>, scheme: SecurityScheme) -> Self {
        self.security_schemes
            .get_or_insert_with(SecuritySchemes::new)
            .insert(name.into(), scheme);
        self
    }

    /// Replaces the security schemes.
    pub fn with_security_schemes(mut self, schemes: SecuritySchemes) -> Self {
        self.security_schemes = Some(schemes);
        self
    }

    /// Sets externally collected shape definitions.
    pub fn with_defs(mut self, defs: Vec<NamedShape>) -> Self {
        self.defs = Some(defs);
        self
    }

    /// Sets the reference strategy.
    pub fn with_ref_strategy(mut self, strategy: RefStrategy) -> Self {
        self.ref_strategy = strategy;
        self
    }

    /// The schemes in effect: the caller's, or the default bearer scheme.
    pub fn resolved_security_schemes(&self) -> SecuritySchemes {
        match &self.security_schemes {
            Some(schemes) if !schemes.is_empty() => schemes.clone(),
            _ => default_security_schemes(),
        }
    }

    /// Checks the document-level invariants the options must satisfy.
    pub fn validate(&self) -> AppResult<()> {
        if self.title.trim().is_empty() {
            return Err(invalid("title must not be empty"));
        }
        if self.version.trim().is_empty() {
            return Err(invalid("version must not be empty"));
        }
        validate_url(&self.base_url, "baseUrl")?;
        if let Some(docs) = &self.docs_url {
            validate_url(docs, "docsUrl")?;
        }
        if let Some(tags) = &self.tags {
            let mut seen = HashSet::new();
            for tag in tags {
                if tag.trim().is_empty() {
                    return Err(invalid("tag names must not be empty"));
                }
                if !seen.insert(tag.as_str()) {
                    return Err(invalid(format!("duplicate tag `{}`", tag)));
                }
            }
        }
        Ok(())
    }
}

fn invalid(message: impl Into<String>) -> AppError {
    AppError::config(OPTIONS_CONTEXT, message)
}

/// Accepts absolute URLs and server-relative paths (`/api`). Whitespace is rejected
/// anywhere since `url` would silently percent-encode it.
fn validate_url(raw: &str, field: &str) -> AppResult<()> {
    if raw.trim().is_empty() {
        return Err(invalid(format!("{} must not be empty", field)));
    }
    if raw.chars().any(char::is_whitespace) {
        return Err(invalid(format!("{} `{}` must not contain whitespace", field, raw)));
    }
    if Url::parse(raw).is_ok() {
        return Ok(());
    }
    if raw.starts_with('/') && !raw.starts_with("//") {
        let base = Url::parse(DUMMY_BASE)
            .map_err(|e| AppError::General(format!("Invalid base URL constant: {}", e)))?;
        if base.join(raw).is_ok() {
            return Ok(());
        }
    }
    Err(invalid(format!("{} `{}` is not a valid URL", field, raw)))
}
