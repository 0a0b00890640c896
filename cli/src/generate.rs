#![deny(missing_docs)]

//! # Generate Command
//!
//! Loads a router definition file, maps flags onto `GenerateOptions`, runs the
//! pipeline and writes the document as JSON or YAML.

use crate::error::{CliError, CliResult};
use rpc2oas_core::{
    generate_openapi_json, generate_openapi_yaml, GenerateOptions, NamedShape, RefStrategy,
    Router, SecuritySchemes,
};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Serialization format of the emitted document.
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Pretty-printed JSON.
    #[default]
    Json,
    /// YAML.
    Yaml,
}

/// Arguments for the `generate` command.
#[derive(clap::Args, Debug, Clone)]
pub struct GenerateArgs {
    /// Router definition file (YAML or JSON, chosen by extension).
    #[clap(long, env = "RPC2OAS_ROUTER")]
    pub router: PathBuf,

    /// API title.
    #[clap(long, env = "RPC2OAS_TITLE")]
    pub title: String,

    /// API version.
    #[clap(id = "api_version", long = "version", env = "RPC2OAS_VERSION")]
    pub api_version: String,

    /// Server URL.
    #[clap(long, env = "RPC2OAS_BASE_URL")]
    pub base_url: String,

    /// API description.
    #[clap(long, env = "RPC2OAS_DESCRIPTION")]
    pub description: Option<String>,

    /// External documentation URL.
    #[clap(long, env = "RPC2OAS_DOCS_URL")]
    pub docs_url: Option<String>,

    /// Top-level tag (repeatable).
    #[clap(long, env = "RPC2OAS_TAGS", value_delimiter = ',')]
    pub tag: Vec<String>,

    /// File holding a map of security schemes.
    #[clap(long, env = "RPC2OAS_SECURITY")]
    pub security: Option<PathBuf>,

    /// File holding extra shape definitions, registered before the router's.
    #[clap(long, env = "RPC2OAS_DEFS")]
    pub defs: Option<PathBuf>,

    /// Inline every shape reference instead of emitting `components.schemas`.
    #[clap(long, env = "RPC2OAS_INLINE_REFS")]
    pub inline_refs: bool,

    /// Output format.
    #[clap(long, value_enum, default_value = "json", env = "RPC2OAS_FORMAT")]
    pub format: OutputFormat,

    /// Output file. Writes to stdout when absent.
    #[clap(long, env = "RPC2OAS_OUTPUT")]
    pub output: Option<PathBuf>,
}

/// Executes the generate command.
pub fn execute(args: &GenerateArgs) -> CliResult<()> {
    let router: Router = read_structured(&args.router)?;
    let options = build_options(args)?;
    info!(
        routes = router.routes.len(),
        shapes = router.shapes.len(),
        "loaded router from {:?}",
        args.router
    );

    let rendered = match args.format {
        OutputFormat::Json => generate_openapi_json(&router, &options)?,
        OutputFormat::Yaml => generate_openapi_yaml(&router, &options)?,
    };

    match &args.output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, with_trailing_newline(rendered))?;
            info!("wrote OpenAPI document to {:?}", path);
        }
        None => print!("{}", with_trailing_newline(rendered)),
    }
    Ok(())
}

fn build_options(args: &GenerateArgs) -> CliResult<GenerateOptions> {
    let mut options = GenerateOptions::new(&args.title, &args.api_version, &args.base_url);
    if let Some(desc) = &args.description {
        options = options.with_description(desc);
    }
    if let Some(url) = &args.docs_url {
        options = options.with_docs_url(url);
    }
    if !args.tag.is_empty() {
        options = options.with_tags(args.tag.iter().cloned());
    }
    if let Some(path) = &args.security {
        let schemes: SecuritySchemes = read_structured(path)?;
        options = options.with_security_schemes(schemes);
    }
    if let Some(path) = &args.defs {
        let defs: Vec<NamedShape> = read_structured(path)?;
        options = options.with_defs(defs);
    }
    if args.inline_refs {
        options = options.with_ref_strategy(RefStrategy::None);
    }
    Ok(options)
}

/// Reads a YAML or JSON file, picking the parser by extension (`.json` -> JSON, else YAML).
fn read_structured<T: DeserializeOwned>(path: &Path) -> CliResult<T> {
    let content = fs::read_to_string(path).map_err(|e| {
        CliError::General(format!("Failed to read {}: {}", path.display(), e))
    })?;
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        serde_json::from_str(&content).map_err(|e| {
            CliError::General(format!("Failed to parse JSON {}: {}", path.display(), e))
        })
    } else {
        serde_yaml::from_str(&content).map_err(|e| {
            CliError::General(format!("Failed to parse YAML {}: {}", path.display(), e))
        })
    }
}

fn with_trailing_newline(mut text: String) -> String {
    if !text.ends_with('\n') {
        text.push('\n');
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::Value;
    use tempfile::tempdir;

    const ROUTER_YAML: &str = r#"
shapes:
  - id: "models:User"
    shape:
      type: object
      fields:
        id: { type: string }
        name: { type: string, description: "Display name" }
routes:
  - method: GET
    path: /user/{id}
    operationId: getUser
    input:
      type: object
      fields:
        id: { type: string }
    output: { type: ref, id: "models:User" }
    protect: true
"#;

    fn args(dir: &Path, router: PathBuf) -> GenerateArgs {
        GenerateArgs {
            router,
            title: "Users".to_string(),
            api_version: "1.0.0".to_string(),
            base_url: "https://api.example.com".to_string(),
            description: None,
            docs_url: None,
            tag: vec![],
            security: None,
            defs: None,
            inline_refs: false,
            format: OutputFormat::Json,
            output: Some(dir.join("out").join("openapi.json")),
        }
    }

    #[test]
    fn test_generate_json_from_yaml_router() {
        let dir = tempdir().unwrap();
        let router_path = dir.path().join("router.yaml");
        fs::write(&router_path, ROUTER_YAML).unwrap();

        let args = args(dir.path(), router_path);
        execute(&args).unwrap();

        let written = fs::read_to_string(args.output.as_ref().unwrap()).unwrap();
        let doc: Value = serde_json::from_str(&written).unwrap();
        assert_eq!(doc["openapi"], "3.0.3");
        let op = &doc["paths"]["/user/{id}"]["get"];
        assert_eq!(op["operationId"], "getUser");
        assert_eq!(
            op["responses"]["200"]["content"]["application/json"]["schema"]["$ref"],
            "#/components/schemas/User"
        );
        assert_eq!(op["security"], serde_json::json!([{ "Authorization": [] }]));
    }

    #[test]
    fn test_generate_yaml_with_security_file_and_inline_refs() {
        let dir = tempdir().unwrap();
        let router_path = dir.path().join("router.yml");
        fs::write(&router_path, ROUTER_YAML).unwrap();
        let security_path = dir.path().join("security.json");
        fs::write(
            &security_path,
            r#"{ "ApiKey": { "kind": "api_key", "name": "X-Api-Key", "in": "header" } }"#,
        )
        .unwrap();

        let mut args = args(dir.path(), router_path);
        args.security = Some(security_path);
        args.inline_refs = true;
        args.format = OutputFormat::Yaml;
        args.output = Some(dir.path().join("openapi.yaml"));
        execute(&args).unwrap();

        let written = fs::read_to_string(args.output.as_ref().unwrap()).unwrap();
        let doc: Value = serde_yaml::from_str(&written).unwrap();
        assert_eq!(doc["components"]["schemas"], serde_json::json!({}));
        assert_eq!(
            doc["components"]["securitySchemes"]["ApiKey"]["type"],
            "apiKey"
        );
        let schema = &doc["paths"]["/user/{id}"]["get"]["responses"]["200"]["content"]
            ["application/json"]["schema"];
        assert_eq!(schema["type"], "object");
    }

    #[test]
    fn test_failure_writes_nothing() {
        let dir = tempdir().unwrap();
        let router_path = dir.path().join("router.yaml");
        fs::write(
            &router_path,
            r#"
routes:
  - { method: POST, path: /items, operationId: a, output: { type: string } }
  - { method: POST, path: /items, operationId: b, output: { type: string } }
"#,
        )
        .unwrap();

        let args = args(dir.path(), router_path);
        let err = execute(&args).unwrap_err();
        assert!(matches!(err, CliError::Core(_)));
        assert!(err.to_string().contains("duplicate route"));
        assert!(!args.output.as_ref().unwrap().exists());
    }

    #[test]
    fn test_missing_router_file() {
        let dir = tempdir().unwrap();
        let args = args(dir.path(), dir.path().join("missing.yaml"));
        let err = execute(&args).unwrap_err();
        assert!(err.to_string().contains("Failed to read"));
    }
}
