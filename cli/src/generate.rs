#![deny(missing_docs)]

//! # Generate Command
//!
//! Reads an input file (settings, base document, routes) and writes the
//! generated OpenAPI document.

use crate::error::{CliError, CliResult};
use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use validoc_core::{DocumentGenerator, GeneratorSettings, Route};

/// Contents of the input file.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct InputFile {
    /// Generator settings.
    pub settings: GeneratorSettings,
    /// Document skeleton (info, security schemes, ...).
    pub base: Value,
    /// Routes to document.
    pub routes: Vec<Route>,
}

/// Serialization of the written document.
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Pretty-printed JSON.
    Json,
    /// YAML.
    Yaml,
}

impl OutputFormat {
    /// YAML for `.yaml` / `.yml` outputs, JSON otherwise.
    fn from_path(path: Option<&Path>) -> Self {
        match path.and_then(|p| p.extension()).and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => OutputFormat::Yaml,
            _ => OutputFormat::Json,
        }
    }

    fn render(self, document: &Value) -> CliResult<String> {
        match self {
            OutputFormat::Json => serde_json::to_string_pretty(document)
                .map_err(|e| CliError::General(format!("JSON serialization failed: {}", e))),
            OutputFormat::Yaml => serde_yaml::to_string(document)
                .map_err(|e| CliError::General(format!("YAML serialization failed: {}", e))),
        }
    }
}

/// Arguments for the generate command.
#[derive(clap::Args, Debug, Clone)]
pub struct GenerateArgs {
    /// Input file in YAML or JSON.
    #[clap(long)]
    pub input: PathBuf,

    /// OpenAPI version of the document (3.0.x or 3.1.x).
    #[clap(long = "openapi", env = "VALIDOC_VERSION", default_value = "3.1.0")]
    pub version: String,

    /// Output path. Prints to stdout when not provided.
    #[clap(long)]
    pub output: Option<PathBuf>,

    /// Output format. Defaults to the output extension, else JSON.
    #[clap(long, value_enum, env = "VALIDOC_FORMAT")]
    pub format: Option<OutputFormat>,
}

/// Loads the input file.
pub fn load_input(path: &Path) -> CliResult<InputFile> {
    let content = fs::read_to_string(path)?;
    serde_yaml::from_str(&content)
        .map_err(|e| CliError::Parse(format!("{}: {}", path.display(), e)))
}

/// Runs the engine over a loaded input.
pub fn generate_document(input: InputFile, version: &str) -> CliResult<Value> {
    let mut generator =
        DocumentGenerator::with_settings(input.settings).with_base_document(input.base)?;
    let document = generator.generate(version, &input.routes)?;
    tracing::debug!(
        routes = input.routes.len(),
        components = generator.components().len(),
        warnings = generator.warnings().len(),
        "document generated"
    );
    Ok(document)
}

/// Executes the generate command.
pub fn execute(args: &GenerateArgs) -> CliResult<()> {
    let input = load_input(&args.input)?;
    let document = generate_document(input, &args.version)?;

    let format = args
        .format
        .unwrap_or_else(|| OutputFormat::from_path(args.output.as_deref()));
    let rendered = format.render(&document)?;

    match &args.output {
        Some(out_path) => {
            if let Some(parent) = out_path.parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    fs::create_dir_all(parent)?;
                }
            }
            fs::write(out_path, rendered)?;
            tracing::info!(path = %out_path.display(), "document written");
        }
        None => println!("{}", rendered),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    const INPUT: &str = r#"
settings:
  summary_template: "{{action}}"
base:
  info:
    title: Shop
    version: "1.0"
routes:
  - methods: POST
    path: /orders
    action: orders.create
    params:
      sku: string
      quantity: "number|optional|integer|min:1"
  - methods: GET
    path: /orders/:id
    action: orders.get
"#;

    fn write_input(dir: &Path, content: &str) -> PathBuf {
        let path = dir.join("routes.yaml");
        fs::File::create(&path)
            .unwrap()
            .write_all(content.as_bytes())
            .unwrap();
        path
    }

    #[test]
    fn test_generate_to_yaml_file() {
        let dir = tempdir().unwrap();
        let input = write_input(dir.path(), INPUT);
        let out_path = dir.path().join("out").join("openapi.yaml");

        let args = GenerateArgs {
            input,
            version: "3.0.3".to_string(),
            output: Some(out_path.clone()),
            format: None,
        };
        execute(&args).unwrap();

        let written: Value = serde_yaml::from_str(&fs::read_to_string(&out_path).unwrap()).unwrap();
        assert_eq!(written["openapi"], "3.0.3");
        assert_eq!(written["info"]["title"], "Shop");
        assert_eq!(written["paths"]["/orders"]["post"]["summary"], "orders.create");
        assert_eq!(
            written["components"]["schemas"]["orders.create"]["required"],
            serde_json::json!(["sku"])
        );
        assert_eq!(
            written["paths"]["/orders/{id}"]["get"]["parameters"][0]["name"],
            "id"
        );
    }

    #[test]
    fn test_explicit_format_overrides_extension() {
        let dir = tempdir().unwrap();
        let input = write_input(dir.path(), INPUT);
        let out_path = dir.path().join("openapi.yaml");

        let args = GenerateArgs {
            input,
            version: "3.1.0".to_string(),
            output: Some(out_path.clone()),
            format: Some(OutputFormat::Json),
        };
        execute(&args).unwrap();

        let content = fs::read_to_string(&out_path).unwrap();
        let written: Value = serde_json::from_str(&content).unwrap();
        assert_eq!(written["openapi"], "3.1.0");
    }

    #[test]
    fn test_missing_input_is_io_error() {
        let dir = tempdir().unwrap();
        let args = GenerateArgs {
            input: dir.path().join("missing.yaml"),
            version: "3.1.0".to_string(),
            output: None,
            format: None,
        };
        assert!(matches!(execute(&args), Err(CliError::Io(_))));
    }

    #[test]
    fn test_invalid_rule_is_parse_error() {
        let dir = tempdir().unwrap();
        let input = write_input(
            dir.path(),
            "routes:\n  - methods: GET\n    path: /x\n    action: x\n    params:\n      a: 42\n",
        );
        assert!(matches!(load_input(&input), Err(CliError::Parse(_))));
    }

    #[test]
    fn test_unsupported_version_is_core_error() {
        let err = generate_document(InputFile::default(), "2.0").unwrap_err();
        assert!(matches!(err, CliError::Core(_)));
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(OutputFormat::from_path(Some(Path::new("a.yml"))), OutputFormat::Yaml);
        assert_eq!(OutputFormat::from_path(Some(Path::new("a.json"))), OutputFormat::Json);
        assert_eq!(OutputFormat::from_path(None), OutputFormat::Json);
    }
}
