#![deny(missing_docs)]

//! # Convert Command
//!
//! Converts a single rule and prints the resulting schema.

use crate::error::{CliError, CliResult};
use serde_json::Value;
use validoc_core::{OpenApiVersion, Rule, RuleConverter};

/// Arguments for the convert command.
#[derive(clap::Args, Debug, Clone)]
pub struct ConvertArgs {
    /// Rule as JSON (`{"type":"string","min":3}`) or shorthand (`string|min:3`).
    #[clap(long)]
    pub rule: String,

    /// OpenAPI version the schema is rendered for.
    #[clap(long = "openapi", env = "VALIDOC_VERSION", default_value = "3.1.0")]
    pub version: String,
}

/// Converts `text` to a schema. `null` when the rule is never documented.
pub fn convert_rule(text: &str, version: &str) -> CliResult<Value> {
    let version = OpenApiVersion::parse(version)?;
    let rule = match serde_json::from_str::<Value>(text) {
        Ok(value) => Rule::from_value(&value)?,
        Err(_) => Rule::from_shorthand(text)?,
    };
    let fragment = RuleConverter::new().convert_rule(&rule)?;
    Ok(fragment
        .map(|f| f.schema.to_value(version))
        .unwrap_or(Value::Null))
}

/// Executes the convert command.
pub fn execute(args: &ConvertArgs) -> CliResult<()> {
    let schema = convert_rule(&args.rule, &args.version)?;
    let rendered = serde_json::to_string_pretty(&schema)
        .map_err(|e| CliError::General(format!("JSON serialization failed: {}", e)))?;
    println!("{}", rendered);
    Ok(())
}
