#![deny(missing_docs)]

//! # Validoc CLI
//!
//! Command Line Interface for the validation-rule -> OpenAPI engine.
//!
//! Supported Commands:
//! - `generate`: Input file (settings, base document, routes) -> OpenAPI document.
//! - `convert`: One rule -> one schema.

use clap::{Parser, Subcommand};

use crate::error::CliResult;

mod convert;
mod error;
mod generate;
mod logging;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Validation rules -> OpenAPI")]
struct Cli {
    /// Log debug output to stderr.
    #[clap(long, global = true)]
    verbose: bool,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generates an OpenAPI document from a routes input file.
    Generate(generate::GenerateArgs),
    /// Converts a single validation rule to a schema.
    Convert(convert::ConvertArgs),
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose)?;

    match &cli.command {
        Commands::Generate(args) => generate::execute(args)?,
        Commands::Convert(args) => convert::execute(args)?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli_structure() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_generate_flags() {
        let cli = Cli::try_parse_from([
            "validoc",
            "generate",
            "--input",
            "routes.yaml",
            "--openapi",
            "3.0.3",
            "--format",
            "yaml",
            "--verbose",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Generate(args) => {
                assert_eq!(args.version, "3.0.3");
                assert_eq!(args.format, Some(generate::OutputFormat::Yaml));
            }
            Commands::Convert(_) => panic!("expected generate"),
        }
    }
}
