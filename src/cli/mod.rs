//! Command-line interface module.
//!
//! This module defines the CLI structure using Clap. The tool takes two or
//! three positional arguments; flags may appear anywhere among them.
//!
//! # Example Usage
//!
//! ```bash
//! # Local module directory (two positionals)
//! infer-tfmodule-schema ./modules/vpc schema.json
//!
//! # Registry module (three positionals)
//! infer-tfmodule-schema terraform-aws-modules/vpc/aws 5.1.0 schema.json
//!
//! # Wrap the result for use as a schema override, without string outputs
//! infer-tfmodule-schema terraform-aws-modules/vpc/aws 5.1.0 schema.json \
//!     --generate-override --skip-strings
//! ```

use crate::error::Result;
use crate::types::{ModuleReference, RunOptions, SourceMode};
use clap::Parser;
use std::path::PathBuf;

/// Infer Pulumi output schemas for Terraform modules.
#[derive(Parser, Debug)]
#[command(
    name = "infer-tfmodule-schema",
    author,
    version,
    about = "Infer the output types of a Terraform module with a language model",
    long_about = "Reads the .tf files of a local or registry Terraform module, asks a \
                  language model to infer the type of every output, and writes the \
                  result as a Pulumi schema outputs document.",
    override_usage = "infer-tfmodule-schema <module_source> [<module_version>] <output_file_name> [OPTIONS]"
)]
pub struct Cli {
    /// <module_source> [<module_version>] <output_file_name>
    #[arg(value_name = "ARGS", num_args = 0..)]
    pub args: Vec<String>,

    /// Wrap the outputs with source and version provenance
    #[arg(long)]
    pub generate_override: bool,

    /// Omit outputs whose inferred type is string
    #[arg(long)]
    pub skip_strings: bool,

    /// Path to configuration file
    #[arg(short, long, env = "TFSCHEMA_CONFIG")]
    pub config: Option<PathBuf>,

    /// Chat model to use (overrides configuration)
    #[arg(long, value_name = "MODEL")]
    pub model: Option<String>,

    /// Keep the temporary clone of a registry module
    #[arg(long)]
    pub keep_clone: bool,

    /// Print an example configuration file and exit
    #[arg(long)]
    pub print_config: bool,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    pub quiet: bool,
}

/// What one run should do, derived from the positional arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// The module to analyze
    pub module: ModuleReference,
    /// Local directory or registry module
    pub mode: SourceMode,
    /// Output file name, relative to the working directory
    pub output_file: PathBuf,
}

impl Cli {
    /// Interpret the positional arguments.
    ///
    /// Two positionals name a local module; three name a registry module
    /// and its version.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArguments` for any other count.
    pub fn invocation(&self) -> Result<Invocation> {
        match self.args.as_slice() {
            [source, output] => Ok(Invocation {
                module: ModuleReference::local(source.as_str()),
                mode: SourceMode::Local,
                output_file: PathBuf::from(output),
            }),
            [source, version, output] => Ok(Invocation {
                module: ModuleReference::new(source.as_str(), version.as_str()),
                mode: SourceMode::Registry,
                output_file: PathBuf::from(output),
            }),
            other => Err(crate::err!(InvalidArguments {
                message: format!("Expected 2 or 3 arguments, got {}", other.len()),
            })),
        }
    }

    /// The options that shape the schema document.
    #[must_use]
    pub const fn run_options(&self) -> RunOptions {
        RunOptions {
            generate_schema_override: self.generate_override,
            skip_strings: self.skip_strings,
        }
    }
}
