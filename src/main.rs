//! infer-tfmodule-schema CLI entry point.

use clap::Parser;
use colored::Colorize;
use std::process::ExitCode;
use tfmodule_schema::cli::Cli;
use tfmodule_schema::inference::OpenAiClient;
use tfmodule_schema::{Config, SchemaError, SchemaInferrer};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.quiet);

    if cli.print_config {
        print!("{}", Config::example_yaml());
        return ExitCode::SUCCESS;
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(error = %e, "Fatal error");

            eprintln!("{} {e}", "Error:".red().bold());

            let mut source = e.source();
            if source.is_some() {
                eprintln!("\nCaused by:");
                let mut i = 0;
                while let Some(cause) = source {
                    eprintln!("  {i}: {cause}");
                    source = cause.source();
                    i += 1;
                }
            }

            let code = e.downcast_ref::<SchemaError>().map_or(1, SchemaError::exit_code);
            ExitCode::from(code)
        }
    }
}

fn init_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        // RUST_LOG wins over the verbose flag
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            let level = match verbose {
                0 => "info",
                1 => "debug",
                _ => "trace",
            };
            EnvFilter::new(format!("warn,tfmodule_schema={level},infer_tfmodule_schema={level}"))
        })
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(&cli)?;
    let api_key = config.api_key()?;
    let invocation = cli.invocation()?;
    let working_dir = std::env::current_dir()?;

    tracing::debug!(
        module = %invocation.module,
        mode = ?invocation.mode,
        output = %invocation.output_file.display(),
        "Starting inference"
    );

    let client = OpenAiClient::new(&config, api_key)?;
    let inferrer = SchemaInferrer::new(config, working_dir, client)?;
    let document = inferrer.run(&invocation, cli.run_options()).await?;

    if !cli.quiet {
        let path = inferrer.output_path(&invocation.output_file);
        println!(
            "{} {} output(s) written to {}",
            "✓".green().bold(),
            document.outputs().len(),
            path.display().to_string().cyan()
        );
    }

    Ok(())
}

fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    if let Some(ref config_path) = cli.config {
        tracing::debug!(path = %config_path.display(), "Loading configuration from explicit path");
        let content = std::fs::read_to_string(config_path)
            .map_err(|e| SchemaError::io(config_path, e, file!(), line!()))?;
        let mut config = Config::from_yaml(&content)?;
        config.merge_cli_args(cli);
        return Ok(config);
    }

    let default_paths = ["tfschema.yaml", "tfschema.yml", ".tfschema.yaml"];
    for path in &default_paths {
        if std::path::Path::new(path).exists() {
            tracing::debug!(path = %path, "Found configuration file");
            let content = std::fs::read_to_string(path).map_err(|e| SchemaError::io(*path, e, file!(), line!()))?;
            let mut config = Config::from_yaml(&content)?;
            config.merge_cli_args(cli);
            return Ok(config);
        }
    }

    tracing::debug!("No configuration file found, using default configuration");
    let mut config = Config::default();
    config.merge_cli_args(cli);
    Ok(config)
}
