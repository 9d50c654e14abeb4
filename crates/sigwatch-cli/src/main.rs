//! sigwatch - release signature monitor CLI

use std::process::ExitCode;

use clap::Parser;
use crossterm::style::Stylize;
use sigwatch_schema::IndexOrder;
use tracing_subscriber::EnvFilter;

use sigwatch_cli::{Cli, Commands, cmd, exit};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays the report.
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let code = match dispatch(&cli).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{} {err:#}", "error:".red().bold());
            exit::for_error(&err)
        }
    };
    ExitCode::from(code)
}

async fn dispatch(cli: &Cli) -> anyhow::Result<u8> {
    match &cli.command {
        Commands::Run {
            limit,
            newest_first,
            no_artifacts,
        } => {
            let mut config = cli.load_config()?;
            if *newest_first {
                config.order = IndexOrder::Reverse;
            }
            if *no_artifacts {
                config.verify_artifacts = false;
            }
            let report = cmd::run::run(config, *limit, cli.verbose).await?;
            Ok(exit::for_report(&report))
        }
        Commands::Verify {
            manifest,
            signature,
        } => {
            let config = cli.load_config()?;
            let valid = cmd::verify::verify(&config, manifest, signature)?;
            Ok(if valid { exit::OK } else { exit::FAILURE })
        }
        Commands::Hash { files } => {
            cmd::hash::hash(files)?;
            Ok(exit::OK)
        }
        Commands::Config => {
            let config = cli.load_config()?;
            cmd::config::show(&config)?;
            Ok(exit::OK)
        }
    }
}
