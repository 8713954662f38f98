//! Benford analyzer CLI
//!
//! Uploads CSV datasets into a local store and runs Benford, anomaly and
//! correlation analyses against them by dataset ID.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use benford::cli::commands::{
    run_anomalies, run_benford, run_correlation, run_upload, run_visualize, Output,
};
use benford::cli::{Cli, Commands};
use benford::logging::init_tracing;
use benford::service::{AnalysisService, ApiError};
use benford::utils::{print_banner, print_context, print_failure};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => match err.downcast_ref::<ApiError>() {
            Some(api) => {
                report_api_error(api, cli.json);
                if api.is_client_error() {
                    ExitCode::from(2)
                } else {
                    ExitCode::FAILURE
                }
            }
            None => {
                eprintln!("Error: {:#}", err);
                ExitCode::FAILURE
            }
        },
    }
}

fn run(cli: &Cli) -> Result<()> {
    let output = if cli.json { Output::Json } else { Output::Table };
    let config = cli.service_config();
    let service = AnalysisService::new(config)
        .with_context(|| format!("Failed to open dataset store: {}", cli.store_dir.display()))?;

    if output == Output::Table {
        print_banner(env!("CARGO_PKG_VERSION"));
        print_context(service.store().root(), command_id(&cli.command));
    }

    match &cli.command {
        Commands::Upload { file } => run_upload(&service, file, output),
        Commands::Benford {
            id,
            column,
            plot_out,
        } => run_benford(
            &service,
            id.clone(),
            column.clone(),
            plot_out.as_deref(),
            output,
        ),
        Commands::Anomalies { id, contamination } => {
            run_anomalies(&service, id.clone(), *contamination, output)
        }
        Commands::Correlation { action } => run_correlation(&service, action, output),
        Commands::Visualize { id } => run_visualize(&service, id.clone(), output),
    }
}

fn command_id(command: &Commands) -> Option<&str> {
    use benford::cli::CorrelationCommand;

    match command {
        Commands::Upload { .. } => None,
        Commands::Benford { id, .. }
        | Commands::Anomalies { id, .. }
        | Commands::Visualize { id } => id.as_deref(),
        Commands::Correlation { action } => match action {
            CorrelationCommand::Preview(args) | CorrelationCommand::Apply(args) => {
                args.id.as_deref()
            }
            CorrelationCommand::Stats { id, .. } => id.as_deref(),
        },
    }
}

fn report_api_error(err: &ApiError, json: bool) {
    if json {
        match serde_json::to_string_pretty(&err.body()) {
            Ok(body) => println!("{}", body),
            Err(_) => print_failure(err.status(), &err.to_string()),
        }
    } else {
        print_failure(err.status(), &err.to_string());
    }
}
