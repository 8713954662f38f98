//! Command handlers: build a request, call the service, print the response

use std::path::Path;

use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use console::style;
use serde::Serialize;

use crate::cli::{CorrelationArgs, CorrelationCommand};
use crate::pipeline::{column_names, BenfordAnalysis};
use crate::report::{
    anomaly_table, benford_table, benford_verdict_table, correlation_statistics_table,
    print_indented, summary_tables, ReductionSummary,
};
use crate::service::{
    AnalysisService, AnomalyRequest, BenfordRequest, CorrelationRequest,
    CorrelationStatisticsRequest, UploadedFile, VisualizeRequest,
};
use crate::utils::{
    create_spinner, finish_with_success, finish_with_warning, hidden_spinner, print_count,
    print_info, print_step_header, print_success,
};

/// Output mode chosen by `--json`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Output {
    Table,
    Json,
}

impl Output {
    fn spinner(self, message: &str) -> indicatif::ProgressBar {
        match self {
            Output::Table => create_spinner(message),
            Output::Json => hidden_spinner(),
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn run_upload(service: &AnalysisService, file: &Path, output: Output) -> Result<()> {
    let bytes =
        std::fs::read(file).with_context(|| format!("Failed to read file: {}", file.display()))?;
    let filename = file
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string();

    let spinner = output.spinner("Parsing and storing dataset...");
    let response = service.upload(Some(UploadedFile::new(filename, bytes)));
    match &response {
        Ok(_) => finish_with_success(&spinner, "Dataset stored"),
        Err(_) => finish_with_warning(&spinner, "Upload failed"),
    }
    let response = response?;

    match output {
        Output::Json => print_json(&response),
        Output::Table => {
            print_success(&format!("Dataset ID: {}", style(&response.id).yellow().bold()));
            Ok(())
        }
    }
}

pub fn run_benford(
    service: &AnalysisService,
    id: Option<String>,
    column: Option<String>,
    plot_out: Option<&Path>,
    output: Output,
) -> Result<()> {
    let spinner = output.spinner("Extracting leading digits...");
    let response = service.analyze_benford(BenfordRequest {
        id,
        column: column.clone(),
    });
    match &response {
        Ok(_) => finish_with_success(&spinner, "Benford analysis complete"),
        Err(_) => finish_with_warning(&spinner, "Benford analysis failed"),
    }
    let response = response?;

    if let Some(path) = plot_out {
        let svg = STANDARD
            .decode(&response.plot)
            .context("Plot payload is not valid base64")?;
        std::fs::write(path, svg)
            .with_context(|| format!("Failed to write plot: {}", path.display()))?;
        if output == Output::Table {
            print_info(&format!("Chart written to {}", path.display()));
        }
    }

    if output == Output::Json {
        return print_json(&response);
    }

    let analysis = BenfordAnalysis {
        empirical_probs: response.empirical_probs,
        benford_probs: response.benford_probs,
        chi_stat: response.chi_stat,
        p_value: response.p_value,
        total_count: response.total_count,
    };
    print_step_header(&format!(
        "FIRST-DIGIT DISTRIBUTION ({})",
        column.unwrap_or_default()
    ));
    print_indented(&benford_table(&analysis));
    println!();
    print_indented(&benford_verdict_table(&analysis));
    Ok(())
}

pub fn run_anomalies(
    service: &AnalysisService,
    id: Option<String>,
    contamination: Option<f64>,
    output: Output,
) -> Result<()> {
    let spinner = output.spinner("Fitting isolation forest...");
    let response = service.detect_anomalies(AnomalyRequest { id, contamination });
    match &response {
        Ok(r) => finish_with_success(
            &spinner,
            &format!("Scored {} rows", r.total_count),
        ),
        Err(_) => finish_with_warning(&spinner, "Anomaly detection failed"),
    }
    let response = response?;

    if output == Output::Json {
        return print_json(&response);
    }

    print_step_header("ANOMALIES");
    print_count(
        "anomalous rows",
        response.anomaly_count,
        Some(&format!("out of {}", response.total_count)),
    );
    if !response.anomalies.is_empty() {
        println!();
        print_indented(&anomaly_table(&response.anomalies));
    }
    Ok(())
}

/// Column names of a stored dataset, empty when it cannot be loaded
fn dataset_columns(service: &AnalysisService, id: Option<&str>) -> Vec<String> {
    id.and_then(|id| service.store().retrieve_str(id).ok())
        .map(|df| column_names(&df))
        .unwrap_or_default()
}

fn correlation_request(args: &CorrelationArgs) -> CorrelationRequest {
    CorrelationRequest {
        id: args.id.clone(),
        threshold: args.threshold,
        method: args.method.clone(),
        selection_method: args.selection_method.clone(),
    }
}

pub fn run_correlation(
    service: &AnalysisService,
    action: &CorrelationCommand,
    output: Output,
) -> Result<()> {
    match action {
        CorrelationCommand::Preview(args) => {
            let spinner = output.spinner("Grouping correlated columns...");
            let response = service.preview_columns_to_remove(correlation_request(args));
            match &response {
                Ok(_) => finish_with_success(&spinner, "Correlation groups found"),
                Err(_) => finish_with_warning(&spinner, "Correlation preview failed"),
            }
            let response = response?;

            if output == Output::Json {
                return print_json(&response);
            }

            let columns = dataset_columns(service, args.id.as_deref());
            let mut summary = ReductionSummary::new(columns.len());
            summary.record_drops(response.columns_to_remove);
            summary.set_groups(response.groups);
            summary.display();
            Ok(())
        }
        CorrelationCommand::Apply(args) => {
            let spinner = output.spinner("Removing correlated columns...");
            let response = service.apply_correlation_reduction(correlation_request(args));
            match &response {
                Ok(_) => finish_with_success(&spinner, "Reduced dataset stored"),
                Err(_) => finish_with_warning(&spinner, "Correlation reduction failed"),
            }
            let response = response?;

            if output == Output::Json {
                return print_json(&response);
            }
            let before = dataset_columns(service, args.id.as_deref());
            let after = dataset_columns(service, Some(&response.id));
            let dropped = before
                .iter()
                .filter(|c| !after.contains(c))
                .cloned()
                .collect();

            let mut summary = ReductionSummary::new(before.len());
            summary.record_drops(dropped);
            summary.set_new_id(&response.id);
            summary.display();
            println!();
            print_success(&format!(
                "New dataset ID: {}",
                style(&response.id).yellow().bold()
            ));
            Ok(())
        }
        CorrelationCommand::Stats { id, method } => {
            let spinner = output.spinner("Computing correlation matrix...");
            let response = service.correlation_statistics(CorrelationStatisticsRequest {
                id: id.clone(),
                method: method.clone(),
            });
            match &response {
                Ok(_) => finish_with_success(&spinner, "Correlation matrix computed"),
                Err(_) => finish_with_warning(&spinner, "Correlation statistics failed"),
            }
            let response = response?;

            if output == Output::Json {
                return print_json(&response);
            }
            print_step_header(&format!("CORRELATION ({})", response.method));
            if let Some(max) = response.max_correlation {
                print_info(&format!("Highest pairwise r: {:.4}", max));
            }
            print_indented(&correlation_statistics_table(&response.average_correlation));
            Ok(())
        }
    }
}

pub fn run_visualize(service: &AnalysisService, id: Option<String>, output: Output) -> Result<()> {
    let summary = service.visualize(VisualizeRequest { id })?;

    if output == Output::Json {
        return print_json(&summary);
    }

    print_step_header("DATASET");
    print_count("rows", summary.length, Some(&format!("in {} columns", summary.columns.len())));
    let (head, tail) = summary_tables(&summary);
    println!();
    print_info("First rows");
    print_indented(&head);
    println!();
    print_info("Last rows");
    print_indented(&tail);
    Ok(())
}
