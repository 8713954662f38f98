//! Table rendering for service responses

use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, CellAlignment, Color, Table};
use serde_json::Value;

use crate::pipeline::BenfordAnalysis;
use crate::store::DatasetSummary;

/// p-value below which the first-digit distribution is flagged as non-Benford
pub const SIGNIFICANCE_LEVEL: f64 = 0.05;

fn base_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(
        headers
            .iter()
            .map(|h| Cell::new(h).add_attribute(Attribute::Bold))
            .collect::<Vec<_>>(),
    );
    table
}

/// Digit-by-digit comparison of observed and expected frequencies.
pub fn benford_table(analysis: &BenfordAnalysis) -> Table {
    let mut table = base_table(&["Digit", "Observed", "Benford", "Deviation"]);

    for (digit, expected) in &analysis.benford_probs {
        let observed = analysis.empirical_probs.get(digit).copied().unwrap_or(0.0);
        let deviation = (observed - expected) * 100.0;
        let color = if deviation.abs() >= 5.0 {
            Color::Red
        } else if deviation.abs() >= 2.0 {
            Color::Yellow
        } else {
            Color::Green
        };

        table.add_row(vec![
            Cell::new(digit).set_alignment(CellAlignment::Center),
            Cell::new(format!("{:.2}%", observed * 100.0)).set_alignment(CellAlignment::Right),
            Cell::new(format!("{:.2}%", expected * 100.0)).set_alignment(CellAlignment::Right),
            Cell::new(format!("{:+.2}", deviation))
                .fg(color)
                .set_alignment(CellAlignment::Right),
        ]);
    }

    table
}

/// Chi-square statistic, p-value and verdict.
pub fn benford_verdict_table(analysis: &BenfordAnalysis) -> Table {
    let mut table = base_table(&["Metric", "Value"]);
    let conforms = analysis.p_value >= SIGNIFICANCE_LEVEL;

    table.add_row(vec![
        Cell::new("Values analyzed"),
        Cell::new(analysis.total_count),
    ]);
    table.add_row(vec![
        Cell::new("Chi-square"),
        Cell::new(format!("{:.4}", analysis.chi_stat)),
    ]);
    table.add_row(vec![
        Cell::new("p-value"),
        Cell::new(format!("{:.4}", analysis.p_value)),
    ]);
    table.add_row(vec![
        Cell::new("Verdict"),
        Cell::new(if conforms {
            "Consistent with Benford's law"
        } else {
            "Deviates from Benford's law"
        })
        .fg(if conforms { Color::Green } else { Color::Red })
        .add_attribute(Attribute::Bold),
    ]);

    table
}

/// Header row plus the given rendered rows.
pub fn rows_table(columns: &[String], rows: &[Vec<String>]) -> Table {
    let headers: Vec<&str> = columns.iter().map(String::as_str).collect();
    let mut table = base_table(&headers);
    for row in rows {
        table.add_row(row.iter().map(Cell::new).collect::<Vec<_>>());
    }
    table
}

/// Head and tail previews of a dataset summary.
pub fn summary_tables(summary: &DatasetSummary) -> (Table, Table) {
    (
        rows_table(&summary.columns, &summary.head),
        rows_table(&summary.columns, &summary.tail),
    )
}

/// Anomalous rows, most anomalous first.
pub fn anomaly_table(records: &[serde_json::Map<String, Value>]) -> Table {
    let columns: Vec<String> = records
        .first()
        .map(|r| r.keys().cloned().collect())
        .unwrap_or_default();
    let headers: Vec<&str> = columns.iter().map(String::as_str).collect();
    let mut table = base_table(&headers);

    let mut sorted: Vec<&serde_json::Map<String, Value>> = records.iter().collect();
    sorted.sort_by(|a, b| {
        let score = |r: &serde_json::Map<String, Value>| {
            r.get("Anomaly_Score")
                .and_then(Value::as_f64)
                .unwrap_or(f64::INFINITY)
        };
        score(a).total_cmp(&score(b))
    });

    for record in sorted {
        table.add_row(
            columns
                .iter()
                .map(|c| Cell::new(json_cell(record.get(c))))
                .collect::<Vec<_>>(),
        );
    }
    table
}

/// Mean correlation per column, strongest first.
pub fn correlation_statistics_table(average_correlation: &[(String, f64)]) -> Table {
    let mut table = base_table(&["Column", "Mean r"]);
    let mut sorted = average_correlation.to_vec();
    sorted.sort_by(|a, b| b.1.abs().total_cmp(&a.1.abs()));

    for (column, value) in sorted {
        let color = if value.abs() >= 0.8 {
            Color::Red
        } else if value.abs() >= 0.5 {
            Color::Yellow
        } else {
            Color::White
        };
        table.add_row(vec![
            Cell::new(column),
            Cell::new(format!("{:.4}", value))
                .fg(color)
                .set_alignment(CellAlignment::Right),
        ]);
    }
    table
}

fn json_cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => "NaN".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => match n.as_f64() {
            Some(f) if n.is_f64() => format!("{:.4}", f),
            _ => n.to_string(),
        },
        Some(other) => other.to_string(),
    }
}

/// Print a table indented under a section header.
pub fn print_indented(table: &Table) {
    for line in table.to_string().lines() {
        println!("    {}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::benford::benford_distribution;
    use serde_json::json;

    #[test]
    fn test_benford_table_has_nine_rows() {
        let analysis = BenfordAnalysis {
            empirical_probs: benford_distribution(),
            benford_probs: benford_distribution(),
            chi_stat: 0.0,
            p_value: 1.0,
            total_count: 10,
        };
        let rendered = benford_table(&analysis).to_string();
        assert!(rendered.contains("30.10%"));
        assert!(rendered.contains("4.58%"));
        assert_eq!(benford_table(&analysis).row_iter().count(), 9);

        let verdict = benford_verdict_table(&analysis).to_string();
        assert!(verdict.contains("Consistent"));
    }

    #[test]
    fn test_anomaly_table_sorts_by_score() {
        let records: Vec<serde_json::Map<String, Value>> = vec![
            json!({"Amount": 10.0, "Anomaly": -1, "Anomaly_Score": -0.01}),
            json!({"Amount": null, "Anomaly": -1, "Anomaly_Score": -0.2}),
        ]
        .into_iter()
        .filter_map(|v| v.as_object().cloned())
        .collect();

        let rendered = anomaly_table(&records).to_string();
        let first = rendered.find("-0.2000").unwrap();
        let second = rendered.find("-0.0100").unwrap();
        assert!(first < second);
        assert!(rendered.contains("NaN"));
    }
}
