//! Report rendering: text summary, JSON, CSV
//!
//! CSV is one row per aligned step with one column per series, suitable for
//! spreadsheets and plotting tools.

use crate::classify::MetricKey;
use crate::pipeline::{ComparisonReport, Report, RunReport};
use anyhow::{Context, Result};
use std::fmt::Write;

/// Output format for reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    #[default]
    Text,
    Json,
    Csv,
}

/// Render a report in the requested format
pub fn render(report: &Report, format: Format) -> Result<String> {
    match format {
        Format::Json => {
            serde_json::to_string_pretty(report).context("Failed to serialize report to JSON")
        }
        Format::Csv => Ok(match report {
            Report::Run(run) => run_csv(run),
            Report::Comparison(cmp) => comparison_csv(cmp),
        }),
        Format::Text => Ok(match report {
            Report::Run(run) => run_text(run),
            Report::Comparison(cmp) => comparison_text(cmp),
        }),
    }
}

/// Escape CSV field (handle commas, quotes, newlines)
fn escape_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn csv_table(header: Vec<String>, columns: &[&[f64]], steps: usize) -> String {
    let mut out = header
        .iter()
        .map(|h| escape_field(h))
        .collect::<Vec<_>>()
        .join(",");
    out.push('\n');

    for step in 0..steps {
        let mut row = vec![step.to_string()];
        row.extend(
            columns
                .iter()
                .map(|c| c.get(step).map(|v| v.to_string()).unwrap_or_default()),
        );
        out.push_str(&row.join(","));
        out.push('\n');
    }
    out
}

fn run_csv(report: &RunReport) -> String {
    let mut header = vec!["step".to_string()];
    let mut columns: Vec<&[f64]> = Vec::new();

    if let Some(time) = &report.time_axis {
        header.push(MetricKey::ELAPSED.to_string());
        columns.push(time);
    }
    for series in &report.series {
        header.push(series.key.to_string());
        columns.push(&series.values);
    }
    csv_table(header, &columns, report.steps)
}

fn comparison_csv(report: &ComparisonReport) -> String {
    let mut header = vec!["step".to_string()];
    let mut columns: Vec<&[f64]> = Vec::new();

    if let (Some(a), Some(b)) = (&report.time_axis_a, &report.time_axis_b) {
        header.push(format!("{} (A)", MetricKey::ELAPSED));
        columns.push(a);
        header.push(format!("{} (B)", MetricKey::ELAPSED));
        columns.push(b);
    }
    for ((key, a), (_, b)) in report.series_a.iter().zip(&report.series_b) {
        header.push(format!("{} (A)", key));
        columns.push(a);
        header.push(format!("{} (B)", key));
        columns.push(b);
    }
    csv_table(header, &columns, report.comparison.steps)
}

fn run_text(report: &RunReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== {} ===", report.source.display());
    if let Some(elapsed) = report.elapsed_time {
        let _ = writeln!(out, "Elapsed time: {:.6} s", elapsed);
    }
    let _ = writeln!(
        out,
        "Aligned steps: {} ({} series)\n",
        report.steps,
        report.series.len()
    );

    let _ = writeln!(
        out,
        "{:<28} {:>12} {:>12} {:>12} {:>12}",
        "series", "mean", "stddev", "min", "max"
    );
    for series in &report.series {
        let _ = writeln!(
            out,
            "{:<28} {:>12.6} {:>12.6} {:>12.6} {:>12.6}",
            series.key.to_string(),
            series.mean,
            series.summary.stddev,
            series.summary.min,
            series.summary.max
        );
    }

    for total in &report.totals {
        let _ = writeln!(
            out,
            "\nTotal average {} ({} cores): {:.6} W",
            total.family, total.cores, total.mean_of_sum
        );
    }

    if let Some(buckets) = &report.buckets {
        for b in buckets {
            let filled = b.counts.iter().filter(|&&c| c > 0).count();
            let _ = writeln!(
                out,
                "Buckets {}: {} x {} s ({} with samples)",
                b.key,
                b.means.len(),
                b.width,
                filled
            );
        }
    }

    if !report.warnings.is_empty() {
        let _ = writeln!(out, "\n{} warning(s) during extraction", report.warnings.len());
    }
    out
}

fn comparison_text(report: &ComparisonReport) -> String {
    let cmp = &report.comparison;
    let mut out = String::new();
    let _ = writeln!(out, "=== A: {} ===", report.source_a.display());
    let _ = writeln!(out, "=== B: {} ===", report.source_b.display());
    let _ = writeln!(out, "Shared steps: {}\n", cmp.steps);

    let _ = writeln!(
        out,
        "{:<28} {:>12} {:>12} {:>10} {:>10}",
        "series", "mean A", "mean B", "delta %", "p-value"
    );
    for key in &cmp.keys {
        let relative = key
            .relative_delta
            .map(|r| format!("{:+.2}", r * 100.0))
            .unwrap_or_else(|| "-".to_string());
        let pvalue = key
            .test
            .as_ref()
            .map(|t| format!("{:.4}{}", t.pvalue, if t.significant { "*" } else { "" }))
            .unwrap_or_else(|| "-".to_string());
        let _ = writeln!(
            out,
            "{:<28} {:>12.6} {:>12.6} {:>10} {:>10}",
            key.key.to_string(),
            key.mean_a,
            key.mean_b,
            relative,
            pvalue
        );
    }

    for total in &cmp.totals {
        let _ = writeln!(
            out,
            "\nTotal average {} ({} cores): A {:.6} W, B {:.6} W",
            total.family, total.cores, total.total_a, total.total_b
        );
    }

    let skipped = cmp.warnings.len();
    if skipped > 0 {
        let _ = writeln!(out, "\n{} series skipped (not in both runs)", skipped);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::pipeline::{Pipeline, Selection};

    const DUMP: &str = "\
simSeconds 0.002
system.cpu_cluster.cpus0.ipc 0.5
system.cpu_cluster.cpus0.power_model.dynamicPower 1.5
simSeconds 0.004
system.cpu_cluster.cpus0.ipc 0.7
system.cpu_cluster.cpus0.power_model.dynamicPower 2.5
";

    fn run_report() -> Report {
        let pipeline = Pipeline::new(Config::default()).unwrap();
        let source = pipeline.ingest_str("dump.txt", DUMP);
        Report::Run(pipeline.analyze(&source, &Selection::default()).unwrap())
    }

    #[test]
    fn test_escape_field() {
        assert_eq!(escape_field("plain"), "plain");
        assert_eq!(escape_field("a,b"), "\"a,b\"");
        assert_eq!(escape_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_run_csv() {
        let csv = render(&run_report(), Format::Csv).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "step,elapsed-time,cpu0.ipc,cpu0.dynamic-power");
        assert_eq!(lines[1], "0,0.002,0.5,1.5");
        assert_eq!(lines[2], "1,0.004,0.7,2.5");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_run_json() {
        let json = render(&run_report(), Format::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["mode"], "run");
        assert_eq!(value["steps"], 2);
        assert_eq!(value["series"][0]["key"], "cpu0.ipc");
        assert_eq!(value["totals"][0]["family"], "dynamic-power");
    }

    #[test]
    fn test_comparison_csv_time_columns() {
        let pipeline = Pipeline::new(Config::default()).unwrap();
        let a = pipeline.ingest_str("a.txt", DUMP);
        let b = pipeline.ingest_str("b.txt", &DUMP.replace("0.002", "0.003"));
        let selection = Selection {
            families: vec![crate::classify::Family::DynamicPower],
            ..Selection::default()
        };
        let report = Report::Comparison(pipeline.compare(&a, &b, &selection).unwrap());

        let csv = render(&report, Format::Csv).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(
            lines[0],
            "step,elapsed-time (A),elapsed-time (B),cpu0.dynamic-power (A),cpu0.dynamic-power (B)"
        );
        assert_eq!(lines[1], "0,0.002,0.003,1.5,1.5");
        assert_eq!(lines[2], "1,0.004,0.004,2.5,2.5");
    }

    #[test]
    fn test_run_text() {
        let text = render(&run_report(), Format::Text).unwrap();
        assert!(text.contains("Aligned steps: 2"));
        assert!(text.contains("Total average dynamic-power (1 cores): 2.000000 W"));
    }
}
