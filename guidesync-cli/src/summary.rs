//! End-of-run summary: a table on the terminal or JSON with `--json`.

use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use guidesync_core::{Outcome, OutcomeTally};
use guidesync_sync::RunReport;

#[derive(Tabled)]
struct SummaryRow {
    #[tabled(rename = "outcome")]
    outcome: String,
    #[tabled(rename = "count")]
    count: u64,
}

#[derive(Serialize)]
struct SummaryJson<'a> {
    elapsed: String,
    #[serde(flatten)]
    report: &'a RunReport,
}

pub fn print(report: &RunReport, json: bool) -> Result<()> {
    if json {
        let payload = SummaryJson {
            elapsed: report.elapsed_hms(),
            report,
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&payload).context("failed to serialize run summary")?
        );
        return Ok(());
    }

    println!(
        "guidesync v{} | elapsed {} | {} results",
        env!("CARGO_PKG_VERSION"),
        report.elapsed_hms(),
        report.tally.total(),
    );
    let mut table = Table::new(rows(&report.tally));
    table.with(Style::rounded());
    println!("{table}");

    let failures = report.tally.failures();
    if failures > 0 {
        println!("{}", format!("{failures} operations failed; see the log above").red());
    }
    Ok(())
}

/// One row per outcome kind, zero counts included.
fn rows(tally: &OutcomeTally) -> Vec<SummaryRow> {
    Outcome::all()
        .iter()
        .map(|&outcome| SummaryRow {
            outcome: label(outcome, tally.count(outcome)),
            count: tally.count(outcome),
        })
        .collect()
}

fn label(outcome: Outcome, count: u64) -> String {
    let text = outcome.to_string();
    match outcome {
        _ if count == 0 => text.bright_black().to_string(),
        o if o.is_failure() => text.red().bold().to_string(),
        Outcome::Published | Outcome::Removed | Outcome::Printed => text.green().to_string(),
        _ => text.yellow().to_string(),
    }
}
