use std::collections::BTreeMap;

use colored::*;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use crate::license::classifier::classify;
use crate::models::{LicenseRisk, Outcome};

use super::{DispatchOutcome, Report, RunStats};

/// Print the colored console summary of a finished run.
pub fn render(report: &Report, dispatch: &DispatchOutcome, verbose: bool, quiet: bool) {
    let summary = &report.summary;

    if quiet {
        println!(
            "Total: {}  Allowed: {}  Violations: {}  Unknown: {}",
            summary.total,
            summary.allowed.to_string().green(),
            summary.violations.to_string().red(),
            summary.unknown.to_string().yellow(),
        );
        for failure in &dispatch.failures {
            println!("{} {}: {}", "renderer failed".red(), failure.renderer, failure.error);
        }
        return;
    }

    println!("\n {} {}", "dep-license-report".bold(), env!("CARGO_PKG_VERSION"));
    println!(" Project: {}\n", report.metadata.project);

    let is_allowed = |o: &Outcome| matches!(o, Outcome::Allowed);
    let is_violation = |o: &Outcome| o.is_violation();
    let is_unknown = |o: &Outcome| matches!(o, Outcome::Unknown);

    println!(" ┌────────────────────────────────────────────────────┐");
    println!(" │  {:<48} │", "SUMMARY".bold());
    println!(" │  {:<48} │", format!("Total dependencies : {}", summary.total));
    println!(
        " │  {:<48} │",
        format!(
            "{}  Allowed         : {:>4}  {}",
            "✓".green(),
            summary.allowed,
            top_licenses(report, is_allowed)
        )
    );
    println!(
        " │  {:<48} │",
        format!(
            "{}  Violation       : {:>4}  {}",
            "✗".red(),
            summary.violations,
            top_licenses(report, is_violation)
        )
    );
    println!(
        " │  {:<48} │",
        format!(
            "{}  Unknown         : {:>4}  {}",
            "?".yellow(),
            summary.unknown,
            top_licenses(report, is_unknown)
        )
    );
    println!(" └────────────────────────────────────────────────────┘\n");

    if summary.violations > 0 {
        println!(" {} Dependencies violating the policy:\n", "[VIOLATION]".red().bold());
        render_table(report, is_violation);
        println!();
    }

    if summary.unknown > 0 {
        println!(" {} Dependencies without a usable license:\n", "[UNKNOWN]".yellow().bold());
        render_table(report, is_unknown);
        println!();
    }

    if verbose && summary.allowed > 0 {
        println!(" {} All allowed dependencies:\n", "[ALLOWED]".green().bold());
        render_table(report, is_allowed);
        println!();
    }

    let counters = counter_lines(&report.metadata.stats);
    if !counters.is_empty() {
        println!(" {}", "Run statistics".bold());
        for line in counters {
            println!("   {line}");
        }
        println!();
    }

    if !report.metadata.warnings.is_empty() {
        println!(" {} {} warning(s):", "[WARN]".yellow().bold(), report.metadata.warnings.len());
        for warning in &report.metadata.warnings {
            println!("   - {warning}");
        }
        println!();
    }

    for artifact in &dispatch.artifacts {
        println!(
            " {} {:<15} {} ({} bytes)",
            "✓".green(),
            artifact.renderer,
            artifact.path.display(),
            artifact.bytes
        );
    }
    for failure in &dispatch.failures {
        println!(" {} {:<15} {}", "✗".red(), failure.renderer, failure.error);
    }
    if !dispatch.artifacts.is_empty() || !dispatch.failures.is_empty() {
        println!();
    }
}

fn render_table(report: &Report, select: impl Fn(&Outcome) -> bool) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Dependency").add_attribute(Attribute::Bold),
            Cell::new("Version").add_attribute(Attribute::Bold),
            Cell::new("Scope").add_attribute(Attribute::Bold),
            Cell::new("License").add_attribute(Attribute::Bold),
            Cell::new("Risk").add_attribute(Attribute::Bold),
            Cell::new("Verdict").add_attribute(Attribute::Bold),
            Cell::new("Origin").add_attribute(Attribute::Bold),
        ]);

    for verdict in report.verdicts().filter(|v| select(&v.outcome)) {
        let dep = &verdict.dependency;
        let risk = classify(&verdict.licenses);

        let (verdict_str, verdict_color) = match verdict.outcome {
            Outcome::Allowed => ("✓ allowed", Color::Green),
            Outcome::Violation { .. } => ("✗ violation", Color::Red),
            Outcome::Unknown => ("? unknown", Color::Yellow),
        };

        let risk_color = match risk {
            LicenseRisk::Permissive => Color::Green,
            LicenseRisk::WeakCopyleft => Color::Yellow,
            LicenseRisk::StrongCopyleft => Color::Red,
            LicenseRisk::Proprietary => Color::Magenta,
            LicenseRisk::Unknown => Color::DarkGrey,
        };

        table.add_row(vec![
            Cell::new(dep.coordinates()),
            Cell::new(&dep.version),
            Cell::new(&dep.scope),
            Cell::new(verdict.license_label()),
            Cell::new(risk.to_string()).fg(risk_color),
            Cell::new(verdict_str)
                .fg(verdict_color)
                .set_alignment(CellAlignment::Center),
            Cell::new(dep.origin.to_string()),
        ]);
    }

    println!("{}", table);
}

/// The three most common license labels among matching verdicts, e.g. `(MIT, Apache-2.0)`.
fn top_licenses(report: &Report, select: impl Fn(&Outcome) -> bool) -> String {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for verdict in report.verdicts().filter(|v| select(&v.outcome)) {
        *counts.entry(verdict.license_label()).or_default() += 1;
    }
    if counts.is_empty() {
        return String::new();
    }

    let mut sorted: Vec<(String, usize)> = counts.into_iter().collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    let names: Vec<String> = sorted.into_iter().take(3).map(|(name, _)| name).collect();
    format!("({})", names.join(", "))
}

/// Non-zero counters as human-readable lines.
fn counter_lines(stats: &RunStats) -> Vec<String> {
    [
        (stats.duplicates_collapsed, "duplicate rows collapsed"),
        (stats.filtered_out, "dependencies removed by filters"),
        (stats.imported_records, "records imported"),
        (stats.imported_records_skipped, "malformed import records skipped"),
        (stats.import_files_failed, "import files unreadable"),
        (stats.merged, "dependencies merged with imported records"),
        (stats.imported_only, "imported-only dependencies"),
        (stats.online_lookups, "online license lookups"),
        (stats.online_lookup_failures, "online lookups failed"),
        (stats.unresolved_licenses, "unresolved license strings"),
        (stats.rejected_aliases, "config aliases rejected"),
    ]
    .into_iter()
    .filter(|(count, _)| *count > 0)
    .map(|(count, label)| format!("{count:>5}  {label}"))
    .collect()
}
