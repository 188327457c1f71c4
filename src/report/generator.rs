//! Report generation.
//!
//! This module renders a sampling [`Report`] as plain text, Markdown or
//! JSON.

use crate::cli::OutputFormat;
use crate::models::{Metric, MetricDistribution, Report, ReportMetadata, SampleResult, SystemReport};
use anyhow::Result;

/// Render a report in the requested format.
pub fn render(report: &Report, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(generate_text_report(report)),
        OutputFormat::Markdown => Ok(generate_markdown_report(report)),
        OutputFormat::Json => generate_json_report(report),
    }
}

/// Format an average so it always carries a decimal point.
pub fn format_average(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}

/// Generate the plain-text report.
///
/// Per-system lines come first, followed by a blank line and one
/// total/average pair per metric.
pub fn generate_text_report(report: &Report) -> String {
    let mut output = String::new();

    for system in &report.systems {
        output.push_str(&format_system_line(system));
        output.push('\n');
    }
    if !report.systems.is_empty() {
        output.push('\n');
    }

    output.push_str(&generate_summary_lines(&report.result));

    if let Some(ref distribution) = report.distribution {
        output.push('\n');
        output.push_str(&generate_distribution_text(distribution));
    }

    output
}

/// The ten summary lines, in fixed metric order.
pub fn generate_summary_lines(result: &SampleResult) -> String {
    let mut lines = String::new();

    for metric in Metric::ALL {
        lines.push_str(&format!(
            "{}: {}\n",
            metric.total_label(),
            result.totals.get(metric)
        ));
        lines.push_str(&format!(
            "{}: {}\n",
            metric.average_label(),
            format_average(result.averages.get(metric))
        ));
    }

    lines
}

/// One line describing a sampled system.
pub fn format_system_line(system: &SystemReport) -> String {
    let repos = system
        .repositories
        .iter()
        .map(|r| format!("'{}'", r))
        .collect::<Vec<_>>()
        .join(", ");
    let breakdown = system
        .unfixed_breakdown
        .iter()
        .map(|(name, count)| format!("('{}', {})", name, count))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "{}: repos=[{}], playbook_cves={}, manual_cves={}, unfixed_cves={}, unfixed_pkgs={}, total_pkgs={}, unfixed_pkgs_breakdown=[{}]",
        system.id,
        repos,
        system.counts.playbook_cves,
        system.counts.manual_cves,
        system.counts.unfixed_cves,
        system.counts.unfixed_packages,
        system.counts.total_packages,
        breakdown
    )
}

/// Distribution summary as aligned text, one block per metric.
pub fn generate_distribution_text(distribution: &[MetricDistribution]) -> String {
    let mut text = String::new();

    for d in distribution {
        text.push_str(&format!("{}:\n", d.metric));
        text.push_str(&format!("  count  {}\n", d.count));
        text.push_str(&format!("  mean   {:.6}\n", d.mean));
        match d.std {
            Some(std) => text.push_str(&format!("  std    {:.6}\n", std)),
            None => text.push_str("  std    NaN\n"),
        }
        text.push_str(&format!("  min    {}\n", d.min));
        text.push_str(&format!("  25%    {:.6}\n", d.p25));
        text.push_str(&format!("  50%    {:.6}\n", d.p50));
        text.push_str(&format!("  75%    {:.6}\n", d.p75));
        text.push_str(&format!("  max    {}\n", d.max));
    }

    text
}

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &Report) -> String {
    let mut output = String::new();

    output.push_str("# Fleet Vulnerability Sample\n\n");
    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_summary_section(&report.result));

    if let Some(ref distribution) = report.distribution {
        output.push_str(&generate_distribution_section(distribution));
    }

    if !report.systems.is_empty() {
        output.push_str(&generate_systems_section(&report.systems));
    }

    output.push_str("---\n\n");
    output.push_str("*Report generated by vulnsample*\n");

    output
}

fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Database:** `{}`\n", metadata.database));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Population:** {}\n", metadata.population));
    section.push_str(&format!(
        "- **Sample Size:** {} (requested {})\n",
        metadata.sampled, metadata.requested
    ));
    section.push_str(&format!("- **Strategy:** {}\n", metadata.strategy));
    if let Some(seed) = metadata.seed {
        section.push_str(&format!("- **Seed:** {}\n", seed));
    }
    section.push_str(&format!(
        "- **Duration:** {:.1}s\n",
        metadata.duration_seconds
    ));
    section.push('\n');

    section
}

fn generate_summary_section(result: &SampleResult) -> String {
    let mut section = String::new();

    section.push_str("## Summary\n\n");
    section.push_str("| Metric | Total | Average per System |\n");
    section.push_str("|:---|---:|---:|\n");
    for metric in Metric::ALL {
        section.push_str(&format!(
            "| {} | {} | {} |\n",
            metric,
            result.totals.get(metric),
            format_average(result.averages.get(metric))
        ));
    }
    section.push('\n');

    section
}

fn generate_distribution_section(distribution: &[MetricDistribution]) -> String {
    let mut section = String::new();

    section.push_str("## Distribution\n\n");
    section.push_str("| Metric | Mean | Std | Min | 25% | 50% | 75% | Max |\n");
    section.push_str("|:---|---:|---:|---:|---:|---:|---:|---:|\n");
    for d in distribution {
        let std = d
            .std
            .map(|s| format!("{:.2}", s))
            .unwrap_or_else(|| "-".to_string());
        section.push_str(&format!(
            "| {} | {:.2} | {} | {} | {:.2} | {:.2} | {:.2} | {} |\n",
            d.metric, d.mean, std, d.min, d.p25, d.p50, d.p75, d.max
        ));
    }
    section.push('\n');

    section
}

fn generate_systems_section(systems: &[SystemReport]) -> String {
    let mut section = String::new();

    section.push_str("## Sampled Systems\n\n");
    section.push_str("| System | Playbook | Manual | Unfixed | Unfixed Pkgs | Pkgs | Most Affected |\n");
    section.push_str("|:---|---:|---:|---:|---:|---:|:---|\n");
    for system in systems {
        let most_affected = system
            .unfixed_breakdown
            .first()
            .map(|(name, count)| format!("`{}` ({})", name, count))
            .unwrap_or_default();
        section.push_str(&format!(
            "| `{}` | {} | {} | {} | {} | {} | {} |\n",
            system.id,
            system.counts.playbook_cves,
            system.counts.manual_cves,
            system.counts.unfixed_cves,
            system.counts.unfixed_packages,
            system.counts.total_packages,
            most_affected
        ));
    }
    section.push('\n');

    section
}

/// Generate a JSON report.
pub fn generate_json_report(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MetricAverages, SystemCounts};
    use chrono::Utc;

    fn create_test_report() -> Report {
        let totals = SystemCounts {
            playbook_cves: 1,
            manual_cves: 0,
            unfixed_cves: 1,
            unfixed_packages: 1,
            total_packages: 5,
        };
        Report {
            metadata: ReportMetadata {
                database: "profiles.db".to_string(),
                generated_at: Utc::now(),
                population: 10,
                requested: 2,
                sampled: 2,
                strategy: "reservoir".to_string(),
                seed: Some(42),
                duration_seconds: 0.4,
            },
            result: SampleResult {
                sample_size: 2,
                totals,
                averages: MetricAverages {
                    playbook_cves: 0.5,
                    manual_cves: 0.0,
                    unfixed_cves: 0.5,
                    unfixed_packages: 0.5,
                    total_packages: 2.5,
                },
            },
            systems: Vec::new(),
            distribution: None,
        }
    }

    fn system() -> SystemReport {
        SystemReport {
            id: "sys-a".to_string(),
            repositories: vec!["rhel-9-baseos".to_string()],
            counts: SystemCounts {
                playbook_cves: 1,
                manual_cves: 0,
                unfixed_cves: 2,
                unfixed_packages: 1,
                total_packages: 2,
            },
            unfixed_breakdown: vec![("openssl".to_string(), 2)],
        }
    }

    #[test]
    fn test_format_average() {
        assert_eq!(format_average(2.0), "2.0");
        assert_eq!(format_average(0.0), "0.0");
        assert_eq!(format_average(2.5), "2.5");
        assert_eq!(format_average(1.0 / 3.0), "0.3333333333333333");
    }

    #[test]
    fn test_text_report_lines_in_order() {
        let text = generate_text_report(&create_test_report());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "total playbook cves: 1",
                "average playbook cves per system: 0.5",
                "total manual cves: 0",
                "average manual cves per system: 0.0",
                "total unfixed cves: 1",
                "average unfixed cves per system: 0.5",
                "total unfixed packages: 1",
                "average unfixed packages per system: 0.5",
                "total packages: 5",
                "average packages per system: 2.5",
            ]
        );
    }

    #[test]
    fn test_text_report_with_systems() {
        let mut report = create_test_report();
        report.systems.push(system());
        let text = generate_text_report(&report);
        assert!(text.starts_with("sys-a: repos=['rhel-9-baseos']"));
        assert!(text.contains("\n\ntotal playbook cves: 1\n"));
    }

    #[test]
    fn test_format_system_line() {
        assert_eq!(
            format_system_line(&system()),
            "sys-a: repos=['rhel-9-baseos'], playbook_cves=1, manual_cves=0, unfixed_cves=2, unfixed_pkgs=1, total_pkgs=2, unfixed_pkgs_breakdown=[('openssl', 2)]"
        );
    }

    #[test]
    fn test_generate_markdown_report() {
        let mut report = create_test_report();
        report.systems.push(system());
        let markdown = generate_markdown_report(&report);

        assert!(markdown.contains("# Fleet Vulnerability Sample"));
        assert!(markdown.contains("## Metadata"));
        assert!(markdown.contains("- **Seed:** 42"));
        assert!(markdown.contains("| Packages | 5 | 2.5 |"));
        assert!(markdown.contains("## Sampled Systems"));
        assert!(markdown.contains("`openssl` (2)"));
        assert!(!markdown.contains("## Distribution"));
    }

    #[test]
    fn test_generate_json_report() {
        let report = create_test_report();
        let json = render(&report, OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["metadata"]["population"], 10);
        assert_eq!(value["result"]["totals"]["total_packages"], 5);
        assert_eq!(value["result"]["averages"]["total_packages"], 2.5);
        assert!(value.get("systems").is_none());
        assert!(value.get("distribution").is_none());
    }
}
