//! Markdown and JSON dashboard report generation.
//!
//! The Markdown report stands in for the dashboard's visual panels: the
//! distribution table carries the numbers behind a box plot, the ranking
//! is drawn with text bars, and the correlation matrix is a numeric table.

use crate::config::OutputFormat;
use crate::models::{
    AnovaOutcome, Column, ColumnStats, CorrelationMatrix, DashboardReport, DistributionSummary,
    Ranking, ReportMetadata, Selection, Site, SummaryTable,
};
use anyhow::Result;

/// Placeholder for values that cannot be computed.
const NOT_AVAILABLE: &str = "n/a";

/// Render a report in the requested format.
pub fn render(report: &DashboardReport, format: OutputFormat, bar_width: usize) -> Result<String> {
    match format {
        OutputFormat::Markdown => Ok(generate_markdown_report(report, bar_width)),
        OutputFormat::Json => generate_json_report(report),
    }
}

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &DashboardReport, bar_width: usize) -> String {
    let mut output = String::new();

    // Title
    output.push_str("# 🌞 Solar Data Comparison Dashboard\n\n");

    output.push_str(&generate_metadata_section(&report.metadata, &report.selection));

    if !report.distribution.is_empty() {
        output.push_str(&generate_distribution_section(
            &report.distribution,
            &report.selection,
        ));
    }

    output.push_str(&generate_summary_section(&report.summary));
    output.push_str(&generate_ranking_section(&report.ranking, bar_width));

    if let Some(ref correlation) = report.correlation {
        output.push_str(&generate_correlation_section(correlation));
    }

    output.push_str(&generate_anova_section(&report.anova, report.metadata.alpha));

    // Footer
    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata, selection: &Selection) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    if !metadata.sources.is_empty() {
        section.push_str("- **Sources:**\n");
        for source in &metadata.sources {
            section.push_str(&format!("  - `{}`\n", source));
        }
    }
    section.push_str(&format!("- **Sites:** {}\n", selection.sites_label()));
    section.push_str(&format!("- **Metric:** {}\n", selection.metric));
    section.push_str(&format!("- **Date Range:** {}\n", selection.range));
    section.push_str(&format!(
        "- **Rows:** {} of {}\n",
        metadata.filtered_rows, metadata.total_rows
    ));
    section.push('\n');

    section
}

/// Generate the per-site distribution table (the box-plot data).
fn generate_distribution_section(
    distribution: &[DistributionSummary],
    selection: &Selection,
) -> String {
    let mut section = String::new();

    section.push_str(&format!("## {} Distribution by Site\n\n", selection.metric));
    section.push_str("| Site | Count | Min | Q1 | Median | Q3 | Max |\n");
    section.push_str("|:---|:---:|---:|---:|---:|---:|---:|\n");

    for d in distribution {
        section.push_str(&format!(
            "| {} {} | {} | {:.2} | {:.2} | {:.2} | {:.2} | {:.2} |\n",
            d.site.flag(),
            d.site,
            d.count,
            d.min,
            d.q1,
            d.median,
            d.q3,
            d.max
        ));
    }
    section.push('\n');

    section
}

/// Generate the summary statistics table.
fn generate_summary_section(summary: &SummaryTable) -> String {
    let mut section = String::new();

    section.push_str("## Summary Statistics\n\n");

    if summary.is_empty() {
        section.push_str("No data for the current selection.\n\n");
        return section;
    }

    section.push_str("| Site |");
    for column in Column::IRRADIANCE {
        section.push_str(&format!(" {0} mean | {0} median | {0} std |", column));
    }
    section.push_str("\n|:---|");
    for _ in 0..Column::IRRADIANCE.len() * 3 {
        section.push_str("---:|");
    }
    section.push('\n');

    for site in Site::ALL {
        let Some(row) = summary.get(site) else {
            continue;
        };
        section.push_str(&format!("| {} |", site));
        for column in Column::IRRADIANCE {
            if let Some(stats) = row.stats(column) {
                section.push_str(&format!(" {} |", format_stats(stats)));
            }
        }
        section.push('\n');
    }
    section.push('\n');

    section
}

fn format_stats(stats: &ColumnStats) -> String {
    [stats.mean, stats.median, stats.std]
        .iter()
        .map(|v| format_value(*v))
        .collect::<Vec<_>>()
        .join(" | ")
}

fn format_value(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.2}", v),
        None => NOT_AVAILABLE.to_string(),
    }
}

/// Generate the ranking section with proportional text bars.
fn generate_ranking_section(ranking: &Ranking, bar_width: usize) -> String {
    let mut section = String::new();

    section.push_str(&format!("## Average {} Ranking\n\n", ranking.column));

    if ranking.is_empty() {
        section.push_str("No data for the current selection.\n\n");
        return section;
    }

    let max = ranking
        .entries
        .iter()
        .filter_map(|e| e.mean)
        .fold(0.0_f64, f64::max);

    section.push_str("```\n");
    for (i, entry) in ranking.entries.iter().enumerate() {
        let bar = match entry.mean {
            Some(mean) if max > 0.0 && mean > 0.0 => {
                "█".repeat(((mean / max) * bar_width as f64).round() as usize)
            }
            _ => String::new(),
        };
        section.push_str(&format!(
            "{}. {:<13} {:>9} {}\n",
            i + 1,
            entry.site.label(),
            format_value(entry.mean),
            bar
        ));
    }
    section.push_str("```\n\n");

    section
}

/// Generate the correlation matrix table.
fn generate_correlation_section(matrix: &CorrelationMatrix) -> String {
    let mut section = String::new();

    section.push_str("## Correlation Matrix\n\n");
    section.push_str(&format!(
        "*Pearson coefficients over {} complete rows.*\n\n",
        matrix.complete_rows
    ));

    section.push('|');
    section.push_str(" |");
    for column in &matrix.columns {
        section.push_str(&format!(" {} |", column));
    }
    section.push('\n');

    section.push_str("|:---|");
    for _ in &matrix.columns {
        section.push_str("---:|");
    }
    section.push('\n');

    for row in &matrix.columns {
        section.push_str(&format!("| **{}** |", row));
        for column in &matrix.columns {
            section.push_str(&format!(" {} |", format_value(matrix.get(*row, *column))));
        }
        section.push('\n');
    }
    section.push('\n');

    section
}

/// Generate the ANOVA section.
fn generate_anova_section(anova: &AnovaOutcome, alpha: f64) -> String {
    let mut section = String::new();

    section.push_str("## ANOVA (GHI)\n\n");

    match anova {
        AnovaOutcome::Computed(result) => {
            section.push_str(&format!("**ANOVA p-value (GHI):** `{:.4}`\n\n", result.p_value));
            section.push_str(&format!(
                "- F({}, {}) = {:.3}\n",
                result.df_between, result.df_within, result.f_statistic
            ));
            let verdict = if result.p_value < alpha {
                "significant"
            } else {
                "not significant"
            };
            section.push_str(&format!(
                "- Difference in mean GHI across sites is **{}** at α = {}\n\n",
                verdict, alpha
            ));
        }
        AnovaOutcome::Unavailable { reason } => {
            section.push_str(&format!("ANOVA p-value: not available ({})\n\n", reason));
        }
        AnovaOutcome::Skipped => {
            section.push_str("Skipped: select all three sites to run the test.\n\n");
        }
    }

    section
}

/// Generate the report footer.
fn generate_footer() -> String {
    "---\n\n*Report generated by solardash*\n".to_string()
}

/// Generate a JSON report.
pub fn generate_json_report(report: &DashboardReport) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        AnovaResult, DateRange, Metric, RankEntry, SiteSummary,
    };
    use chrono::{NaiveDate, Utc};

    fn create_test_report() -> DashboardReport {
        let day = NaiveDate::from_ymd_opt(2021, 8, 9).unwrap();
        let stats = |mean| ColumnStats {
            mean: Some(mean),
            median: Some(mean),
            std: Some(1.5),
        };

        DashboardReport {
            metadata: ReportMetadata {
                generated_at: Utc::now(),
                sources: vec!["data/benin_clean.csv (Benin)".to_string()],
                total_rows: 30,
                filtered_rows: 20,
                alpha: 0.05,
            },
            selection: Selection {
                sites: [Site::Benin, Site::Togo].into_iter().collect(),
                metric: Metric::Dni,
                range: DateRange::new(day, day),
            },
            distribution: vec![DistributionSummary {
                site: Site::Benin,
                count: 10,
                min: 340.0,
                q1: 345.0,
                median: 350.0,
                q3: 355.0,
                max: 360.0,
            }],
            summary: SummaryTable {
                rows: vec![SiteSummary {
                    site: Site::Benin,
                    count: 10,
                    ghi: stats(500.0),
                    dni: stats(350.0),
                    dhi: ColumnStats::default(),
                }],
            },
            ranking: Ranking {
                column: Column::Ghi,
                entries: vec![
                    RankEntry {
                        site: Site::Benin,
                        mean: Some(500.0),
                        count: 10,
                    },
                    RankEntry {
                        site: Site::Togo,
                        mean: Some(250.0),
                        count: 10,
                    },
                ],
            },
            correlation: Some(CorrelationMatrix {
                columns: vec![Column::Ghi, Column::Dni],
                values: vec![vec![Some(1.0), Some(0.87)], vec![Some(0.87), Some(1.0)]],
                complete_rows: 20,
            }),
            anova: AnovaOutcome::Skipped,
        }
    }

    #[test]
    fn test_generate_markdown_report() {
        let report = create_test_report();
        let markdown = generate_markdown_report(&report, 10);

        assert!(markdown.contains("# 🌞 Solar Data Comparison Dashboard"));
        assert!(markdown.contains("## Metadata"));
        assert!(markdown.contains("## DNI Distribution by Site"));
        assert!(markdown.contains("## Summary Statistics"));
        assert!(markdown.contains("## Average GHI Ranking"));
        assert!(markdown.contains("## Correlation Matrix"));
        assert!(markdown.contains("**Rows:** 20 of 30"));
        assert!(markdown.contains("Skipped"));
    }

    #[test]
    fn test_summary_row_formatting() {
        let report = create_test_report();
        let section = generate_summary_section(&report.summary);

        assert!(section.contains(
            "| Benin | 500.00 | 500.00 | 1.50 | 350.00 | 350.00 | 1.50 | n/a | n/a | n/a |"
        ));
    }

    #[test]
    fn test_empty_summary_says_no_data() {
        let section = generate_summary_section(&SummaryTable::default());
        assert!(section.contains("No data"));
    }

    #[test]
    fn test_ranking_bars_scale_to_width() {
        let report = create_test_report();
        let section = generate_ranking_section(&report.ranking, 10);

        let lines: Vec<&str> = section.lines().collect();
        assert!(lines[3].starts_with("1. Benin"));
        assert_eq!(lines[3].matches('█').count(), 10);
        assert!(lines[4].starts_with("2. Togo"));
        assert_eq!(lines[4].matches('█').count(), 5);
    }

    #[test]
    fn test_correlation_table() {
        let report = create_test_report();
        let section = generate_correlation_section(report.correlation.as_ref().unwrap());

        assert!(section.contains("| | GHI | DNI |"));
        assert!(section.contains("| **GHI** | 1.00 | 0.87 |"));
        assert!(section.contains("20 complete rows"));
    }

    #[test]
    fn test_anova_sections() {
        let computed = AnovaOutcome::Computed(AnovaResult {
            f_statistic: 123.456,
            p_value: 0.00012,
            df_between: 2,
            df_within: 27,
        });
        let section = generate_anova_section(&computed, 0.05);
        assert!(section.contains("`0.0001`"));
        assert!(section.contains("F(2, 27) = 123.456"));
        assert!(section.contains("**significant**"));

        let unavailable = AnovaOutcome::Unavailable {
            reason: "expected 3 site groups, found 0".to_string(),
        };
        let section = generate_anova_section(&unavailable, 0.05);
        assert!(section.contains("not available"));
        assert!(section.contains("found 0"));
    }

    #[test]
    fn test_generate_json_report() {
        let report = create_test_report();
        let json = generate_json_report(&report).unwrap();

        assert!(json.contains("\"metadata\""));
        assert!(json.contains("\"ranking\""));
        assert!(json.contains("\"sierra-leone\"") || json.contains("\"benin\""));
        assert!(json.contains("\"status\": \"skipped\""));

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["metadata"]["filtered_rows"], 20);
        assert_eq!(value["summary"]["rows"][0]["ghi"]["mean"], 500.0);
    }

    #[test]
    fn test_render_dispatches_on_format() {
        let report = create_test_report();
        assert!(render(&report, OutputFormat::Markdown, 10)
            .unwrap()
            .starts_with("# "));
        assert!(render(&report, OutputFormat::Json, 10)
            .unwrap()
            .starts_with('{'));
    }
}
