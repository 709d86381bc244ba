use std::io::IsTerminal;

use owo_colors::OwoColorize;
use serde::Serialize;

use crate::scoring::{Encouragement, GradeResult, ScoreEntry, Status};

const RULE_WIDTH: usize = 40;

/// Check if stdout is a TTY (for auto-detecting color support)
pub fn should_use_colors() -> bool {
    std::io::stdout().is_terminal()
}

/// Rendering switches for a report.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportOptions<'a> {
    pub use_colors: bool,
    pub encouragement: Option<&'a Encouragement>,
}

/// Marker printed in front of a remark.
pub fn status_marker(status: Status) -> &'static str {
    match status {
        Status::Full => "[OK]",
        Status::Partial => "[~]",
        Status::Coaching => "[!]",
        Status::Missing => "[X]",
        Status::Bonus => "[+]",
    }
}

fn colored_marker(status: Status, use_colors: bool) -> String {
    let marker = status_marker(status);
    if !use_colors {
        return marker.to_string();
    }
    match status {
        Status::Full => marker.green().to_string(),
        Status::Partial => marker.yellow().to_string(),
        Status::Coaching => marker.cyan().to_string(),
        Status::Missing => marker.red().to_string(),
        Status::Bonus => marker.magenta().to_string(),
    }
}

/// Format points compactly: "5", "2.5", "3.33"
/// Trailing zeros are trimmed.
pub fn format_points(points: f64) -> String {
    let formatted = format!("{:.2}", points);
    formatted
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

fn format_entry(entry: &ScoreEntry, use_colors: bool) -> String {
    let marker = colored_marker(entry.status, use_colors);
    if entry.points > 0.0 {
        format!("{} {} (+{})", marker, entry.remark, format_points(entry.points))
    } else {
        format!("{} {}", marker, entry.remark)
    }
}

/// Render the report block for one graded submission.
///
/// Output depends only on the result, never on filesystem iteration order.
pub fn render(submission: &str, result: &GradeResult, options: ReportOptions<'_>) -> String {
    let heavy = "=".repeat(RULE_WIDTH);
    let light = "-".repeat(RULE_WIDTH);
    let mut lines = Vec::new();

    lines.push(heavy.clone());
    if options.use_colors {
        lines.push(format!("REPORT FOR: {}", submission.bold()));
    } else {
        lines.push(format!("REPORT FOR: {}", submission));
    }
    lines.push(heavy.clone());

    for entry in &result.entries {
        lines.push(format_entry(entry, options.use_colors));
    }

    lines.push(light.clone());
    let name_width = result
        .categories
        .iter()
        .map(|c| c.name.chars().count())
        .max()
        .unwrap_or(0);
    for category in &result.categories {
        lines.push(format!(
            "{:<width$}  {:>6.2} / {}",
            category.name,
            category.contribution,
            format_points(category.weight),
            width = name_width
        ));
    }
    if result.bonus > 0.0 {
        lines.push(format!(
            "{:<width$}  {:>6.2}",
            "Bonus",
            result.bonus,
            width = name_width
        ));
    }

    lines.push(light);
    let total = format!("TOTAL SCORE: {:.2} / 100", result.total);
    if options.use_colors {
        lines.push(total.bold().to_string());
    } else {
        lines.push(total);
    }

    if let Some(encouragement) = options.encouragement {
        if result.total >= encouragement.threshold {
            lines.push(encouragement.message.clone());
        }
    }
    lines.push(heavy);

    lines.join("\n")
}

/// One row of the batch summary.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryRow {
    pub submission: String,
    /// `None` when the submission could not be graded
    pub total: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Format the summary as `id: total` lines, in discovery order.
pub fn format_summary(rows: &[SummaryRow], use_colors: bool) -> String {
    if rows.is_empty() {
        return "No submissions found.".to_string();
    }

    let mut lines = vec!["Final Scores Summary:".to_string()];
    for row in rows {
        let value = match (row.total, row.error.as_deref()) {
            (Some(total), _) => format!("{:.2}", total),
            (None, Some(error)) => format!("ERROR ({})", error),
            (None, None) => "ERROR".to_string(),
        };
        if use_colors && row.total.is_none() {
            lines.push(format!("{}: {}", row.submission, value.red()));
        } else {
            lines.push(format!("{}: {}", row.submission, value));
        }
    }
    lines.join("\n")
}

/// Format the summary as tab-separated values for scripting
/// Columns: submission, total (empty on error), error (no headers, no colors)
pub fn format_tsv(rows: &[SummaryRow]) -> String {
    rows.iter()
        .map(|row| {
            format!(
                "{}\t{}\t{}",
                row.submission,
                row.total.map(|t| format!("{:.2}", t)).unwrap_or_default(),
                row.error.as_deref().unwrap_or("")
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format graded results as pretty JSON.
pub fn format_json(rows: &[SummaryRow], results: &[GradeResult]) -> serde_json::Result<String> {
    #[derive(Serialize)]
    struct Document<'a> {
        summary: &'a [SummaryRow],
        results: &'a [GradeResult],
    }
    serde_json::to_string_pretty(&Document {
        summary: rows,
        results,
    })
}
