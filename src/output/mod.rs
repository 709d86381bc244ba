pub mod formatter;

pub use formatter::{
    format_json, format_points, format_summary, format_tsv, render, should_use_colors,
    status_marker, ReportOptions, SummaryRow,
};
