//! Reporter: renders a [`DatasetSummary`] as human-readable text.

use crate::summary::DatasetSummary;
use std::fmt::Write;

/// Render the summary. Same input, same bytes.
pub fn render(summary: &DatasetSummary) -> String {
    let mut out = String::new();
    out.push_str("=== Dataset Report ===\n");
    let _ = writeln!(out, "Total records: {}", summary.record_count);

    if let Some(range) = &summary.time_range {
        let _ = writeln!(out, "Time range: {} -> {}", range.start, range.end);
        out.push('\n');
    }

    for column in &summary.columns {
        match column.stats {
            Some(stats) => {
                let _ = writeln!(
                    out,
                    " - {}: valid={}, min={}, max={}, mean={}",
                    column.name,
                    column.valid,
                    format_number(stats.min),
                    format_number(stats.max),
                    format_number(stats.mean),
                );
            }
            None => {
                let _ = writeln!(
                    out,
                    " - {}: valid={}, min=n/a, max=n/a, mean=n/a",
                    column.name, column.valid
                );
            }
        }
    }

    out
}

/// Shortest round-trip form of a number, with `.0` kept on integral values.
pub fn format_number(x: f64) -> String {
    if x.is_finite() && x.fract() == 0.0 && x.abs() < 1e16 {
        format!("{x:.1}")
    } else {
        format!("{x}")
    }
}
