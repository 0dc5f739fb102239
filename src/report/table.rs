//! Plain-text statistics table.

use crate::monitor::{Window, WindowStats};
use crate::scheduler::EndpointHandle;

use chrono::{DateTime, Utc};

const HEADERS: [&str; 10] = [
    "URL",
    "Availab. (%)",
    "Max. resp. time (ms)",
    "Min. resp. time (ms)",
    "Avg. resp. time (ms)",
    "Prop. 1** (%)",
    "Prop. 2** (%)",
    "Prop. 3** (%)",
    "Prop. 4** (%)",
    "Prop. 5** (%)",
];

/// Render the stats of every endpoint over `window` as a table.
pub async fn render_stats_table(endpoints: &[EndpointHandle], window: Window, now: DateTime<Utc>) -> String {
    let mut rows = Vec::with_capacity(endpoints.len());
    for handle in endpoints {
        rows.push(stats_row(&handle.read().await.stats(window)));
    }
    format_table(window, now, &rows)
}

fn stats_row(stats: &WindowStats) -> Vec<String> {
    let (max, min, avg) = match stats.response_times {
        Some(rt) => (format_number(rt.max), format_number(rt.min), format_number(rt.average)),
        None => ("NaN".to_string(), "NaN".to_string(), "NaN".to_string()),
    };

    let mut row = vec![stats.url.clone(), format_number(stats.availability), max, min, avg];
    row.extend(stats.distribution.as_array().iter().map(|p| format_number(*p)));
    row
}

fn format_table(window: Window, now: DateTime<Utc>, rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = HEADERS.iter().map(|h| h.len()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let separator = widths
        .iter()
        .map(|w| "-".repeat(w + 2))
        .collect::<Vec<_>>()
        .join("+");
    let separator = format!("+{}+", separator);

    let mut out = format!(
        "{} : Stats over the last {} minutes :\n",
        now.format("%d/%m/%Y, %H:%M:%S"),
        window.minutes()
    );
    out.push_str(&separator);
    out.push('\n');
    out.push_str(&format_line(HEADERS.iter().copied(), &widths));
    out.push('\n');
    out.push_str(&separator);
    out.push('\n');
    for row in rows {
        out.push_str(&format_line(row.iter().map(String::as_str), &widths));
        out.push('\n');
    }
    out.push_str(&separator);
    out
}

fn format_line<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    let cells: Vec<String> = cells
        .zip(widths)
        .map(|(cell, &width)| format!(" {:<width$} ", cell, width = width))
        .collect();
    format!("|{}|", cells.join("|"))
}

fn format_number(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else {
        format!("{:.2}", value)
    }
}
