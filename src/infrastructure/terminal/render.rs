use crate::application::services::stats_aggregator::TrendState;
use crate::application::snapshot::{DashboardSnapshot, ListSnapshot, NavSelection};
use crate::domain::entities::CallCounter;
use std::fmt::Write;

/// Plain-text rendering of one snapshot
pub fn render(snapshot: &DashboardSnapshot) -> String {
    let mut out = String::new();

    if snapshot.nav != NavSelection::Dashboard {
        let _ = writeln!(out, "Left dashboard for {}", snapshot.nav.as_str());
        return out;
    }

    let _ = writeln!(out, "== Key Dashboard == (refresh #{})", snapshot.refresh_cycles);

    match &snapshot.stats {
        Some(stats) => {
            let _ = writeln!(
                out,
                "Calls  1m: {}  1h: {}  24h: {}  month: {}",
                counter(&stats.calls_1m),
                counter(&stats.calls_1h),
                counter(&stats.calls_24h),
                counter(&stats.calls_month)
            );
        }
        None => {
            let _ = writeln!(out, "Calls  loading...");
        }
    }
    if let Some(error) = &snapshot.stats_error {
        let _ = writeln!(out, "  ! {}", error);
    }

    let _ = writeln!(
        out,
        "Keys   total: {}  valid: {}  invalid: {}",
        snapshot.counts.total, snapshot.counts.valid, snapshot.counts.invalid
    );

    let _ = write!(out, "Trend ({}): ", snapshot.trend.range);
    match &snapshot.trend.state {
        TrendState::Loading => {
            let _ = writeln!(out, "loading...");
        }
        TrendState::Empty => {
            let _ = writeln!(out, "no data");
        }
        TrendState::Ready(points) => {
            let buckets: Vec<String> = points
                .iter()
                .map(|p| format!("{} +{}/-{}", p.time, p.success, p.failure))
                .collect();
            let _ = writeln!(out, "{}", buckets.join(", "));
        }
    }
    if let Some(error) = &snapshot.trend.error {
        let _ = writeln!(out, "  ! {}", error);
    }

    let noteworthy = &snapshot.noteworthy;
    let _ = writeln!(
        out,
        "Noteworthy (status {}, limit {}): {}",
        noteworthy.status_code,
        noteworthy.limit,
        if noteworthy.loaded { noteworthy.entries.len().to_string() } else { "loading...".to_string() }
    );
    for entry in &noteworthy.entries {
        let status = entry
            .error_status
            .clone()
            .or_else(|| entry.error_code.map(|code| code.to_string()))
            .unwrap_or_default();
        let _ = writeln!(out, "  {} ({} failures) {}", entry.key, entry.failure_count, status);
    }
    if let Some(error) = &noteworthy.error {
        let _ = writeln!(out, "  ! {}", error);
    }

    render_list(&mut out, &snapshot.valid);
    render_list(&mut out, &snapshot.invalid);

    if let Some(notice) = &snapshot.notice {
        let _ = writeln!(out, "> {}", notice);
    }
    out
}

fn counter(counter: &CallCounter) -> String {
    match (counter.success, counter.failure) {
        (Some(success), Some(failure)) => format!("{} ({} ok, {} failed)", counter.total, success, failure),
        _ => counter.total.to_string(),
    }
}

fn render_list(out: &mut String, list: &ListSnapshot) {
    let _ = write!(out, "{} keys - {}", capitalize(list.kind.as_str()), list.page_label());
    if !list.search.is_empty() {
        let _ = write!(out, " [search: {:?}]", list.search);
    }
    if list.search_input != list.search {
        let _ = write!(out, " [typing: {:?}]", list.search_input);
    }
    if list.selected_count > 0 {
        let _ = write!(out, " ({} selected)", list.selected_count);
    }
    if list.loading {
        let _ = write!(out, " loading...");
    }
    let _ = writeln!(out);

    if list.loaded && list.rows.is_empty() {
        let _ = writeln!(out, "  (no keys)");
    }
    for row in &list.rows {
        let mark = if row.selected { "[x]" } else { "[ ]" };
        let _ = writeln!(out, "  {} {} (failures: {})", mark, row.key, row.failure_count);
    }
    if let Some(error) = &list.error {
        let _ = writeln!(out, "  ! {}", error);
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
