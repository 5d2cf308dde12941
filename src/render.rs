use std::fmt::Write;

use crate::types::{OptimizationResult, SearchResult};

/// Two-decimal percentage, e.g. `93.42%`.
pub fn format_percent(value: f64) -> String {
    format!("{:.2}%", value)
}

fn plural(n: u64) -> &'static str {
    if n == 1 { "" } else { "s" }
}

/// Per-pattern table followed by the run totals.
pub fn render_plan(result: &OptimizationResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Stock length: {} mm", result.stock_length);
    let _ = writeln!(
        out,
        "Patterns: {}, stock used: {}",
        result.pattern_count(),
        result.total_stock_used
    );
    out.push('\n');

    for (i, entry) in result.cutting_plan.iter().enumerate() {
        let _ = writeln!(out, "Pattern {}: {}", i + 1, entry.pattern);
        let _ = writeln!(
            out,
            "  x{}  utilization {}  waste {} mm",
            entry.repeat_count,
            format_percent(entry.utilization),
            entry.waste
        );
    }
    out.push('\n');

    let _ = writeln!(
        out,
        "Summary: {} unit{} used, {} utilization, {} mm waste",
        result.total_stock_used,
        plural(result.total_stock_used),
        format_percent(result.total_utilization),
        result.total_waste
    );
    out
}

/// Ranking table of the first `top` candidates, then the best candidate's plan.
pub fn render_search(results: &[SearchResult], top: usize) -> String {
    let Some(best) = results.first() else {
        return String::new();
    };

    let mut out = String::new();
    let _ = writeln!(out, "Best stock length: {} mm", best.stock_length);
    out.push('\n');
    let _ = writeln!(
        out,
        "{:>4}  {:>10}  {:>11}  {:>5}  {:>10}",
        "Rank", "Length mm", "Utilization", "Units", "Waste mm"
    );
    for (i, r) in results.iter().take(top).enumerate() {
        let _ = writeln!(
            out,
            "{:>4}  {:>10}  {:>11}  {:>5}  {:>10}",
            i + 1,
            r.stock_length,
            format_percent(r.total_utilization),
            r.total_stock_used,
            r.total_waste
        );
    }
    out.push('\n');
    out.push_str(&render_plan(best));
    out
}
