//! Table formatting helpers for CLI output.

use certo_core::result::Results;
use comfy_table::{ContentArrangement, Table};

/// Create a styled table with the given headers.
pub fn new_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.load_preset(comfy_table::presets::NOTHING);
    table.set_header(headers);
    table
}

/// Render a run's outcomes as a table: one row per check, in outcome order.
pub fn results_table(results: &Results) -> Table {
    let mut table = new_table(&["CHECK", "OUTCOME", "TIME"]);
    for result in &results.passed {
        table.add_row(vec![
            result.name().to_string(),
            "passed".to_string(),
            format_elapsed(result.elapsed),
        ]);
    }
    for result in &results.failed {
        table.add_row(vec![
            result.name().to_string(),
            "failed".to_string(),
            format_elapsed(result.elapsed),
        ]);
    }
    for result in &results.errored {
        table.add_row(vec![
            result.name().to_string(),
            "errored".to_string(),
            format_elapsed(result.elapsed),
        ]);
    }
    table
}

/// Format an elapsed duration as a short human-readable string.
pub fn format_elapsed(elapsed: std::time::Duration) -> String {
    let millis = elapsed.as_millis();
    if millis >= 10_000 {
        format!("{:.1}s", elapsed.as_secs_f64())
    } else {
        format!("{}ms", millis)
    }
}
