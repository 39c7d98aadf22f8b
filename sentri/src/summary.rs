// sentri/src/summary.rs
//
// Terminal tables for `run` and `validate`.

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use sentri_core::domain::checks::{CheckStatus, ResultRecord};
use sentri_core::domain::report::AggregatedResults;

pub fn print_run_summary(results: &AggregatedResults) {
    let s = &results.summary;
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Total"),
        header_cell("Passed"),
        header_cell("Warnings"),
        header_cell("Failed"),
        header_cell("Errors"),
        header_cell("Pass rate"),
    ]);
    apply_summary_table_style(&mut table);
    table.add_row(vec![
        Cell::new(s.total).add_attribute(Attribute::Bold),
        count_cell(s.passed, Color::Green),
        count_cell(s.warnings, Color::Yellow),
        count_cell(s.failed, Color::Red),
        count_cell(s.errors, Color::Magenta),
        Cell::new(format!("{:.1}%", s.pass_rate)),
    ]);
    println!("{table}");

    let flagged: Vec<&ResultRecord> = results
        .results
        .iter()
        .filter(|r| r.status != CheckStatus::Pass)
        .collect();
    if flagged.is_empty() {
        return;
    }

    let mut detail = Table::new();
    detail.set_header(vec![
        header_cell("Check"),
        header_cell("Column"),
        header_cell("Date"),
        header_cell("Metric"),
        header_cell("Limit"),
        header_cell("Status"),
    ]);
    apply_detail_table_style(&mut detail);
    for record in flagged {
        detail.add_row(vec![
            Cell::new(&record.check_type),
            Cell::new(target_label(record)),
            dim_cell(&record.date),
            Cell::new(metric_label(record.metric_value)),
            limit_cell(record),
            status_cell(record.status),
        ]);
    }
    align_column(&mut detail, 3, CellAlignment::Right);
    align_column(&mut detail, 4, CellAlignment::Right);
    println!("{detail}");
}

/// One row per configured column, as `validate` reports it.
pub fn print_check_plan(entries: &[(String, serde_yaml::Value)]) {
    let mut table = Table::new();
    table.set_header(vec![header_cell("Check"), header_cell("Column")]);
    apply_detail_table_style(&mut table);
    for (check_type, config) in entries {
        let columns: Vec<String> = config
            .as_mapping()
            .map(|m| m.keys().filter_map(|k| k.as_str().map(str::to_string)).collect())
            .unwrap_or_default();
        if columns.is_empty() {
            table.add_row(vec![Cell::new(check_type), dim_cell("-")]);
        }
        for column in columns {
            table.add_row(vec![Cell::new(check_type), Cell::new(column)]);
        }
    }
    println!("{table}");
}

fn target_label(record: &ResultRecord) -> String {
    match (&record.column, &record.measure) {
        (Some(c), Some(m)) => format!("{c} ({m})"),
        (Some(c), None) => c.clone(),
        (None, _) => "-".to_string(),
    }
}

fn metric_label(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.4}"))
}

fn limit_cell(record: &ResultRecord) -> Cell {
    match &record.exceeded_threshold {
        Some(limit) => Cell::new(limit.to_string()),
        None => dim_cell("-"),
    }
}

fn status_cell(status: CheckStatus) -> Cell {
    let color = match status {
        CheckStatus::Pass => Color::Green,
        CheckStatus::Warning => Color::Yellow,
        CheckStatus::Fail => Color::Red,
        CheckStatus::Error => Color::Magenta,
    };
    Cell::new(status.as_str())
        .fg(color)
        .add_attribute(Attribute::Bold)
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
    }
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
}

fn apply_detail_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
