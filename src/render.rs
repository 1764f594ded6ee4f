use anyhow::Result;

use crate::dashboard::DashboardReport;
use crate::shaping::{format_cell, format_number};
use crate::stats::TabularResult;

const BAR_WIDTH: usize = 40;

#[derive(Debug, Clone, Copy, Default)]
pub struct RenderOptions {
    pub show_queries: bool,
}

fn print_query(query: Option<&str>, options: RenderOptions) {
    if let (true, Some(query)) = (options.show_queries, query) {
        println!("\n```sql\n{}\n```", query);
    }
}

fn metric(label: &str, value: Option<i64>, delta: Option<&str>) -> String {
    let value = value.map(format_number).unwrap_or_else(|| "n/a".to_string());
    match delta {
        Some(delta) => format!("- {}: {} ({})", label, value, delta),
        None => format!("- {}: {}", label, value),
    }
}

/// Lays a result out as left-aligned text columns under humanized headers.
pub fn format_table(result: &TabularResult) -> String {
    let headers = result.display_columns();
    // Years read better without a thousands separator.
    let year_column = result.table.column_index("year");
    let cells: Vec<Vec<String>> = result
        .table
        .rows
        .iter()
        .map(|row| {
            row.iter()
                .enumerate()
                .map(|(index, value)| {
                    if Some(index) == year_column {
                        value.to_string()
                    } else {
                        format_cell(value)
                    }
                })
                .collect()
        })
        .collect();

    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let line = |values: &[String]| {
        values
            .iter()
            .zip(&widths)
            .map(|(value, width)| format!("{:<width$}", value, width = *width))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = vec![line(headers.as_slice())];
    out.push(
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("  "),
    );
    out.extend(cells.iter().map(|row| line(row.as_slice())));
    out.join("\n")
}

/// One bar per year scaled to the largest value of `column`.
pub fn format_trend(result: &TabularResult, column: &str) -> String {
    let table = &result.table;
    let (Some(years), Some(values)) = (table.column("year"), table.column(column)) else {
        return String::new();
    };
    let values: Vec<i64> = values.iter().map(|v| v.as_i64().unwrap_or(0)).collect();
    let max = values.iter().copied().max().unwrap_or(0).max(1);

    years
        .iter()
        .zip(&values)
        .map(|(year, value)| {
            let len = ((*value).max(0) as f64 / max as f64 * BAR_WIDTH as f64).round() as usize;
            format!("{} | {:<width$} {}", year, "#".repeat(len), format_number(*value), width = BAR_WIDTH)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn print_section(title: &str, result: &TabularResult, options: RenderOptions) {
    println!("\n### {}", title);
    print_query(Some(&result.query), options);
    println!("{}", format_table(result));
}

pub fn print_report(report: &DashboardReport, options: RenderOptions) {
    println!("\n--- OpenStreetMap changesets ---");
    print_query(Some(&report.dataset.query), options);
    println!(
        "Minimum changeset opening datetime: {}",
        report.dataset.min_opened_date.format("%Y-%m-%dT%H:%M:%S")
    );
    println!(
        "Maximum changeset opening datetime: {}",
        report.dataset.max_opened_date.format("%Y-%m-%dT%H:%M:%S")
    );
    println!(
        "Years available: {} to {}",
        report.years.first, report.years.last
    );

    let current = &report.comparison.current;
    let deltas = &report.deltas;
    println!("\n## In {} there were:", report.selected_year);
    if let Some(previous_year) = report.comparison.previous_year {
        println!("(changes relative to {})", previous_year);
    }
    print_query(current.query.as_deref(), options);
    println!("{}", metric("Changesets open", current.changeset_count, deltas.changesets.as_deref()));
    println!(
        "{}",
        metric(
            "Unique users who opened a changeset",
            current.unique_user_count,
            deltas.unique_users.as_deref()
        )
    );
    println!(
        "{}",
        metric("Objects edited", current.object_change_count, deltas.object_changes.as_deref())
    );
    println!(
        "{}",
        metric(
            "Comments in discussions under changesets",
            current.comment_count,
            deltas.comments.as_deref()
        )
    );

    print_section("Most popular editors", &report.editors, options);
    print_section("Most common locales", &report.locales, options);
    print_section(
        &format!("New vs returning users ({:?} window)", report.prior_window),
        &report.new_vs_returning,
        options,
    );

    println!("\n### Object changes per year");
    print_query(Some(&report.trend.query), options);
    println!("{}", format_trend(&report.trend, "number_of_object_changes"));
    println!("{}", format_table(&report.trend));

    print_section("Sample changesets", &report.sample, options);
}

pub fn print_json(report: &DashboardReport) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}
