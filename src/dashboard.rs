use anyhow::{Context, Result};
use serde::Serialize;
use std::time::Instant;
use tracing::info;

use crate::config::{DashboardOptions, Settings};
use crate::engine::{DuckDbEngine, QueryEngine};
use crate::executor::Executor;
use crate::patterns;
use crate::queries::{PriorWindow, QueryBuilder, YearRange, FIRST_YEAR};
use crate::stats::{
    compare_with_previous_year, dataset_stats, tabular, DatasetStats, StatsDeltas,
    TabularResult, YearComparison,
};

/// Everything one page of the dashboard shows for a selected year.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardReport {
    pub dataset: DatasetStats,
    pub years: YearRange,
    pub selected_year: i32,
    pub comparison: YearComparison,
    pub deltas: StatsDeltas,
    pub editors: TabularResult,
    pub locales: TabularResult,
    pub prior_window: PriorWindow,
    pub new_vs_returning: TabularResult,
    pub trend: TabularResult,
    pub sample: TabularResult,
}

/// Runs every view for one year. The dataset range query runs first and bounds every later
/// year argument.
pub fn build_dashboard<E: QueryEngine>(
    executor: &Executor<E>,
    builder: QueryBuilder,
    options: &DashboardOptions,
) -> Result<DashboardReport> {
    let start_time = Instant::now();

    let dataset = dataset_stats(executor, &builder).context("Failed to query dataset range")?;
    let years = dataset.year_range();
    let builder = builder.with_years(years);
    info!(
        action = "resolve",
        component = "dashboard",
        first_year = years.first,
        last_year = years.last,
        "Dataset year range resolved"
    );

    let selected_year = years.check(options.year.unwrap_or(years.last))?;
    let trend_start = options.trend_start.unwrap_or(years.first);
    let trend_end = options.trend_end.unwrap_or(years.last);

    let comparison = compare_with_previous_year(executor, &builder, selected_year)
        .with_context(|| format!("Failed to query stats for {selected_year}"))?;
    let deltas = comparison.deltas();

    let editors = tabular(executor, builder.build_editor_breakdown_query(selected_year)?)
        .context("Failed to query editor breakdown")?;
    let locales = tabular(executor, builder.build_locale_breakdown_query(selected_year)?)
        .context("Failed to query locale breakdown")?;
    let new_vs_returning = tabular(
        executor,
        builder.build_new_vs_returning_query(selected_year, options.prior_window)?,
    )
    .context("Failed to query new vs returning users")?;
    let trend = tabular(
        executor,
        builder.build_yearly_trend_query(trend_start, trend_end)?,
    )
    .context("Failed to query yearly trend")?;
    let sample = tabular(executor, builder.build_sample_query(selected_year)?)
        .context("Failed to query sample rows")?;

    info!(
        action = "complete",
        component = "dashboard",
        selected_year,
        cached_queries = executor.cached_queries(),
        duration_ms = start_time.elapsed().as_millis(),
        "Dashboard assembled"
    );

    Ok(DashboardReport {
        dataset,
        years,
        selected_year,
        comparison,
        deltas,
        editors,
        locales,
        prior_window: options.prior_window,
        new_vs_returning,
        trend,
        sample,
    })
}

/// Opens the engine described by `settings` and builds the report.
pub fn analyze_changesets(settings: &Settings) -> Result<DashboardReport> {
    let total_start_time = Instant::now();
    info!(action = "start", component = "analysis", "Starting changeset analysis");

    let editor_patterns = patterns::load_editor_patterns(settings.editor_patterns.as_deref())?;
    let engine = DuckDbEngine::open(&settings.engine_settings())
        .context("Failed to initialise the query engine")?;
    let executor = Executor::new(engine);
    let builder = QueryBuilder::new(
        settings.url_template.clone(),
        editor_patterns,
        YearRange::up_to(FIRST_YEAR),
    );

    let report = build_dashboard(&executor, builder, &settings.dashboard)?;

    info!(
        action = "complete",
        component = "analysis",
        duration_ms = total_start_time.elapsed().as_millis(),
        "Analysis completed successfully"
    );
    Ok(report)
}
