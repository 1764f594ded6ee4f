use chrono::{Datelike, NaiveDateTime};
use serde::Serialize;
use std::sync::Arc;

use crate::engine::QueryEngine;
use crate::error::{DashboardError, Result};
use crate::executor::Executor;
use crate::queries::{QueryBuilder, YearRange};
use crate::shaping::{humanize_column, optional_delta};
use crate::table::{Table, Value};

/// Observed time span of the whole dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetStats {
    pub query: String,
    pub min_opened_date: NaiveDateTime,
    pub max_opened_date: NaiveDateTime,
}

impl DatasetStats {
    /// Years that can be selected: the first partition year through the year of the latest
    /// changeset.
    pub fn year_range(&self) -> YearRange {
        YearRange::up_to(self.max_opened_date.year())
    }
}

/// Aggregate counts for one partition year. Every field is absent when there is no such year to
/// report on, e.g. the year before the first partition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatsForYear {
    pub query: Option<String>,
    pub changeset_count: Option<i64>,
    pub unique_user_count: Option<i64>,
    pub object_change_count: Option<i64>,
    pub comment_count: Option<i64>,
}

impl StatsForYear {
    pub fn absent() -> Self {
        Self::default()
    }

    pub fn is_absent(&self) -> bool {
        self.query.is_none()
    }
}

/// A selected year's stats next to the year before it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct YearComparison {
    pub year: i32,
    pub previous_year: Option<i32>,
    pub current: StatsForYear,
    pub previous: StatsForYear,
}

/// Signed changes against the previous year, absent at the lower bound.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatsDeltas {
    pub changesets: Option<String>,
    pub unique_users: Option<String>,
    pub object_changes: Option<String>,
    pub comments: Option<String>,
}

impl YearComparison {
    pub fn deltas(&self) -> StatsDeltas {
        let (current, previous) = (&self.current, &self.previous);
        StatsDeltas {
            changesets: optional_delta(current.changeset_count, previous.changeset_count),
            unique_users: optional_delta(current.unique_user_count, previous.unique_user_count),
            object_changes: optional_delta(
                current.object_change_count,
                previous.object_change_count,
            ),
            comments: optional_delta(current.comment_count, previous.comment_count),
        }
    }
}

/// Any multi-row view together with the query that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TabularResult {
    pub query: String,
    pub table: Arc<Table>,
}

impl TabularResult {
    /// Column labels for display. The table itself keeps the engine's names.
    pub fn display_columns(&self) -> Vec<String> {
        self.table
            .columns
            .iter()
            .map(|c| humanize_column(c))
            .collect()
    }
}

fn count_at(row: &[Value], index: usize, column: &str) -> Result<Option<i64>> {
    match row.get(index) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_i64()
            .map(Some)
            .ok_or_else(|| DashboardError::UnexpectedValue {
                column: column.to_string(),
                value: format!("{value:?}"),
            }),
    }
}

fn timestamp_at(row: &[Value], index: usize, column: &str) -> Result<NaiveDateTime> {
    let value = row.get(index).unwrap_or(&Value::Null);
    value
        .as_timestamp()
        .ok_or_else(|| DashboardError::UnexpectedValue {
            column: column.to_string(),
            value: format!("{value:?}"),
        })
}

pub fn dataset_stats<E: QueryEngine>(
    executor: &Executor<E>,
    builder: &QueryBuilder,
) -> Result<DatasetStats> {
    let query = builder.build_range_query();
    let row = executor.execute_scalar(&query)?;
    Ok(DatasetStats {
        min_opened_date: timestamp_at(&row, 0, "start_range")?,
        max_opened_date: timestamp_at(&row, 1, "end_range")?,
        query,
    })
}

pub fn year_stats<E: QueryEngine>(
    executor: &Executor<E>,
    builder: &QueryBuilder,
    year: i32,
) -> Result<StatsForYear> {
    let query = builder.build_year_stats_query(year)?;
    let row = executor.execute_scalar(&query)?;
    Ok(StatsForYear {
        changeset_count: count_at(&row, 0, "number_of_changesets")?,
        unique_user_count: count_at(&row, 1, "number_of_unique_users")?,
        object_change_count: count_at(&row, 2, "number_of_object_changes")?,
        comment_count: count_at(&row, 3, "number_of_comments")?,
        query: Some(query),
    })
}

/// Stats for `year` and the year before it. Both are fetched in parallel; the previous side is
/// absent for the first year in range.
pub fn compare_with_previous_year<E: QueryEngine>(
    executor: &Executor<E>,
    builder: &QueryBuilder,
    year: i32,
) -> Result<YearComparison> {
    let previous_year = builder.years().previous(year);
    let (current, previous) = rayon::join(
        || year_stats(executor, builder, year),
        || match previous_year {
            Some(previous_year) => year_stats(executor, builder, previous_year),
            None => Ok(StatsForYear::absent()),
        },
    );
    Ok(YearComparison {
        year,
        previous_year,
        current: current?,
        previous: previous?,
    })
}

pub fn tabular<E: QueryEngine>(executor: &Executor<E>, query: String) -> Result<TabularResult> {
    let table = executor.execute_table(&query)?;
    Ok(TabularResult { query, table })
}
