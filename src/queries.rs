//! SQL text for every dashboard view.
//!
//! Builders never touch the engine. The same inputs always produce byte-identical text, which is
//! what the executor cache keys on.

use clap::ValueEnum;
use serde::Serialize;
use std::fmt::Write;

use crate::error::{DashboardError, Result};
use crate::paths::{resolve_paths, stringify, UrlTemplate, YEAR_PLACEHOLDER};
use crate::patterns::EditorPattern;

/// First year with a changeset partition.
pub const FIRST_YEAR: i32 = 2005;

pub const UNKNOWN_LABEL: &str = "<unknown>";
pub const EDITOR_LIMIT: usize = 25;
pub const LOCALE_LIMIT: usize = 15;
pub const SAMPLE_LIMIT: usize = 10;

/// Inclusive span of partition years a caller may ask about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct YearRange {
    pub first: i32,
    pub last: i32,
}

impl YearRange {
    pub fn new(first: i32, last: i32) -> Self {
        Self { first, last }
    }

    /// Range from the first partition year up to `last`.
    pub fn up_to(last: i32) -> Self {
        Self::new(FIRST_YEAR, last)
    }

    pub fn contains(&self, year: i32) -> bool {
        (self.first..=self.last).contains(&year)
    }

    pub fn check(&self, year: i32) -> Result<i32> {
        if self.contains(year) {
            Ok(year)
        } else {
            Err(DashboardError::YearOutOfRange {
                year,
                first: self.first,
                last: self.last,
            })
        }
    }

    /// The year to compare `year` against, absent for the first year in range.
    pub fn previous(&self, year: i32) -> Option<i32> {
        (year > self.first && self.contains(year - 1)).then_some(year - 1)
    }
}

/// Which partitions count as "prior activity" when splitting a year's users into new and
/// returning. Historical versions of the dashboard disagreed; `Exclusive` is the default pending
/// product confirmation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PriorWindow {
    /// Only partitions strictly before the selected year.
    #[default]
    Exclusive,
    /// Partitions up to and including the selected year.
    Inclusive,
}

/// Escapes a value for use inside a single-quoted SQL literal.
pub fn sql_string(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

#[derive(Debug, Clone)]
pub struct QueryBuilder {
    template: UrlTemplate,
    editor_patterns: Vec<EditorPattern>,
    years: YearRange,
}

impl QueryBuilder {
    pub fn new(template: UrlTemplate, editor_patterns: Vec<EditorPattern>, years: YearRange) -> Self {
        Self {
            template,
            editor_patterns,
            years,
        }
    }

    pub fn with_years(mut self, years: YearRange) -> Self {
        self.years = years;
        self
    }

    pub fn years(&self) -> YearRange {
        self.years
    }

    fn partition(&self, year: i32) -> Result<String> {
        let year = self.years.check(year)?;
        Ok(stringify(&self.template.for_year(year)))
    }

    pub fn build_range_query(&self) -> String {
        format!(
            "SELECT
    min(created_at) start_range,
    max(created_at) end_range
FROM {}",
            stringify(&self.template.wildcard())
        )
    }

    pub fn build_year_stats_query(&self, year: i32) -> Result<String> {
        Ok(format!(
            "SELECT
    count(*) number_of_changesets,
    count(DISTINCT uid) number_of_unique_users,
    sum(num_changes) number_of_object_changes,
    sum(comments_count) number_of_comments
FROM {}",
            self.partition(year)?
        ))
    }

    /// `CASE` expression mapping `created_by` to an editor label. Arms follow the pattern list
    /// order and the first match wins.
    fn editor_expression(&self) -> String {
        let created_by = "map_extract(tags, 'created_by')[1]";
        let fallback = format!("coalesce({created_by}, {})", sql_string(UNKNOWN_LABEL));
        if self.editor_patterns.is_empty() {
            return fallback;
        }

        let mut expression = String::from("CASE -- map_extract returns a list, hence [1]\n");
        for EditorPattern { pattern, label } in &self.editor_patterns {
            let _ = writeln!(
                expression,
                "        WHEN {created_by} LIKE {} THEN {}",
                sql_string(pattern),
                sql_string(label)
            );
        }
        let _ = write!(expression, "        ELSE {fallback}\n    END");
        expression
    }

    pub fn build_editor_breakdown_query(&self, year: i32) -> Result<String> {
        Ok(format!(
            "SELECT
    {} editor,
    sum(num_changes)::BIGINT number_of_object_changes, -- exact integer keeps formatting exact
    count(*) number_of_changesets
FROM {}
GROUP BY 1
ORDER BY 2 DESC
LIMIT {EDITOR_LIMIT}",
            self.editor_expression(),
            self.partition(year)?
        ))
    }

    pub fn build_sample_query(&self, year: i32) -> Result<String> {
        Ok(format!(
            "SELECT *
FROM {}
LIMIT {SAMPLE_LIMIT}",
            self.partition(year)?
        ))
    }

    pub fn build_locale_breakdown_query(&self, year: i32) -> Result<String> {
        Ok(format!(
            "SELECT
    coalesce(map_extract(tags, 'locale')[1], {}) locale,
    count(*) number_of_changesets,
    printf('%.2f', 100.0 * count(*)::DOUBLE / sum(count(*)) OVER ()) || '%' share_of_changesets
FROM {}
GROUP BY 1
ORDER BY 2 DESC
LIMIT {LOCALE_LIMIT}",
            sql_string(UNKNOWN_LABEL),
            self.partition(year)?
        ))
    }

    pub fn build_new_vs_returning_query(&self, year: i32, window: PriorWindow) -> Result<String> {
        let current = self.partition(year)?;
        let last_prior_year = match window {
            PriorWindow::Exclusive => year - 1,
            PriorWindow::Inclusive => year,
        };
        let prior_paths = resolve_paths(&self.template, self.years.first, last_prior_year);
        // No prior partitions: keep the current partition's column type but select nothing.
        let previous_users = if prior_paths.is_empty() {
            format!(
                "SELECT DISTINCT uid
    FROM {current}
    WHERE false"
            )
        } else {
            format!(
                "SELECT DISTINCT uid
    FROM read_parquet([{}], union_by_name = true)
    WHERE uid IS NOT NULL",
                prior_paths.join(", ")
            )
        };

        Ok(format!(
            "WITH previous_users AS (
    {previous_users}
),
current_users AS (
    SELECT DISTINCT uid
    FROM {current}
    WHERE uid IS NOT NULL
),
classified AS (
    SELECT previous_users.uid IS NOT NULL AS has_prior_activity
    FROM current_users
    LEFT JOIN previous_users ON current_users.uid = previous_users.uid
)
SELECT 'new' user_type, count(*) FILTER (WHERE NOT has_prior_activity) number_of_users
FROM classified
UNION ALL
SELECT 'returning' user_type, count(*) FILTER (WHERE has_prior_activity) number_of_users
FROM classified
ORDER BY user_type"
        ))
    }

    /// Regex recovering the partition year from the engine's `filename` column, anchored on the
    /// part of the template that follows the placeholder.
    fn filename_year_pattern(&self) -> String {
        let suffix = self
            .template
            .as_str()
            .split_once(YEAR_PLACEHOLDER)
            .map(|(_, suffix)| suffix)
            .unwrap_or_default();
        format!(r"(\d{{4}}){}$", regex::escape(suffix))
    }

    pub fn build_yearly_trend_query(&self, start_year: i32, end_year: i32) -> Result<String> {
        let start_year = self.years.check(start_year)?;
        let end_year = self.years.check(end_year)?;
        if start_year > end_year {
            return Err(DashboardError::EmptyYearSpan {
                start: start_year,
                end: end_year,
            });
        }
        let paths = resolve_paths(&self.template, start_year, end_year);

        Ok(format!(
            "SELECT
    regexp_extract(filename, {}, 1)::INTEGER AS year,
    sum(num_changes)::BIGINT number_of_object_changes,
    count(*) number_of_changesets,
    count(DISTINCT uid) number_of_unique_users
FROM read_parquet([{}], filename = true, union_by_name = true)
GROUP BY 1
ORDER BY 1",
            sql_string(&self.filename_year_pattern()),
            paths.join(", ")
        ))
    }
}
