use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;
use url::Url;

use crate::error::{DashboardError, Result};

pub const YEAR_PLACEHOLDER: &str = "{year}";
pub const DEFAULT_URL_TEMPLATE: &str = "s3://tt-osm-changesets/full_by_year/{year}.parquet";

/// Schemes DuckDB resolves through the httpfs extension.
const REMOTE_SCHEMES: &[&str] = &["s3", "s3a", "s3n", "gcs", "gs", "r2", "http", "https"];

fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\{[^{}]*\}").expect("placeholder regex is valid"))
}

/// A dataset location with exactly one `{year}` substitution point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct UrlTemplate(String);

impl UrlTemplate {
    pub fn parse(template: &str) -> Result<Self> {
        let template = template.trim();
        if template.is_empty() {
            return Err(DashboardError::config(template, "template is empty"));
        }

        let placeholders: Vec<&str> = placeholder_pattern()
            .find_iter(template)
            .map(|m| m.as_str())
            .collect();
        match placeholders.as_slice() {
            [YEAR_PLACEHOLDER] => {}
            [] => {
                return Err(DashboardError::config(
                    template,
                    "missing {year} placeholder",
                ))
            }
            many if many.iter().all(|p| *p == YEAR_PLACEHOLDER) => {
                return Err(DashboardError::config(
                    template,
                    "{year} placeholder must appear exactly once",
                ))
            }
            many => {
                let unknown: Vec<&str> = many
                    .iter()
                    .copied()
                    .filter(|p| *p != YEAR_PLACEHOLDER)
                    .collect();
                return Err(DashboardError::config(
                    template,
                    format!("unknown placeholder(s) {}", unknown.join(", ")),
                ));
            }
        }

        if template.contains('\'') {
            return Err(DashboardError::config(
                template,
                "single quotes are not allowed in dataset locations",
            ));
        }

        // The trend view recovers the year from the text after the placeholder, so it must be literal.
        if let Some((_, suffix)) = template.split_once(YEAR_PLACEHOLDER) {
            if suffix.contains(['*', '?', '[']) {
                return Err(DashboardError::config(
                    template,
                    "glob characters are not allowed after {year}",
                ));
            }
        }

        if template.contains("://") {
            let probe = template.replace(YEAR_PLACEHOLDER, "2005");
            Url::parse(&probe).map_err(|e| DashboardError::config(template, e.to_string()))?;
        }

        Ok(Self(template.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn for_year(&self, year: i32) -> String {
        self.0.replace(YEAR_PLACEHOLDER, &year.to_string())
    }

    /// Glob over every partition, used for whole-dataset scans.
    pub fn wildcard(&self) -> String {
        self.0.replace(YEAR_PLACEHOLDER, "*")
    }

    pub fn is_remote(&self) -> bool {
        if !self.0.contains("://") {
            return false;
        }
        Url::parse(&self.for_year(2005))
            .map(|url| REMOTE_SCHEMES.contains(&url.scheme()))
            .unwrap_or(false)
    }
}

impl Default for UrlTemplate {
    fn default() -> Self {
        Self(DEFAULT_URL_TEMPLATE.to_string())
    }
}

/// Wraps a location in the single-quoted literal form DuckDB expects.
pub fn stringify(path: &str) -> String {
    format!("'{path}'")
}

/// Quoted locations for every year in `start_year..=end_year`, ascending.
/// An inverted range is a valid empty request.
pub fn resolve_paths(url_template: &UrlTemplate, start_year: i32, end_year: i32) -> Vec<String> {
    (start_year..=end_year)
        .map(|year| stringify(&url_template.for_year(year)))
        .collect()
}
