use thiserror::Error;

pub type Result<T, E = DashboardError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("invalid dataset location template {template:?}: {reason}")]
    Config { template: String, reason: String },

    #[error("year {year} is outside the dataset range {first}..={last}")]
    YearOutOfRange { year: i32, first: i32, last: i32 },

    #[error("year span {start}..={end} is empty")]
    EmptyYearSpan { start: i32, end: i32 },

    #[error("query returned no rows: {query}")]
    EmptyResult { query: String },

    #[error("unexpected value in column {column:?}: {value}")]
    UnexpectedValue { column: String, value: String },

    #[error("query engine connection was poisoned by a panicking query")]
    EnginePoisoned,

    #[error(transparent)]
    Engine(#[from] duckdb::Error),
}

impl DashboardError {
    pub(crate) fn config(template: &str, reason: impl Into<String>) -> Self {
        DashboardError::Config {
            template: template.to_string(),
            reason: reason.into(),
        }
    }
}
