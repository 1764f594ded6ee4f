pub mod args;
pub mod config;
pub mod dashboard;
pub mod engine;
pub mod error;
pub mod executor;
pub mod paths;
pub mod patterns;
pub mod queries;
pub mod render;
pub mod shaping;
pub mod stats;
pub mod table;
pub mod utils;

pub use args::Args;
pub use dashboard::{analyze_changesets, build_dashboard, DashboardReport};
pub use engine::{DuckDbEngine, QueryEngine};
pub use error::DashboardError;
pub use executor::Executor;
pub use paths::{resolve_paths, UrlTemplate};
pub use patterns::init_default_patterns;
pub use queries::{PriorWindow, QueryBuilder, YearRange};
pub use shaping::delta;
pub use stats::{DatasetStats, StatsForYear, TabularResult, YearComparison};
