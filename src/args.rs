use clap::Parser;
use std::path::PathBuf;

use crate::paths::DEFAULT_URL_TEMPLATE;
use crate::queries::PriorWindow;

#[derive(Parser, Debug)]
#[command(
    name = "osm-changesets",
    about = "Query yearly OpenStreetMap changeset partitions and report editing activity",
    version,
    long_about = None
)]
pub struct Args {
    /// Year to analyze (defaults to the latest year in the dataset)
    #[arg(short, long)]
    pub year: Option<i32>,

    /// Dataset location with a single {year} placeholder
    #[arg(long, env = "OSM_CHANGESETS_URL_TEMPLATE", default_value = DEFAULT_URL_TEMPLATE)]
    pub url_template: String,

    /// S3 region of the dataset bucket
    #[arg(long, env = "OSM_CHANGESETS_S3_REGION", default_value = "eu-central-1")]
    pub s3_region: String,

    /// Which years count as prior activity for new vs returning users
    #[arg(long, value_enum, default_value_t = PriorWindow::Exclusive)]
    pub prior_window: PriorWindow,

    /// First year of the yearly trend (defaults to the first partition)
    #[arg(long)]
    pub trend_start: Option<i32>,

    /// Last year of the yearly trend (defaults to the latest year in the dataset)
    #[arg(long)]
    pub trend_end: Option<i32>,

    /// Path to custom editor pattern file
    #[arg(short = 'p', long)]
    pub editor_patterns: Option<PathBuf>,

    /// Number of query engine threads
    #[arg(short, long)]
    pub threads: Option<usize>,

    /// Print the SQL behind every section
    #[arg(long)]
    pub show_queries: bool,

    /// Emit the whole report as JSON
    #[arg(long)]
    pub json: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Initialize editor_patterns.txt with default patterns
    #[arg(long)]
    pub init: bool,
}
