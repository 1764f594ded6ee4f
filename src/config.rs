use std::path::PathBuf;
use tracing::info;

use crate::args::Args;
use crate::engine::EngineSettings;
use crate::error::Result;
use crate::paths::UrlTemplate;
use crate::queries::PriorWindow;

/// Validated runtime configuration. Built once at startup; a bad template stops the process here.
#[derive(Debug, Clone)]
pub struct Settings {
    pub url_template: UrlTemplate,
    pub s3_region: String,
    pub threads: usize,
    pub editor_patterns: Option<PathBuf>,
    pub dashboard: DashboardOptions,
}

/// What the report should cover.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DashboardOptions {
    pub year: Option<i32>,
    pub trend_start: Option<i32>,
    pub trend_end: Option<i32>,
    pub prior_window: PriorWindow,
}

pub fn default_threads() -> usize {
    std::cmp::min(num_cpus::get(), 8)
}

impl Settings {
    pub fn from_args(args: &Args) -> Result<Self> {
        let url_template = UrlTemplate::parse(&args.url_template)?;
        let threads = args.threads.unwrap_or_else(default_threads);

        info!(
            action = "resolve",
            component = "settings",
            url_template = url_template.as_str(),
            remote = url_template.is_remote(),
            s3_region = %args.s3_region,
            threads,
            "Settings resolved"
        );

        Ok(Self {
            url_template,
            s3_region: args.s3_region.clone(),
            threads,
            editor_patterns: args.editor_patterns.clone(),
            dashboard: DashboardOptions {
                year: args.year,
                trend_start: args.trend_start,
                trend_end: args.trend_end,
                prior_window: args.prior_window,
            },
        })
    }

    pub fn engine_settings(&self) -> EngineSettings {
        let remote = self.url_template.is_remote();
        EngineSettings {
            remote,
            s3_region: remote.then(|| self.s3_region.clone()),
            threads: Some(self.threads),
        }
    }
}
