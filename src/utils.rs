use time::macros::format_description;
use tracing::warn;
use tracing_subscriber::fmt::time::LocalTime;
use tracing_subscriber::EnvFilter;

/// Installs the global subscriber. `RUST_LOG` overrides the verbosity flag.
pub fn setup_logging(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let timer = LocalTime::new(format_description!(
        "[hour]:[minute]:[second].[subsecond digits:3]"
    ));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(timer)
        .with_writer(std::io::stderr)
        .init();
}

pub fn validate_args(args: &crate::args::Args) -> anyhow::Result<()> {
    if let Some(threads) = args.threads {
        if threads == 0 {
            anyhow::bail!("--threads must be greater than 0");
        }
    }

    if let (Some(start), Some(end)) = (args.trend_start, args.trend_end) {
        if start > end {
            anyhow::bail!("--trend-start must not be after --trend-end");
        }
    }

    if args.json && args.show_queries {
        warn!("--show-queries is ignored with --json, which always includes the queries");
    }

    Ok(())
}
