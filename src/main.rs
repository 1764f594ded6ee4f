use anyhow::Result;
use clap::Parser;
use tracing::error;

use osm_changesets::config::Settings;
use osm_changesets::render::{print_json, print_report, RenderOptions};
use osm_changesets::utils::{setup_logging, validate_args};
use osm_changesets::{analyze_changesets, init_default_patterns, Args};

fn main() -> Result<()> {
    let args = Args::parse();
    setup_logging(args.verbose);
    validate_args(&args)?;

    if args.init {
        return init_default_patterns();
    }

    let settings = Settings::from_args(&args)?;

    match analyze_changesets(&settings) {
        Ok(report) => {
            if args.json {
                print_json(&report)?;
            } else {
                print_report(
                    &report,
                    RenderOptions {
                        show_queries: args.show_queries,
                    },
                );
            }
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Analysis failed");
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}
