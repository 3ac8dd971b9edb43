use std::process;
use std::sync::Arc;

use clap::Parser;

use trackers_app::app::{self, ConsoleNotifier};
use trackers_app::cli::Cli;
use trackers_app::commands::Runner;
use trackers_core::TrackerError;
use trackers_infra::config::TrackersConfig;
use trackers_observability::tracing::{LogFormat, LogSettings};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let format = LogFormat::parse(&cli.log_format).unwrap_or_else(|| {
        eprintln!("unknown log format `{}`; using json", cli.log_format);
        LogFormat::Json
    });
    trackers_observability::tracing::init(&LogSettings {
        format,
        default_directive: "warn".to_string(),
    });

    if let Err(err) = run(cli).await {
        // Tracker failures were already shown through the notifier.
        if err.downcast_ref::<TrackerError>().is_none() {
            eprintln!("error: {err:#}");
        }
        process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = TrackersConfig::from_env()?;
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }

    let notifier = Arc::new(ConsoleNotifier);
    let runner = Runner {
        trackers: app::build(config, notifier.clone())?,
        notifier,
        json: cli.json,
    };
    runner.run(cli.command).await
}
