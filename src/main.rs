use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use vicmon_service::config::Config;
use vicmon_service::ingest::feed::FeedClient;
use vicmon_service::logging::{self, LogLevel};
use vicmon_service::monitor::Monitor;
use vicmon_service::report::OutputFormat;
use vicmon_service::schedule::Scheduler;

#[derive(Parser, Debug)]
#[command(
    name = "vicmon",
    version,
    about = "Monitor VIC Emergency incidents by postcode"
)]
struct Cli {
    /// Run continuously with interval polling
    #[arg(long)]
    schedule: bool,
    /// Polling interval in seconds (scheduled mode)
    #[arg(long, value_name = "SECONDS")]
    interval: Option<u64>,
    /// Output in JSON format
    #[arg(long, conflicts_with = "csv")]
    json: bool,
    /// Output in CSV format
    #[arg(long)]
    csv: bool,
    /// Show only status changes (new, upgraded, downgraded, resolved)
    #[arg(long)]
    changes: bool,
    /// Config file path (default: vicmon.toml if present)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Append log lines to this file
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,
    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(interval) = cli.interval {
        anyhow::ensure!(interval > 0, "--interval must be at least 1 second");
        config.poll_interval_secs = interval;
    }
    if cli.json {
        config.output_format = OutputFormat::Json;
    } else if cli.csv {
        config.output_format = OutputFormat::Csv;
    }

    // Timestamped log lines in scheduled (daemon) mode, symbol-prefixed
    // lines for interactive runs.
    logging::init_logger(
        if cli.debug { LogLevel::Debug } else { LogLevel::Info },
        cli.log_file.as_deref().and_then(|p| p.to_str()),
        cli.schedule,
    );

    let source = FeedClient::new(&config)?;
    let interval = Duration::from_secs(config.poll_interval_secs);
    let mut monitor = Monitor::new(config, Box::new(source));

    if cli.schedule {
        println!(
            "Starting VIC Emergency Monitor (polling every {} seconds)",
            interval.as_secs()
        );
        println!("Press Ctrl+C to stop");

        let scheduler = Scheduler::new(interval);
        let handle = scheduler.stop_handle();
        ctrlc::set_handler(move || {
            eprintln!("\nShutting down...");
            handle.stop();
        })?;

        // A cycle failure in scheduled mode is logged and the loop keeps
        // its cadence; only Ctrl+C ends it.
        scheduler.run(|| {
            if let Err(e) = monitor.run_once(cli.changes) {
                logging::log_feed_failure("poll cycle", &e);
            }
        });
    } else {
        // One-shot: the cycle is the run, so a fetch failure is the exit code.
        monitor.run_once(cli.changes)?;
    }

    Ok(())
}
