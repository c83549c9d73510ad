//! CLI entry point for the MTA arrival tracker.
//!
//! Polls the bus stop-monitoring API and/or a subway GTFS-realtime feed and
//! redraws the upcoming arrivals every refresh interval until Ctrl+C.

use anyhow::Result;
use clap::{Parser, ValueEnum};
use mta_arrivals::config::{
    DEFAULT_MAX_BUS_RESULTS, DEFAULT_MAX_TRAIN_RESULTS, DEFAULT_REFRESH_SECS, Settings,
    TrackerConfig, parse_refresh_interval,
};
use mta_arrivals::feeds::{ArrivalSource, BusFeed, TrainFeed};
use mta_arrivals::poll::{Poller, Scheduler, SystemClock, shutdown_channel};
use mta_arrivals::render::{JsonRenderer, TerminalRenderer};
use std::convert::Infallible;
use std::ffi::OsStr;
use std::path::Path;
use tracing::{error, info};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "mta_arrivals")]
#[command(about = "Live NYC bus and subway arrivals for one stop", long_about = None)]
struct Cli {
    /// Bus Time API key
    #[arg(long, env = "MTA_API_KEY", hide_env_values = true)]
    bus_api_key: Option<String>,

    /// Bus stop id (e.g. 308214)
    #[arg(long, env = "MTA_STOP_ID")]
    stop_id: Option<String>,

    /// Only show this bus route (e.g. M15)
    #[arg(long, env = "MTA_ROUTE")]
    route: Option<String>,

    /// Subway realtime feed API key
    #[arg(long, env = "MTA_SUBWAY_API_KEY", hide_env_values = true)]
    subway_api_key: Option<String>,

    /// Subway station id without direction suffix (e.g. 635)
    #[arg(long, env = "MTA_SUBWAY_STATION")]
    station: Option<String>,

    /// Only show this subway route (e.g. 6); also selects the feed
    #[arg(long, env = "MTA_SUBWAY_ROUTE")]
    subway_route: Option<String>,

    /// Seconds between refreshes (values under 5 are raised to 5)
    #[arg(
        short = 'r',
        long,
        env = "MTA_REFRESH_INTERVAL",
        default_value_t = DEFAULT_REFRESH_SECS,
        value_parser = refresh_interval,
        allow_negative_numbers = true
    )]
    refresh_interval: i64,

    /// Maximum bus arrivals to show
    #[arg(long, env = "MTA_MAX_BUS_RESULTS", default_value_t = DEFAULT_MAX_BUS_RESULTS)]
    max_bus: usize,

    /// Maximum subway arrivals to show
    #[arg(long, env = "MTA_MAX_TRAIN_RESULTS", default_value_t = DEFAULT_MAX_TRAIN_RESULTS)]
    max_train: usize,

    /// Fetch and print once instead of refreshing
    #[arg(long, default_value_t = false)]
    once: bool,

    /// Output format
    #[arg(long, env = "MTA_OUTPUT_FORMAT", value_enum, default_value_t = Format::Table)]
    format: Format,
}

fn refresh_interval(raw: &str) -> Result<i64, Infallible> {
    Ok(parse_refresh_interval(raw))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    Table,
    Json,
}

impl Cli {
    fn settings(&self) -> Settings {
        Settings {
            bus_api_key: self.bus_api_key.clone(),
            bus_stop_id: self.stop_id.clone(),
            bus_route_filter: self.route.clone(),
            train_api_key: self.subway_api_key.clone(),
            train_station_id: self.station.clone(),
            train_route_filter: self.subway_route.clone(),
            refresh_interval_seconds: self.refresh_interval,
            max_bus_results: self.max_bus,
            max_train_results: self.max_train,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: stderr (quiet by default, stdout holds the board) + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/mta_arrivals.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("mta_arrivals.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("warn".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    let config = cli.settings().validate().inspect_err(|e| {
        error!(error = %e, "Invalid configuration");
    })?;
    info!(
        bus = config.bus.is_some(),
        train = config.train.is_some(),
        refresh_secs = config.refresh_interval.as_secs(),
        "Configuration loaded"
    );

    let scheduler = build_scheduler(&config, cli.once)?;

    let (trigger, shutdown) = shutdown_channel();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Interrupt received, stopping after current tick"),
            Err(e) => error!(error = %e, "Failed to listen for Ctrl+C"),
        }
        trigger.trigger();
    });

    let refresh = (!cli.once).then_some(config.refresh_interval);
    let stdout = std::io::stdout();
    let summary = match cli.format {
        Format::Table => {
            let mut renderer = TerminalRenderer::new(stdout.lock(), &config, refresh);
            scheduler.run(&mut renderer, shutdown).await?
        }
        Format::Json => {
            let mut renderer = JsonRenderer::new(stdout.lock());
            scheduler.run(&mut renderer, shutdown).await?
        }
    };

    if !cli.once && cli.format == Format::Table {
        println!("\nMonitoring stopped. Goodbye!");
    }
    info!(ticks = summary.ticks, "Exiting");
    Ok(())
}

fn build_scheduler(config: &TrackerConfig, once: bool) -> Result<Scheduler<SystemClock>> {
    let bus = match &config.bus {
        Some(bus) => Some(Box::new(BusFeed::new(bus)?) as Box<dyn ArrivalSource>),
        None => None,
    };
    let train = match &config.train {
        Some(train) => {
            let feed = TrainFeed::new(train)?;
            info!(feed = %feed.feed(), station = %train.station_id, "Subway feed selected");
            Some(Box::new(feed) as Box<dyn ArrivalSource>)
        }
        None => None,
    };

    let poller = Poller::new(bus, train, config.max_bus_results, config.max_train_results);
    let scheduler = Scheduler::new(poller, SystemClock, config.refresh_interval);
    Ok(if once {
        scheduler.with_max_ticks(1)
    } else {
        scheduler
    })
}
