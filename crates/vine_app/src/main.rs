mod config;
mod logging;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use engine_logging::{engine_debug, engine_error, engine_info, engine_warn};
use tokio::signal;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use vine_core::MonitorStatus;
use vine_engine::{
    load_priority_terms, utc_clock, CookieAuthenticator, CycleOutcome, DiscordNotifier, Monitor,
    MonitorParts, ReqwestPageSource, StateStore, TileParser, TokioSleeper,
};

use crate::config::MonitorConfig;

const EXIT_NO_SESSION: u8 = 1;
const EXIT_BAD_CONFIG: u8 = 2;

/// Watches the Amazon Vine queues and posts new items to Discord.
#[derive(Parser, Debug)]
#[command(name = "vine_monitor", version)]
struct Cli {
    /// Configuration file (RON). Defaults to ./vine_monitor.ron when present.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override the state file location
    #[arg(long, value_name = "FILE")]
    state_file: Option<PathBuf>,

    /// Override the log level (error, warn, info, debug, trace)
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Run a single poll cycle and exit
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let _ = dotenvy::dotenv();

    let config = match resolve_config(&cli) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Invalid configuration: {err}");
            return ExitCode::from(EXIT_BAD_CONFIG);
        }
    };
    let level = config.level_filter().unwrap_or(log::LevelFilter::Info);
    logging::initialize(config.log_destination, level, &config.log_file);

    match run(config, cli.once).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            engine_error!("{:#}", err);
            ExitCode::from(EXIT_NO_SESSION)
        }
    }
}

fn resolve_config(cli: &Cli) -> Result<MonitorConfig, config::ConfigError> {
    let mut config = config::load(cli.config.as_deref())?;
    config.apply_env(|key| std::env::var(key).ok());
    if let Some(path) = &cli.state_file {
        config.state_file = path.clone();
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    config.validate()?;
    Ok(config)
}

async fn run(config: MonitorConfig, once: bool) -> anyhow::Result<()> {
    let site = config.site()?;
    let fetch_settings = config.fetch_settings();
    let destinations = config.destinations();
    if destinations.is_empty() {
        engine_warn!("No Discord webhooks configured; new items will only be logged");
    } else {
        engine_info!("{} notification destination(s) configured", destinations.len());
    }

    let parts = MonitorParts {
        authenticator: Arc::new(CookieAuthenticator::new(
            site.clone(),
            fetch_settings.clone(),
            config.cookie_source(),
        )),
        pages: Arc::new(ReqwestPageSource::new(site.clone(), fetch_settings)),
        parser: Arc::new(TileParser::new()),
        notifier: Arc::new(
            DiscordNotifier::new(destinations, site, config.request_timeout(), utc_clock())
                .context("cannot build the webhook client")?,
        ),
        sleeper: Arc::new(TokioSleeper),
        clock: utc_clock(),
        store: StateStore::new(&config.state_file),
        terms: load_priority_terms(&config.priority_terms_file),
        settings: config.monitor_settings(),
    };

    let mut monitor = Monitor::start(parts)
        .await
        .context("cannot start monitoring")?;
    tokio::spawn(log_status(monitor.subscribe()));

    if once {
        let report = monitor.run_cycle().await;
        if let CycleOutcome::AuthFailed { .. } = report.outcome {
            anyhow::bail!("single cycle could not authenticate");
        }
        engine_info!("Single cycle finished: {:?}", report.outcome);
        return Ok(());
    }

    let cancel = CancellationToken::new();
    tokio::spawn(cancel_on_shutdown(cancel.clone()));
    let state = monitor.run(cancel).await;
    engine_info!("Shutdown complete; {} items known", state.total_items());
    Ok(())
}

async fn log_status(mut status: watch::Receiver<MonitorStatus>) {
    while status.changed().await.is_ok() {
        let snapshot = status.borrow_and_update().clone();
        engine_debug!(
            "Status: session {}, {} items, quiet cycles {}, next poll in {:?}",
            snapshot.session,
            snapshot.total_items(),
            snapshot.quiet_cycles,
            snapshot.interval
        );
    }
}

async fn cancel_on_shutdown(cancel: CancellationToken) {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            engine_error!("Could not listen for Ctrl+C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                engine_error!("Could not listen for SIGTERM: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => engine_info!("Received Ctrl+C, shutting down gracefully"),
        () = terminate => engine_info!("Received SIGTERM, shutting down gracefully"),
    }
    cancel.cancel();
}
