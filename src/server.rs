//! Startup logic for the relay and consumer commands.

use std::path::{Path, PathBuf};

use tracing::{info, warn};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use stepcast_config::{
    stepcast_dir, Config, ConfigLoader, ConfigValidator, ConsumerSettings, LoggingConfig,
};
use stepcast_consumer::DraftUpdate;
use stepcast_relay::RelayServer;

type CliResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

/// Initialize tracing with console and file output.
///
/// Log files are written to ~/.stepcast/logs/ (or `logging.dir`) with daily
/// rotation.
pub(crate) fn init_tracing(logging: &LoggingConfig) -> CliResult {
    let log_dir = logging
        .dir
        .as_deref()
        .map(ConfigLoader::expand_path)
        .unwrap_or_else(|| stepcast_dir().join("logs"));
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("stepcast")
        .filename_suffix("log")
        .max_log_files(logging.max_files)
        .build(&log_dir)?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // The guard flushes the file writer when dropped.
    static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
        std::sync::OnceLock::new();
    let _ = GUARD.set(guard);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true).with_ansi(true))
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    Ok(())
}

/// Load, override from the environment and validate the configuration.
pub(crate) fn load_config(path: Option<&Path>) -> CliResult<Config> {
    let path = path.map(PathBuf::from).unwrap_or_else(ConfigLoader::default_path);
    let mut config = ConfigLoader::load_or_default(&path)?;
    ConfigLoader::apply_env_overrides(&mut config)?;

    let result = ConfigValidator::validate(&config);
    if !result.is_valid() {
        let errors: Vec<String> = result.errors.iter().map(ToString::to_string).collect();
        return Err(format!("Invalid configuration: {}", errors.join("; ")).into());
    }
    Ok(config)
}

/// Run the relay until Ctrl-C.
pub(crate) async fn run_relay(mut config: Config, host: Option<String>, port: Option<u16>) -> CliResult {
    if let Some(host) = host {
        config.relay.host = host;
    }
    if let Some(port) = port {
        config.relay.port = port;
    }

    info!("Starting stepcast relay v{}", env!("CARGO_PKG_VERSION"));
    let relay = RelayServer::new(config.relay);
    relay.run_until(shutdown_signal()).await?;
    info!("Relay stopped");
    Ok(())
}

pub(crate) struct ConsumeOptions {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub draft: Option<PathBuf>,
    pub no_timestamps: bool,
    pub screenshots: Option<PathBuf>,
}

/// Print steps as they arrive; on Ctrl-C print the report.
pub(crate) async fn run_consumer(mut config: Config, options: ConsumeOptions) -> CliResult {
    let settings_path = ConsumerSettings::default_path();
    if let Some(port) = options.port {
        let settings = ConsumerSettings { port };
        if let Err(e) = settings.save(&settings_path) {
            warn!("Could not remember consumer port: {}", e);
        }
        config.consumer.port = port;
    } else if settings_path.exists() {
        config.consumer.port = ConsumerSettings::load(&settings_path).port;
    }
    if let Some(host) = options.host {
        config.consumer.host = host;
    }
    if options.draft.is_some() {
        config.consumer.draft_path = options.draft;
    }
    if options.no_timestamps {
        config.consumer.timestamps = false;
    }

    let draft = stepcast_consumer::load_draft(config.consumer.draft_path.as_deref()).await;
    info!(url = %config.consumer.url(), "Starting stepcast consumer");
    let consumer = stepcast_consumer::spawn(&config.consumer, draft)?;
    let mut updates = consumer.subscribe();

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            update = updates.recv() => match update {
                Ok(DraftUpdate::StepAdded { text, .. }) => {
                    let count = consumer.draft().lock().len();
                    println!("{}. {}", count, text);
                }
                Ok(DraftUpdate::ScreenshotAttached { .. }) => println!("   (screenshot attached)"),
                Ok(DraftUpdate::Recording { active }) => {
                    println!("-- recording {} --", if active { "started" } else { "stopped" });
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(missed)) => {
                    warn!(missed, "Step output fell behind");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            },
        }
    }

    consumer.close().await;
    if let Some(dir) = options.screenshots {
        let written = consumer.snapshot().write_screenshots(&dir).await?;
        info!(count = written.len(), dir = %dir.display(), "Screenshots written");
    }

    let report = consumer.export_text();
    if !report.is_empty() {
        println!("\n{}", report);
    }
    Ok(())
}

pub(crate) async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}
