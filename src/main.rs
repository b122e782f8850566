//! Motion Telemetry - Main Entry Point
//!
//! Streams the simulated motion sensor through the ingestion pipeline and
//! prints the newest aligned sample of each rendered snapshot as a JSON line
//! on stdout. Logs go to stderr and, when the data directory is writable, to
//! a daily log file.
//!
//! No signal handler is installed: the process runs until it is killed, or
//! until stdout is closed (e.g. `motion-telemetry | head -n 100`), which
//! fails the sink, cancels the backend and logs the final statistics.

use anyhow::Context;
use motion_telemetry::{
    backend::{SimulatedSensor, TelemetryBackend},
    config::{app_data_dir, AppConfig},
    frontend::{JsonLinesSink, RenderLoop},
};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> anyhow::Result<()> {
    let _log_guard = init_logging();

    tracing::info!("Starting Motion Telemetry");

    let config = match std::env::args_os().nth(1) {
        Some(path) => AppConfig::load(&path)
            .with_context(|| format!("Failed to load config from {:?}", path))?,
        None => AppConfig::load_or_default(),
    };

    let sensor = SimulatedSensor::from_config(&config);
    let backend = TelemetryBackend::new(config.clone()).context("Invalid configuration")?;
    let handle = backend
        .start(Box::new(sensor))
        .context("Failed to start telemetry threads")?;

    let mut render = RenderLoop::from_config(handle.reader(), &config.render, handle.cancel_token());
    let stdout = std::io::stdout();
    let mut sink = JsonLinesSink::new(stdout.lock());
    let render_result = render.run(&mut sink);

    // Signal backend to stop and wait for it
    tracing::info!("Shutting down...");
    let (session, writer) = handle.shutdown()?;
    tracing::info!(
        "Session: {} attempts, {} established, {} forwarded, {} dropped, {} unrecognized",
        session.attempts,
        session.sessions_established,
        session.notifications_forwarded,
        session.dropped_notifications,
        session.unrecognized_notifications
    );
    tracing::info!("Writer: {}", writer);

    let frames = render_result.context("Render loop failed")?;
    tracing::info!("Rendered {} frames", frames);
    Ok(())
}

/// Install the stderr layer plus a daily rolling file layer in the data dir
fn init_logging() -> Option<WorkerGuard> {
    let file = app_data_dir()
        .map(|dir| dir.join("logs"))
        .filter(|dir| std::fs::create_dir_all(dir).is_ok())
        .map(|dir| {
            let appender = tracing_appender::rolling::daily(dir, "motion-telemetry.log");
            tracing_appender::non_blocking(appender)
        });
    let (file_writer, guard) = match file {
        Some((writer, guard)) => (Some(writer), Some(guard)),
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,motion_telemetry=debug")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(file_writer.map(|writer| {
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer)
        }))
        .init();

    guard
}
