use anyhow::Result;
use dockerbeat::*;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Config is loaded before logging so its filter can apply; load errors go to stderr via main's Err.
    let app_config = config::AppConfig::load()?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&app_config.logging.filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    // Events may go to stdout; keep logs on stderr.
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    tracing::info!(
        name = version::NAME,
        version = version::VERSION,
        socket = %app_config.input.socket,
        period_secs = app_config.input.period_secs,
        "Starting"
    );

    let docker_repo = Arc::new(docker_repo::DockerRepo::connect(&app_config.input)?);
    let sink: Arc<dyn sink::EventSink> = match app_config.output.sink {
        config::SinkKind::Stdout => Arc::new(sink::StdoutSink::new(app_config.output.pretty)),
        config::SinkKind::Log => Arc::new(sink::LogSink),
    };

    let collector = collector::StatsCollector::new(
        docker_repo,
        sink,
        event_builder::EventBuilder::new(counter_store::SharedCounterStore::new()),
        Duration::from_millis(app_config.input.fetch_timeout_ms),
    );
    let scheduler = scheduler::spawn(
        collector,
        scheduler::SchedulerConfig {
            period: Duration::from_secs(app_config.input.period_secs),
            stats_log_interval: Duration::from_secs(app_config.monitoring.stats_log_interval_secs),
        },
    );

    wait_for_shutdown_signal().await;
    tracing::info!("Received shutdown signal");
    scheduler.shutdown().await?;
    tracing::info!("Stopped");

    Ok(())
}

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        let mut sigterm =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(s) => s,
                Err(_) => {
                    let _ = tokio::signal::ctrl_c().await;
                    return;
                }
            };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
