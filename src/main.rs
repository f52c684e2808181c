use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::mpsc::{self, UnboundedSender};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use regionwatch::config::{resolve_port, RawSettings, Settings};
use regionwatch::data::duration::format_duration;
use regionwatch::events::{self, Command};
use regionwatch::{hbase_registry, HttpFetcher, MetricEngine, PollLoop, RegionServer};
use regionwatch::{TabularRenderer, Theme};

#[derive(Parser, Debug)]
#[command(name = "regionwatch", version)]
#[command(about = "Live terminal dashboard for HBase region server metrics")]
struct Args {
    /// File listing region server hosts, one per line
    /// (default: $HBASE_HOME/conf/regionservers)
    #[arg(short, long)]
    servers: Option<PathBuf>,

    /// HBase installation directory holding conf/regionservers
    #[arg(long)]
    hbase_home: Option<PathBuf>,

    /// Region server info port (default: asked from --master, else 60030)
    #[arg(short, long)]
    port: Option<u16>,

    /// HBase master info server (host, host:port or http:// URL) to read the port from
    #[arg(short, long)]
    master: Option<String>,

    /// Poll interval (e.g., "10s", "500ms", "2m")
    #[arg(short, long)]
    interval: Option<String>,

    /// Per-server fetch timeout (e.g., "5s")
    #[arg(short, long)]
    timeout: Option<String>,

    /// Maximum number of servers fetched at once
    #[arg(long)]
    concurrency: Option<usize>,

    /// Settings file (default: ./regionwatch.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write logs to this file
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Args {
    fn into_settings(self) -> RawSettings {
        RawSettings {
            interval: self.interval,
            timeout: self.timeout,
            hbase_home: self.hbase_home,
            servers: self.servers,
            master: self.master,
            port: self.port,
            concurrency: self.concurrency,
            log_file: self.log_file,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Everything that can fail on bad configuration happens before the
    // terminal is switched to raw mode.
    let file_settings = RawSettings::load(args.config.as_deref())?;
    let raw = file_settings.overlay(args.into_settings());
    let settings = Settings::resolve(raw, std::env::var_os("HBASE_HOME").map(PathBuf::from))?;
    let hosts = settings.load_servers()?;

    if let Some(path) = &settings.log_file {
        init_logging(path)?;
    }

    let runtime = tokio::runtime::Runtime::new()?;
    let fetcher = HttpFetcher::new(settings.fetch_timeout)?;
    let port = runtime.block_on(resolve_port(&settings.port, &fetcher))?;

    let registry = Arc::new(hbase_registry()?);
    let servers: Vec<RegionServer> = hosts
        .iter()
        .map(|host| RegionServer::new(host.as_str(), port, &registry))
        .collect();
    info!(
        servers = servers.len(),
        port,
        interval = %format_duration(settings.interval),
        "starting"
    );

    let mut poll = PollLoop::new(
        servers,
        MetricEngine::new(Arc::clone(&registry)),
        fetcher,
        settings.interval,
    )
    .with_fetch_timeout(settings.fetch_timeout)
    .with_concurrency(settings.concurrency);

    // Detection talks to the terminal, so it must run before raw mode.
    let theme = Theme::auto_detect();
    let mut renderer = TabularRenderer::open(theme)?;
    for name in registry.names() {
        renderer.add_column(name, None, None);
    }

    let (tx, mut rx) = mpsc::unbounded_channel();
    let listener = events::spawn_input_listener(tx.clone());
    runtime.spawn(forward_shutdown_signal(tx));

    let result = runtime.block_on(poll.run(&mut renderer, &mut rx));

    drop(rx);
    let closed = renderer.close();
    events::join_input_listener(listener);
    info!(cycles = poll.cycles(), "shutdown");

    result?;
    closed.context("failed to restore the terminal")
}

fn init_logging(path: &Path) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Cannot open log file {}", path.display()))?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

/// Turn SIGINT/SIGTERM into a `Quit` so the terminal is restored.
async fn forward_shutdown_signal(tx: UnboundedSender<Command>) {
    match shutdown_signal().await {
        Ok(()) => {
            info!("shutdown signal received");
            let _ = tx.send(Command::Quit);
        }
        Err(e) => warn!(error = %e, "cannot listen for shutdown signals"),
    }
}

#[cfg(unix)]
async fn shutdown_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate())?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => result,
        _ = terminate.recv() => Ok(()),
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}
