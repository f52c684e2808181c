//! The poll/render cycle.

use std::time::Duration;

use anyhow::{Context, Result};
use futures_util::stream::{self, StreamExt};
use ratatui::backend::Backend;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::{self, Instant};
use tracing::{debug, info};

use crate::config::{DEFAULT_CONCURRENCY, DEFAULT_FETCH_TIMEOUT};
use crate::data::duration::format_duration;
use crate::data::{MetricEngine, RegionServer};
use crate::events::Command;
use crate::source::{FetchError, MetricsFetcher};
use crate::ui::{TableRow, TabularRenderer};

/// One table row: a server queried across all columns.
#[derive(Debug, Clone, Copy)]
pub struct ServerRow<'a> {
    server: &'a RegionServer,
    engine: &'a MetricEngine,
}

impl TableRow for ServerRow<'_> {
    fn cell(&self, column: &str) -> Option<String> {
        self.engine.get(self.server, column).ok()
    }
}

/// Polls every server once per period and repaints the table.
///
/// Within a cycle all servers are fetched concurrently, at most
/// `concurrency` at a time, and each fetch is bounded by `fetch_timeout`.
/// The table is painted only after every outcome of the cycle is recorded.
#[derive(Debug)]
pub struct PollLoop<F> {
    servers: Vec<RegionServer>,
    engine: MetricEngine,
    fetcher: F,
    period: Duration,
    fetch_timeout: Duration,
    concurrency: usize,
    cycles: u64,
}

impl<F: MetricsFetcher> PollLoop<F> {
    pub fn new(servers: Vec<RegionServer>, engine: MetricEngine, fetcher: F, period: Duration) -> Self {
        Self {
            servers,
            engine,
            fetcher,
            period,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            concurrency: DEFAULT_CONCURRENCY,
            cycles: 0,
        }
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Zero is treated as one.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn servers(&self) -> &[RegionServer] {
        &self.servers
    }

    pub fn engine(&self) -> &MetricEngine {
        &self.engine
    }

    /// Completed poll cycles.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn alive_count(&self) -> usize {
        self.servers.iter().filter(|s| s.is_alive()).count()
    }

    /// Fetch every server once and record the outcomes in server order.
    pub async fn poll_all(&mut self) {
        let fetcher = &self.fetcher;
        let timeout = self.fetch_timeout;

        let outcomes: Vec<Result<_, FetchError>> = stream::iter(self.servers.iter())
            .map(|server| async move {
                match time::timeout(timeout, fetcher.fetch(server.address())).await {
                    Ok(outcome) => outcome,
                    Err(_) => Err(FetchError::Timeout),
                }
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        for (server, outcome) in self.servers.iter_mut().zip(outcomes) {
            server.record(outcome);
        }
        self.cycles += 1;
    }

    /// One row per server, dead ones included.
    pub fn rows(&self) -> Vec<ServerRow<'_>> {
        self.servers
            .iter()
            .map(|server| ServerRow {
                server,
                engine: &self.engine,
            })
            .collect()
    }

    pub fn status_line(&self) -> String {
        format!(
            "regionwatch  {}/{} servers up  cycle {}  every {}  q:quit r:refresh",
            self.alive_count(),
            self.servers.len(),
            self.cycles,
            format_duration(self.period)
        )
    }

    /// Paint the current state in one refresh.
    pub fn render<B: Backend>(&self, renderer: &mut TabularRenderer<B>) -> Result<()> {
        renderer.set_title(Some(self.status_line()));
        renderer
            .update(&self.rows())
            .context("failed to paint the dashboard")
    }

    /// Run cycles until `Quit` arrives or the command channel closes.
    ///
    /// A `Quit` received mid-poll abandons the in-flight fetches. `Refresh`
    /// cuts the current sleep short.
    pub async fn run<B: Backend>(
        &mut self,
        renderer: &mut TabularRenderer<B>,
        commands: &mut UnboundedReceiver<Command>,
    ) -> Result<()> {
        info!(
            servers = self.servers.len(),
            interval = %format_duration(self.period),
            "poll loop started"
        );

        loop {
            let started = Instant::now();

            if !self.poll_until_done(commands).await {
                break;
            }
            self.render(renderer)?;
            debug!(
                cycle = self.cycles,
                alive = self.alive_count(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "cycle complete"
            );

            let remaining = self.period.saturating_sub(started.elapsed());
            tokio::select! {
                biased;
                () = time::sleep(remaining) => {}
                command = commands.recv() => match command {
                    Some(Command::Refresh) => debug!("refresh requested"),
                    Some(Command::Quit) | None => break,
                },
            }
        }

        info!(cycles = self.cycles, "poll loop stopped");
        Ok(())
    }

    /// Poll all servers, watching for `Quit` meanwhile. Returns false when
    /// the loop should stop.
    async fn poll_until_done(&mut self, commands: &mut UnboundedReceiver<Command>) -> bool {
        let poll = self.poll_all();
        tokio::pin!(poll);
        loop {
            tokio::select! {
                biased;
                () = &mut poll => return true,
                command = commands.recv() => match command {
                    Some(Command::Refresh) => continue,
                    Some(Command::Quit) | None => return false,
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, VecDeque};
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use ratatui::backend::TestBackend;
    use serde_json::{json, Value};
    use tokio::sync::mpsc;

    use crate::data::{MetricRegistry, DEAD, WAITING};
    use crate::ui::{Theme, CONTENT_ROW};

    /// Answers from a per-address script; an exhausted script means
    /// connection refused.
    #[derive(Debug, Default)]
    struct ScriptedFetcher {
        scripts: Mutex<HashMap<String, VecDeque<Result<Value, FetchError>>>>,
    }

    impl ScriptedFetcher {
        fn script(self, address: &str, outcomes: Vec<Result<Value, FetchError>>) -> Self {
            self.scripts
                .lock()
                .unwrap()
                .insert(address.to_string(), outcomes.into());
            self
        }
    }

    #[async_trait]
    impl MetricsFetcher for ScriptedFetcher {
        async fn fetch(&self, address: &str) -> Result<Value, FetchError> {
            self.scripts
                .lock()
                .unwrap()
                .get_mut(address)
                .and_then(|script| script.pop_front())
                .unwrap_or_else(|| Err(FetchError::Connect("refused".to_string())))
        }
    }

    /// Takes `delay` to answer every fetch.
    #[derive(Debug)]
    struct SlowFetcher {
        delay: Duration,
    }

    #[async_trait]
    impl MetricsFetcher for SlowFetcher {
        async fn fetch(&self, _address: &str) -> Result<Value, FetchError> {
            time::sleep(self.delay).await;
            Ok(json!({ "requests": 1, "ops": 1 }))
        }
    }

    fn engine() -> MetricEngine {
        let mut registry = MetricRegistry::new();
        registry.register_gauge("REQS", "requests").unwrap();
        registry.register_delta("OPS", "ops").unwrap();
        MetricEngine::new(Arc::new(registry))
    }

    fn servers(engine: &MetricEngine, hosts: &[&str]) -> Vec<RegionServer> {
        hosts
            .iter()
            .map(|h| RegionServer::new(*h, 60030, engine.registry()))
            .collect()
    }

    fn poll_loop<F: MetricsFetcher>(hosts: &[&str], fetcher: F) -> PollLoop<F> {
        let engine = engine();
        let servers = servers(&engine, hosts);
        PollLoop::new(servers, engine, fetcher, Duration::from_secs(10))
    }

    fn renderer() -> TabularRenderer<TestBackend> {
        let mut r = TabularRenderer::with_backend(TestBackend::new(60, 10), Theme::dark()).unwrap();
        r.add_column("REQS", None, None);
        r.add_column("OPS", None, None);
        r
    }

    fn line(r: &TabularRenderer<TestBackend>, y: u16) -> String {
        let buf = r.backend().buffer();
        let width = buf.area.width as usize;
        let start = y as usize * width;
        buf.content[start..start + width]
            .iter()
            .map(|c| c.symbol())
            .collect::<String>()
    }

    fn value(poll: &PollLoop<impl MetricsFetcher>, server: usize, metric: &str) -> String {
        poll.engine().get(&poll.servers()[server], metric).unwrap()
    }

    #[tokio::test]
    async fn test_poll_records_outcomes_in_order() {
        let fetcher = ScriptedFetcher::default()
            .script(
                "a:60030",
                vec![Ok(json!({"requests": 100, "ops": 10})), Ok(json!({"requests": 150, "ops": 25}))],
            )
            .script("b:60030", vec![Ok(json!({"requests": 7, "ops": 1}))]);
        let mut poll = poll_loop(&["a", "b"], fetcher);

        poll.poll_all().await;
        assert_eq!(value(&poll, 0, "REQS"), "100");
        assert_eq!(value(&poll, 0, "OPS"), WAITING);
        assert_eq!(value(&poll, 1, "REQS"), "7");

        poll.poll_all().await;
        assert_eq!(value(&poll, 0, "REQS"), "150");
        assert_eq!(value(&poll, 0, "OPS"), "15");
        assert_eq!(value(&poll, 1, "REQS"), DEAD);
        assert_eq!(poll.cycles(), 2);
        assert_eq!(poll.alive_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_server_times_out() {
        let fetcher = SlowFetcher {
            delay: Duration::from_secs(3600),
        };
        let mut poll = poll_loop(&["a"], fetcher).with_fetch_timeout(Duration::from_secs(5));

        let started = Instant::now();
        poll.poll_all().await;

        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(5) && elapsed < Duration::from_secs(6));
        assert!(!poll.servers()[0].is_alive());
        assert_eq!(value(&poll, 0, "REQS"), DEAD);
    }

    #[tokio::test(start_paused = true)]
    async fn test_servers_polled_concurrently() {
        let fetcher = SlowFetcher {
            delay: Duration::from_secs(1),
        };
        let mut poll = poll_loop(&["a", "b", "c", "d"], fetcher).with_concurrency(4);

        let started = Instant::now();
        poll.poll_all().await;

        assert!(started.elapsed() < Duration::from_secs(2));
        assert_eq!(poll.alive_count(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrency_bound() {
        let fetcher = SlowFetcher {
            delay: Duration::from_secs(1),
        };
        let mut poll = poll_loop(&["a", "b", "c", "d"], fetcher).with_concurrency(2);

        let started = Instant::now();
        poll.poll_all().await;

        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(2) && elapsed < Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_dead_servers_still_rendered() {
        let fetcher =
            ScriptedFetcher::default().script("a:60030", vec![Ok(json!({"requests": 42, "ops": 3}))]);
        let mut poll = poll_loop(&["a", "b"], fetcher);
        let mut r = renderer();

        poll.poll_all().await;
        poll.render(&mut r).unwrap();

        assert!(line(&r, 0).starts_with("regionwatch  1/2 servers up  cycle 1  every 10s"));
        let first = line(&r, CONTENT_ROW);
        assert!(first.contains("42"));
        assert!(first.contains("WAITING"));
        let second = line(&r, CONTENT_ROW + 1);
        assert_eq!(second.matches(DEAD).count(), 2);
    }

    #[tokio::test]
    async fn test_unknown_column_fails_render() {
        let mut poll = poll_loop(&["a"], ScriptedFetcher::default());
        let mut r = renderer();
        r.add_column("NOPE", None, None);

        poll.poll_all().await;
        assert!(poll.render(&mut r).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_quits_after_cycle() {
        let fetcher = ScriptedFetcher::default().script("a:60030", vec![Ok(json!({"requests": 5, "ops": 0}))]);
        let mut poll = poll_loop(&["a"], fetcher);
        let mut r = renderer();
        let (tx, mut rx) = mpsc::unbounded_channel();
        tx.send(Command::Quit).unwrap();

        poll.run(&mut r, &mut rx).await.unwrap();

        assert_eq!(poll.cycles(), 1);
        assert!(line(&r, CONTENT_ROW).contains('5'));
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_skips_sleep() {
        let mut poll = poll_loop(&["a"], ScriptedFetcher::default());
        let mut r = renderer();
        let (tx, mut rx) = mpsc::unbounded_channel();
        tx.send(Command::Refresh).unwrap();
        tx.send(Command::Quit).unwrap();

        let started = Instant::now();
        poll.run(&mut r, &mut rx).await.unwrap();

        assert_eq!(poll.cycles(), 2);
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_keeps_period() {
        let mut poll = poll_loop(&["a"], ScriptedFetcher::default());
        let mut r = renderer();
        let (tx, mut rx) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            time::sleep(Duration::from_secs(25)).await;
            let _ = tx.send(Command::Quit);
        });

        poll.run(&mut r, &mut rx).await.unwrap();

        // Cycles start at 0s, 10s and 20s.
        assert_eq!(poll.cycles(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_overrun_starts_next_cycle_immediately() {
        let fetcher = SlowFetcher {
            delay: Duration::from_secs(15),
        };
        let mut poll = poll_loop(&["a"], fetcher).with_fetch_timeout(Duration::from_secs(30));
        let mut r = renderer();
        let (tx, mut rx) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            time::sleep(Duration::from_secs(46)).await;
            let _ = tx.send(Command::Quit);
        });

        poll.run(&mut r, &mut rx).await.unwrap();

        // Polls run back to back at 0s, 15s and 30s; the one from 45s is
        // abandoned. Sleeping out a 10s period after each would allow only 2.
        assert_eq!(poll.cycles(), 3);
        assert!(poll.servers()[0].is_alive());
    }

    #[tokio::test(start_paused = true)]
    async fn test_quit_during_slow_poll() {
        let fetcher = SlowFetcher {
            delay: Duration::from_secs(60),
        };
        let mut poll = poll_loop(&["a"], fetcher).with_fetch_timeout(Duration::from_secs(30));
        let mut r = renderer();
        let (tx, mut rx) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            time::sleep(Duration::from_secs(1)).await;
            let _ = tx.send(Command::Quit);
        });

        let started = Instant::now();
        poll.run(&mut r, &mut rx).await.unwrap();

        assert_eq!(poll.cycles(), 0);
        assert!(started.elapsed() < Duration::from_secs(30));
    }
}
