use std::str::FromStr;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tracing::{info, warn};

use shoal_metrics::model::MetricKind;
use shoal_metrics::{MetricsPoller, REFRESH_INTERVAL};
use shoal_search::Debouncer;
use shoal_stream::{Dispatcher, LogFilter};

mod view;
use view::TermView;

#[derive(Parser, Debug)]
#[command(name = "shoal", version, about = "Shoal cluster dashboard client")]
struct Cli {
    /// Push channel endpoint
    #[arg(long = "server", env = "SHOAL_SERVER", default_value = "ws://127.0.0.1:8080/ws")]
    server: String,

    /// Metrics endpoint; polling is off when unset
    #[arg(long = "metrics-url", env = "SHOAL_METRICS_URL")]
    metrics_url: Option<String>,

    /// Show only one metric kind (counter, gauge, untyped, histogram, summary)
    #[arg(long = "metrics-type")]
    metrics_type: Option<String>,

    /// Subscribe to live logs at startup
    #[arg(long = "follow-logs", action = ArgAction::SetTrue)]
    follow_logs: bool,

    /// Historical log window start (RFC3339); required without --follow-logs
    #[arg(long = "log-start")]
    log_start: Option<String>,

    /// Historical log window end (RFC3339)
    #[arg(long = "log-end")]
    log_end: Option<String>,

    /// Cluster to include in the log subscription (repeatable)
    #[arg(long = "log-cluster")]
    log_clusters: Vec<String>,

    /// Cluster to stream events for (repeatable)
    #[arg(long = "event-cluster")]
    event_clusters: Vec<String>,

    /// Max results per search panel
    #[arg(long = "limit", default_value_t = 20)]
    limit: usize,

    /// Disable ANSI highlighting in search results
    #[arg(long = "no-color", action = ArgAction::SetTrue)]
    no_color: bool,
}

fn init_tracing() {
    let env = std::env::var("SHOAL_LOG").unwrap_or_else(|_| "info".to_string());
    let filter = tracing_subscriber::EnvFilter::from_str(&env)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(true).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut channel = shoal_wire::connect(&cli.server)
        .await
        .with_context(|| format!("connecting to {}", cli.server))?;

    let metric_kind = match cli.metrics_type.as_deref() {
        Some(t) => Some(
            MetricKind::parse(&t.to_uppercase())
                .with_context(|| format!("unknown metrics type: {t}"))?,
        ),
        None => None,
    };

    let mut dispatcher = Dispatcher::new();
    let view = TermView::new(!cli.no_color, metric_kind);

    if cli.follow_logs || cli.log_start.is_some() {
        let filter = LogFilter {
            follow: cli.follow_logs,
            start_time: cli.log_start.clone(),
            end_time: cli.log_end.clone(),
            clusters: cli.log_clusters.clone(),
        };
        let (ops, request) = dispatcher.enable_logs(&filter)?;
        view.apply(&ops);
        let _ = channel.outbound.send(request);
    }
    if !cli.event_clusters.is_empty() {
        let (ops, request) = dispatcher.select_event_clusters(cli.event_clusters.clone());
        view.apply(&ops);
        let _ = channel.outbound.send(request);
    }

    let mut poller = cli.metrics_url.as_ref().map(|url| MetricsPoller::new(url.clone()));
    let mut refresh = tokio::time::interval(REFRESH_INTERVAL);
    refresh.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    let mut debouncer = Debouncer::new();
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    info!(server = %cli.server, "shoal running; type to search, ctrl-c to quit");

    loop {
        let flush_at = dispatcher.next_deadline();
        let search_at = debouncer.next_deadline();
        tokio::select! {
            maybe = channel.inbound.recv() => match maybe {
                Some(msg) => {
                    let ops = dispatcher.handle(msg, Instant::now());
                    view.apply(&ops);
                }
                None => {
                    warn!("push channel disconnected");
                    break;
                }
            },
            _ = tokio::time::sleep_until(flush_at.unwrap_or_else(Instant::now).into()),
                if flush_at.is_some() =>
            {
                let ops = dispatcher.flush_due(Instant::now());
                view.apply(&ops);
            }
            _ = tokio::time::sleep_until(search_at.unwrap_or_else(Instant::now).into()),
                if search_at.is_some() =>
            {
                if let Some(query) = debouncer.take_due(Instant::now()) {
                    run_search(&view, &dispatcher, poller.as_ref(), &query, cli.limit);
                }
            }
            _ = refresh.tick(), if poller.is_some() => {
                if let Some(p) = poller.as_mut() {
                    let ops = p.poll_once().await;
                    view.apply_cards(&ops);
                }
            }
            line = stdin.next_line(), if stdin_open => match line {
                Ok(Some(text)) => debouncer.input(&text, Instant::now()),
                Ok(None) => stdin_open = false,
                Err(e) => {
                    warn!(error = %e, "stdin read failed");
                    stdin_open = false;
                }
            },
            _ = signal::ctrl_c() => {
                info!("shutting down");
                break;
            }
        }
    }

    // Best-effort teardown so the server drops both streams promptly.
    let (_, request) = dispatcher.disable_logs();
    let _ = channel.outbound.send(request);
    let (_, request) = dispatcher.select_event_clusters(Vec::new());
    let _ = channel.outbound.send(request);
    Ok(())
}

fn run_search(
    view: &TermView,
    dispatcher: &Dispatcher,
    poller: Option<&MetricsPoller>,
    query: &str,
    limit: usize,
) {
    view.show_hits(
        "logs",
        dispatcher.logs_index(),
        dispatcher.search_logs(query, limit).as_deref(),
    );
    view.show_hits(
        "events",
        dispatcher.events_index(),
        dispatcher.search_events(query, limit).as_deref(),
    );
    if let Some(p) = poller {
        view.show_hits("metrics", p.index(), p.search(query, limit).as_deref());
    }
}
