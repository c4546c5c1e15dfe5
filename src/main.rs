//! MAR-Search: run one search from the command line
//!
//! This is the main entry point for the application.

use anyhow::{bail, Context, Result};
use futures::TryStreamExt;
use mar_search::metrics::ClientMetrics;
use mar_search::{
    config, AndClause, Condition, HttpTransport, MarClient, MarError, Predicate, Projection,
    ResultOptions, SearchRequest, SortDirection,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

/// Parsed command line
#[derive(Debug, Default)]
struct Args {
    config: Option<PathBuf>,
    projections: Vec<Projection>,
    predicates: Vec<Predicate>,
    sort_by: Option<String>,
    ascending: bool,
    filter: String,
    page_size: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = match parse_args(std::env::args().skip(1))? {
        Some(args) => args,
        None => return Ok(()),
    };

    // Load configuration
    let (settings, source) = config::load(args.config.clone())?;

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.logging.level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    info!("Starting MAR-Search v{}", mar_search::VERSION);
    match source {
        Some(path) => info!("Loaded settings from: {}", path.display()),
        None => info!("No settings file found, using defaults"),
    }

    let transport = HttpTransport::with_settings(&settings.gateway)
        .context("failed to create gateway transport")?;
    let client = MarClient::from_settings(Arc::new(transport), &settings.client)?;
    info!("Searching via {} on topic {}", settings.gateway.url, client.topic());

    // Stop polling on Ctrl-C
    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling search");
            on_signal.cancel();
        }
    });

    let mut request = SearchRequest::new(args.projections, None);
    if !args.predicates.is_empty() {
        request = request.filter(Condition::new().or(AndClause::from(args.predicates)));
    }

    let ctx = match client.search_with_cancellation(&request, &cancel).await {
        Ok(ctx) => ctx,
        Err(e) => {
            report_failure(&e);
            log_metrics(client.metrics());
            return Err(e.into());
        }
    };
    info!(
        "Search {} finished: {} results, {} errors, {}/{} hosts",
        ctx.search_id(),
        ctx.result_count(),
        ctx.error_count(),
        ctx.host_count(),
        ctx.subscribed_host_count()
    );
    if !ctx.has_results() {
        println!("No results");
        log_metrics(client.metrics());
        return Ok(());
    }

    let mut options = ResultOptions::new().text_filter(args.filter);
    if let Some(sort_by) = args.sort_by {
        options = options.sort_by(sort_by);
    }
    if args.ascending {
        options = options.sort_direction(SortDirection::Asc);
    }

    let page_size = args.page_size.unwrap_or(settings.client.page_size);
    let mut pages = Box::pin(ctx.pages(page_size, options));
    while let Some(page) = pages.try_next().await? {
        for item in &page.items {
            println!("{}", serde_json::to_string(item)?);
        }
    }

    log_metrics(client.metrics());
    Ok(())
}

fn report_failure(err: &MarError) {
    if err.is_remote() {
        match err.remote_code() {
            Some(code) => error!("Search service rejected the request with code {}", code),
            None => error!("Search service rejected the request"),
        }
    }
}

/// Per-operation call statistics at debug level
fn log_metrics(metrics: &ClientMetrics) {
    for stats in metrics.snapshot() {
        if stats.calls == 0 {
            continue;
        }
        debug!(
            "{}: {} calls, {} errors, {:.1}% ok, avg {}ms",
            stats.operation,
            stats.calls,
            stats.errors,
            metrics.reliability(stats.operation),
            stats.avg_latency_ms.unwrap_or(0)
        );
    }
}

/// Parse arguments; `None` means help or version was printed
fn parse_args<I>(args: I) -> Result<Option<Args>>
where
    I: IntoIterator<Item = String>,
{
    let mut parsed = Args::default();
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                print_usage();
                return Ok(None);
            }
            "-V" | "--version" => {
                println!("mar-search {}", mar_search::VERSION);
                return Ok(None);
            }
            "-c" | "--config" => parsed.config = Some(PathBuf::from(value(&mut args, &arg)?)),
            "-w" | "--where" => parsed
                .predicates
                .push(value(&mut args, &arg)?.parse().map_err(anyhow::Error::msg)?),
            "--sort-by" => parsed.sort_by = Some(value(&mut args, &arg)?),
            "--asc" => parsed.ascending = true,
            "--filter" => parsed.filter = value(&mut args, &arg)?,
            "--page-size" => {
                let size: u64 = value(&mut args, &arg)?
                    .parse()
                    .context("--page-size expects a number")?;
                if size == 0 {
                    bail!("--page-size must be positive");
                }
                parsed.page_size = Some(size);
            }
            flag if flag.starts_with('-') => bail!("unknown option '{}'", flag),
            projection => parsed
                .projections
                .push(projection.parse().map_err(anyhow::Error::msg)?),
        }
    }

    if parsed.projections.is_empty() {
        print_usage();
        bail!("at least one projection is required");
    }
    Ok(Some(parsed))
}

fn value<I: Iterator<Item = String>>(args: &mut I, flag: &str) -> Result<String> {
    args.next()
        .with_context(|| format!("{} expects a value", flag))
}

/// Print usage information
fn print_usage() {
    println!(
        r#"
MAR-Search v{}
Run a search against the Active Response search service

USAGE:
    mar-search [OPTIONS] PROJECTION...

PROJECTION:
    Collector                 all outputs of a collector
    Collector:out1,out2       selected outputs

OPTIONS:
    -c, --config <FILE>       Path to configuration file
    -w, --where <PREDICATE>   Collector|output|OPERATOR|value (prefix ! to negate);
                              repeated predicates are combined with AND
        --sort-by <KEY>       Sort key, e.g. count or Processes|name
        --asc                 Sort ascending (default descending)
        --filter <TEXT>       Free-text result filter
        --page-size <N>       Items fetched per page
    -h, --help                Print help information
    -V, --version             Print version information

ENVIRONMENT VARIABLES:
    MAR_SETTINGS_PATH         Path to settings file
    MAR_GATEWAY_URL           Fabric gateway URL
    MAR_TOPIC                 Search service topic
    MAR_POLL_INTERVAL         Seconds between status checks (>= 5)
    MAR_MAX_WAIT              Seconds before an unfinished search times out
    MAR_LOG_LEVEL             Log filter when RUST_LOG is unset
"#,
        mar_search::VERSION
    );
}
