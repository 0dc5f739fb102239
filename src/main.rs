//! sitewatch - website availability monitor
//!
//! Probes a list of URLs on their own intervals, keeps 2/10/60 minute
//! histories of the results and raises an alert whenever an endpoint's
//! 2-minute availability crosses 80%.

mod config;
mod db;
mod monitor;
mod probe;
mod report;
mod scheduler;
mod web;

use config::ServerConfig;
use db::{EndpointConfig, Store};
use probe::HttpProber;
use report::Reporter;
use scheduler::Scheduler;
use web::Server;

use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Site that answers successfully about 80% of the time.
const UNAVAILABLE_DEMO_URL: &str = "https://random-res-app.herokuapp.com/";

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Parser)]
#[command(name = "sitewatch")]
#[command(about = "Monitor website availability and response times")]
#[command(version)]
struct Cli {
    /// Path to the SQLite database (overrides SITEWATCH_DB_PATH)
    #[arg(long, global = true)]
    db: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Add a website to monitor, along with its check interval in seconds
    Add {
        url: String,
        #[arg(value_parser = clap::value_parser!(u32).range(1..))]
        check_interval: u32,
        /// Save the URL without checking that it answers
        #[arg(long)]
        no_verify: bool,
    },
    /// Add a website that is available only about 80% of the time
    AddUnavailable {
        #[arg(value_parser = clap::value_parser!(u32).range(1..), default_value_t = 7)]
        check_interval: u32,
    },
    /// List the monitored websites
    List,
    /// Stop monitoring a website
    Delete { url: String },
    /// Probe every website and print stats and alerts periodically
    Monitor {
        /// Don't serve the JSON API
        #[arg(long)]
        no_web: bool,
        /// JSON API port (overrides SITEWATCH_HTTP_PORT)
        #[arg(long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let cli = Cli::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("sitewatch=info".parse()?))
        .init();

    // Load configuration
    let mut cfg = load_config(cli.db);
    tracing::debug!("Using database at {}", cfg.db_path);

    let store = Store::new(&cfg.db_path)?;

    match cli.command {
        Command::Add {
            url,
            check_interval,
            no_verify,
        } => add_endpoint(&cfg, &store, url, check_interval, !no_verify).await,
        Command::AddUnavailable { check_interval } => {
            println!("This adds {} which is available about 80% of the time", UNAVAILABLE_DEMO_URL);
            add_endpoint(&cfg, &store, UNAVAILABLE_DEMO_URL.to_string(), check_interval, false).await
        }
        Command::List => list_endpoints(&store),
        Command::Delete { url } => delete_endpoint(&store, &url),
        Command::Monitor { no_web, port } => {
            if let Some(port) = port {
                cfg.http_port = port;
            }
            monitor(cfg, store, !no_web).await
        }
    }
}

fn load_config(db_path: Option<String>) -> ServerConfig {
    let mut cfg = ServerConfig::load();
    if let Some(db_path) = db_path {
        cfg.db_path = db_path;
    }
    cfg
}

async fn add_endpoint(
    cfg: &ServerConfig,
    store: &Store,
    url: String,
    check_interval: u32,
    verify: bool,
) -> Result<(), BoxError> {
    probe::parse_url(&url)?;
    if verify && !probe::verify_url(&url, cfg.probe_timeout).await {
        return Err(format!("{} doesn't lead to any working website", url).into());
    }

    let mut endpoint = EndpointConfig::new(url, check_interval);
    store.add_endpoint(&mut endpoint)?;
    println!("New website successfully added: {} every {}s", endpoint.url, endpoint.check_interval_secs);
    Ok(())
}

fn list_endpoints(store: &Store) -> Result<(), BoxError> {
    print!("{}", format_endpoints(&store.get_endpoints()?));
    Ok(())
}

fn format_endpoints(endpoints: &[EndpointConfig]) -> String {
    if endpoints.is_empty() {
        return "You haven't saved any websites yet...\n".to_string();
    }

    let mut out = String::from("Your websites are:\n");
    for endpoint in endpoints {
        out.push_str(&format!(
            "- {} --- Check Interval : {} seconds\n",
            endpoint.url, endpoint.check_interval_secs
        ));
    }
    out
}

fn delete_endpoint(store: &Store, url: &str) -> Result<(), BoxError> {
    if store.delete_endpoint_by_url(url)? {
        println!("Website {} successfully deleted", url);
    } else {
        println!("Website {} is not monitored", url);
    }
    Ok(())
}

async fn monitor(cfg: ServerConfig, store: Store, serve_web: bool) -> Result<(), BoxError> {
    let endpoints = store.get_endpoints()?;
    if endpoints.is_empty() {
        println!("You haven't selected any websites yet. Run `sitewatch add` to do so");
        return Ok(());
    }

    list_endpoints(&store)?;

    let slowest = endpoints.iter().map(|e| e.check_interval_secs).max().unwrap_or(0);
    let report_secs = cfg.short_report_interval.as_secs().max(1);
    if u64::from(slowest) >= report_secs {
        tracing::warn!(
            "Some check intervals are at least {}s, so the first {} tables will show NaN values",
            report_secs,
            u64::from(slowest) / report_secs
        );
    }

    let scheduler = Arc::new(Scheduler::new(HttpProber::new(cfg.probe_timeout)?));
    scheduler.start(endpoints).await;

    let reporter = Reporter::new(cfg.short_report_interval, cfg.long_report_interval);
    let reporting = {
        let scheduler = scheduler.clone();
        tokio::spawn(async move { reporter.run(scheduler).await })
    };

    if serve_web {
        let server = Server::new(cfg, store, scheduler.clone());
        tokio::spawn(async move {
            if let Err(e) = server.start().await {
                tracing::error!("Web server stopped: {}", e);
            }
        });
    }

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down");

    reporting.abort();
    scheduler.shutdown().await;
    Ok(())
}
