use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::middleware;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use wordanalyzer::analyzer::default_workers;
use wordanalyzer::{AppState, Throttle, router, throttle};

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_ANALYSIS_FILE: &str = "es-wiki-abstracts.txt";
const DEFAULT_RATE_LIMIT_RPS: u32 = 5;
const DEFAULT_RATE_LIMIT_BURST: u32 = 10;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = load_config();
    info!("binding to {}:{}", config.host, config.port);
    info!(
        "corpus file {} with {} workers",
        config.file_path.display(),
        config.workers
    );
    info!(
        "rate limit: {} req/s (burst {})",
        config.rate_limit_rps, config.rate_limit_burst
    );
    if !config.file_path.exists() {
        warn!(
            "corpus file {} does not exist yet; /api/analyze will fail until it does",
            config.file_path.display()
        );
    }

    let state = AppState {
        file_path: Arc::new(config.file_path),
        workers: config.workers,
    };

    let limiter = Throttle::new(config.rate_limit_rps, config.rate_limit_burst);
    let app = router(state)
        .layer(middleware::from_fn_with_state(limiter, throttle::limit))
        .layer(TraceLayer::new_for_http());
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .expect("invalid listen address");
    let listener = TcpListener::bind(addr).await?;

    axum::serve(listener, app).await?;
    Ok(())
}

#[derive(Debug, Clone)]
struct Config {
    host: String,
    port: u16,
    file_path: PathBuf,
    workers: usize,
    rate_limit_rps: u32,
    rate_limit_burst: u32,
}

fn load_config() -> Config {
    let mut cli_file: Option<PathBuf> = None;
    let mut cli_workers: Option<usize> = None;
    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--file" => {
                if let Some(path) = args.next() {
                    cli_file = Some(PathBuf::from(path));
                }
            }
            "--workers" => {
                if let Some(n) = args.next() {
                    cli_workers = n.parse::<usize>().ok();
                }
            }
            _ => {
                if let Some(path) = arg.strip_prefix("--file=") {
                    cli_file = Some(PathBuf::from(path));
                } else if let Some(n) = arg.strip_prefix("--workers=") {
                    cli_workers = n.parse::<usize>().ok();
                }
            }
        }
    }

    let host = env::var("HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string());
    let port = env::var("PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(DEFAULT_PORT);
    let file_path = cli_file
        .or_else(|| env::var("ANALYSIS_FILE").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_ANALYSIS_FILE));
    let workers = cli_workers
        .or_else(|| {
            env::var("WORKERS")
                .ok()
                .and_then(|v| v.parse::<usize>().ok())
        })
        .filter(|v| *v > 0)
        .unwrap_or_else(default_workers);
    let rate_limit_rps = env::var("RATE_LIMIT_RPS")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(DEFAULT_RATE_LIMIT_RPS);
    let rate_limit_burst = env::var("RATE_LIMIT_BURST")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(DEFAULT_RATE_LIMIT_BURST);

    Config {
        host,
        port,
        file_path,
        workers,
        rate_limit_rps,
        rate_limit_burst,
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_level(true)
        .init();
}
