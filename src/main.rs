mod cli;
mod dataset;
mod handlers;
mod http;
mod init;
mod loader;
mod models;
mod ranker;

use std::sync::Arc;

use clap::Parser;

use cli::Commands;
use dataset::Dataset;
use handlers::Ctx;
use ranker::ScanRanker;

#[cfg(target_env = "musl")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() {
    init::init_logger();

    let cli = cli::Cli::parse();

    // Handle CLI flags.
    if let Some(cmd) = cli.command {
        match cmd {
            // Generate a new config file.
            Commands::NewConfig { path } => {
                match init::generate_config(&path) {
                    Ok(_) => {
                        log::info!("config file generated: {}", path.display());
                    }
                    Err(e) => {
                        log::error!("error generating config: {}", e);
                        std::process::exit(1);
                    }
                }
                return;
            }

            // Load the dataset and report its stats.
            Commands::Check => {
                let config = init::init_config(&cli.config);
                match Dataset::initialize(&config.data) {
                    Ok(ds) => {
                        log::info!("dataset OK: {} cities", ds.len());
                    }
                    Err(e) => {
                        log::error!("error loading dataset: {}", e);
                        std::process::exit(1);
                    }
                }
                return;
            }
        }
    }

    // Load config.
    let config = init::init_config(&cli.config);

    // Build the immutable dataset before accepting any queries. A load
    // failure aborts startup; the service never runs with partial data.
    let dataset = match Dataset::initialize(&config.data) {
        Ok(ds) => Arc::new(ds),
        Err(e) => {
            log::error!("error loading dataset: {}", e);
            std::process::exit(1);
        }
    };

    if dataset.is_empty() {
        log::warn!("dataset contains no cities; all queries will return empty results");
    }

    // Setup the global app context used in HTTP handlers.
    let ctx = Arc::new(Ctx {
        ranker: Arc::new(ScanRanker::new(dataset)),
    });

    // Start the HTTP server.
    let routes = http::init_handlers(ctx);
    let addr = config.app.address;

    log::info!("starting server on {}", addr);

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            log::error!("error listening on {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    if let Err(e) = axum::serve(listener, routes).await {
        log::error!("server error: {}", e);
        std::process::exit(1);
    }
}
