use std::{
    error::Error,
    net::SocketAddr,
    path::{Path, PathBuf},
    sync::Arc,
};

use axum::{
    Router,
    extract::{MatchedPath, Request},
};
use axum_server::Handle;
use clap::Parser;
use tower_http::trace::TraceLayer;
use tracing_subscriber::filter::LevelFilter;

use household_budget::{
    AppState, DirectoryStorage, TRANSACTIONS_API, build_router, graceful_shutdown, setup_logging,
};

/// The mirror server for household_budget.
///
/// Keeps a copy of every date bucket as a JSON file in a directory.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Directory that the mirrored `transactions_<date>.json` files are written to.
    #[arg(long, env = "BUDGET_DATA_DIR", default_value = "/tmp/budget-data")]
    data_dir: PathBuf,

    /// The port to serve the API from.
    #[arg(short, long, env = "PORT", default_value_t = 3000)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    setup_logging(LevelFilter::INFO, Path::new("debug.log"))?;

    let args = Args::parse();

    let addr = SocketAddr::from(([127, 0, 0, 1], args.port));

    let storage = DirectoryStorage::new(&args.data_dir)?;
    let state = AppState::new(Arc::new(storage));

    let handle = Handle::new();
    tokio::spawn(graceful_shutdown(handle.clone()));

    let router = add_tracing_layer(build_router(state));

    tracing::info!(
        "Mirror server listening on http://{addr}{TRANSACTIONS_API}, writing to {}",
        args.data_dir.display()
    );
    axum_server::bind(addr)
        .handle(handle)
        .serve(router.into_make_service())
        .await?;

    Ok(())
}

fn add_tracing_layer(router: Router) -> Router {
    let tracing_layer = TraceLayer::new_for_http()
        .make_span_with(|req: &Request| {
            let method = req.method();
            let uri = req.uri();

            let matched_path = req
                .extensions()
                .get::<MatchedPath>()
                .map(|matched_path| matched_path.as_str());

            tracing::debug_span!("request", %method, %uri, matched_path)
        })
        // Errors are logged where they are converted into responses.
        .on_failure(());

    router.layer(tracing_layer)
}
