mod envelope;
mod handlers;
mod state;

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use anyhow::Context;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use log::{error, info, warn};
use structopt::StructOpt;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

use derma_serve::config::Config;
use derma_serve::store::BlobStore;
use derma_serve::{fetch, Error, ImageClassifier};

use crate::handlers::MAX_UPLOAD_BYTES;
use crate::state::AppState;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "derma-api",
    about = "HTTP service for binary skin lesion classification"
)]
struct Opt {
    /// Port to serve on; overrides the PORT environment variable
    #[structopt(short, long)]
    port: Option<u16>,

    /// Model artifact cache directory; overrides MODEL_CACHE_DIR
    #[structopt(long, parse(from_os_str))]
    cache_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let opt = Opt::from_args();

    let mut config = Config::from_env().context("reading configuration")?;
    if let Some(port) = opt.port {
        config.port = port;
    }
    if let Some(dir) = opt.cache_dir {
        config.model_cache_dir = dir;
    }

    let (blob, documents) = derma_serve::store::connect(&config)
        .await
        .context("connecting to stores")?;

    // Histories must work while the model is still loading, so this probe is
    // logged but never fatal.
    match documents.list(&config.prediction_collection).await {
        Ok(docs) => info!(
            "document store reachable, {} predictions stored",
            docs.len()
        ),
        Err(err) => warn!("document store probe failed: {err}"),
    }

    let state = Arc::new(AppState::new(
        documents,
        config.prediction_collection.clone(),
    ));

    let api = Router::new()
        .route("/predict", post(handlers::predict))
        .route("/predict/histories", get(handlers::histories))
        .route("/health", get(handlers::health));

    let app = Router::new()
        .nest("/api", api)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES as usize))
        .layer(CorsLayer::permissive())
        .with_state(Arc::clone(&state));

    // Fetching the artifacts and parsing the graph can take a while; serve
    // history traffic in the meantime. A load failure is fatal: the process
    // must not keep serving with no model.
    let cache_dir = config.model_cache_dir.clone();
    let loader_state = Arc::clone(&state);
    tokio::spawn(async move {
        if let Err(err) = load_model(&blob, &cache_dir, &loader_state).await {
            error!("model load failed: {err}");
            process::exit(1);
        }
    });

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("listening on {addr}");
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn load_model(
    blob: &BlobStore,
    cache_dir: &Path,
    state: &AppState,
) -> derma_serve::error::Result<()> {
    fetch::fetch_model(blob, cache_dir).await?;

    let dir = cache_dir.to_path_buf();
    let classifier = tokio::task::spawn_blocking(move || ImageClassifier::load(&dir))
        .await
        .map_err(|err| Error::Upstream(err.to_string()))??;

    if state.classifier.set(classifier).is_err() {
        warn!("model was already loaded");
    }
    info!("model loaded, predictions enabled");
    Ok(())
}
