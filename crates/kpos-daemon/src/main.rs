//! kpos-daemon entry point.
//!
//! Sets up tracing, config and shared state, wires middleware, serves. Route
//! handlers live in `routes.rs`; shared state lives in `state.rs`.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::{anyhow, Context};
use axum::http::{HeaderValue, Method};
use kpos_cart::{JsonFileCartStore, MemoryCartStore};
use kpos_catalog::JsonFileCatalogSource;
use kpos_config::{report_unused_keys, ConfigMode, EngineSettings, UnusedKeyPolicy};
use kpos_daemon::{routes, state};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::{info, warn, Level};

const ENV_CONFIG_PATHS: &str = "KPOS_CONFIG_PATHS";
const ENV_DAEMON_ADDR: &str = "KPOS_DAEMON_ADDR";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Dev convenience; production injects env vars directly.
    let _ = dotenvy::from_filename(".env.local");

    init_tracing();

    let settings = load_settings()?;
    let catalog_path = settings
        .catalog_path
        .clone()
        .ok_or_else(|| anyhow!("/catalog/path must be set to run the daemon"))?;
    let catalog_source: state::SharedCatalogSource =
        Arc::new(JsonFileCatalogSource::new(&catalog_path));

    let cart_store: state::SharedCartStore = match &settings.cart_dir {
        Some(dir) => Arc::new(
            JsonFileCartStore::open(dir)
                .with_context(|| format!("open cart store at {}", dir.display()))?,
        ),
        None => {
            warn!("no /persistence/cart_dir configured; carts live in memory only");
            Arc::new(MemoryCartStore::new())
        }
    };

    let shared = Arc::new(state::AppState::new(settings, catalog_source, cart_store));

    // A missing catalog is not fatal: adds answer 503 until a reload works.
    if let Err(e) = shared.reload_catalog().await {
        warn!(error = %e, path = %catalog_path.display(), "starting without a catalog snapshot");
    }

    state::spawn_idle_sweep(Arc::clone(&shared), Duration::from_secs(30));

    let app = routes::build_router(Arc::clone(&shared))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_localhost_only());

    let addr = bind_addr_from_env().unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], 8787)));
    info!("kpos-daemon listening on http://{}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server crashed")?;

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}

/// `KPOS_CONFIG_PATHS` is a comma-separated list of YAML files in merge
/// order. Unset means built-in defaults.
fn load_settings() -> anyhow::Result<EngineSettings> {
    let raw = match std::env::var(ENV_CONFIG_PATHS) {
        Ok(v) if !v.trim().is_empty() => v,
        _ => {
            info!("{ENV_CONFIG_PATHS} not set; using default settings");
            return Ok(EngineSettings::default());
        }
    };
    let paths: Vec<&str> = raw
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();
    let loaded = kpos_config::load_layered_yaml(&paths)?;
    info!(config_hash = %loaded.config_hash, "config loaded");

    let report = report_unused_keys(ConfigMode::Kiosk, &loaded.config_json, UnusedKeyPolicy::Warn)?;
    for ptr in &report.unused_leaf_pointers {
        let layer = loaded.origin_of(ptr).and_then(|i| paths.get(i).copied());
        warn!(pointer = %ptr, layer = layer.unwrap_or("?"), "unused config key");
    }

    EngineSettings::from_config_json(&loaded.config_json)
}

fn bind_addr_from_env() -> Option<SocketAddr> {
    std::env::var(ENV_DAEMON_ADDR).ok()?.parse().ok()
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "ctrl-c handler failed; shutting down");
    }
    info!("shutdown requested");
}

/// CORS: allow only localhost origins (kiosk and kitchen screens run on the
/// same box as the daemon).
fn cors_localhost_only() -> CorsLayer {
    let allowed_origins = [
        "http://localhost",
        "http://127.0.0.1",
        "http://localhost:3000",
        "http://127.0.0.1:3000",
        "http://localhost:5173",
        "http://127.0.0.1:5173",
    ];

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers(tower_http::cors::Any)
}
