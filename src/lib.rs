use std::sync::Arc;
use tokio::sync::Mutex;
pub mod api;
pub mod config;
pub mod error;
pub mod storage;

pub use config::Config;
pub use error::StoreError;
pub use storage::{ReportStore, WeatherReport, WeatherReportUpdate};

/// State shared by every request handler. One lock covers each store
/// operation, including find-latest-then-mutate on update.
#[derive(Debug, Default)]
pub struct AppState {
    pub store: Mutex<ReportStore>,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            store: Mutex::new(ReportStore::new()),
        }
    }
}

pub async fn run_server(config: Config) -> anyhow::Result<()> {
    let state = Arc::new(AppState::new());

    // broadcast channel for shutdown signaling
    let (shutdown_tx, _) = tokio::sync::broadcast::channel::<()>(1);

    let http_state = state.clone();
    let http_shutdown = shutdown_tx.subscribe();
    let addr = config.bind_addr();
    let mut server = tokio::spawn(async move {
        api::http::run(http_state, addr, http_shutdown).await
    });

    // stop on CTRL-C or when the server exits by itself (e.g. bind failure)
    tokio::select! {
        res = tokio::signal::ctrl_c() => {
            res?;
            tracing::info!("shutdown requested");
            let _ = shutdown_tx.send(());
        }
        res = &mut server => {
            return res?;
        }
    }
    server.await??;

    let store = state.store.lock().await;
    tracing::info!(cities = store.city_count(), "in-memory reports discarded");
    Ok(())
}
