use axum::{
    body::Bytes,
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast::Receiver as BroadcastReceiver;

use crate::api::validation::{self, ValidationErrors};
use crate::error::StoreError;
use crate::storage::WeatherReport;
use crate::AppState;

/// Errors a handler can answer with.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Store(e) => (
                StatusCode::NOT_FOUND,
                Json(serde_json::json!({ "message": e.to_string() })),
            )
                .into_response(),
            ApiError::Validation(ValidationErrors(errors)) => (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "errors": errors })),
            )
                .into_response(),
        }
    }
}

fn message(text: String) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": text }))
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/weather-api/cities/summary", get(summary_handler))
        .route(
            "/weather-api/cities/:city_id/reports",
            get(all_reports_handler)
                .post(add_report_handler)
                .delete(delete_reports_handler),
        )
        .route(
            "/weather-api/cities/:city_id/reports/latest",
            get(latest_report_handler).put(update_latest_handler),
        )
        .layer(Extension(state))
}

/// Serve on an already bound listener until `shutdown` fires.
pub async fn serve(
    listener: TcpListener,
    state: Arc<AppState>,
    mut shutdown: BroadcastReceiver<()>,
) -> anyhow::Result<()> {
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
        })
        .await?;
    tracing::info!("http server stopped");
    Ok(())
}

pub async fn run(
    state: Arc<AppState>,
    addr: SocketAddr,
    shutdown: BroadcastReceiver<()>,
) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);
    serve(listener, state, shutdown).await
}

async fn all_reports_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(city_id): Path<String>,
) -> Result<Json<Vec<WeatherReport>>, ApiError> {
    let store = state.store.lock().await;
    let reports = store.all_reports(&city_id)?.to_vec();
    Ok(Json(reports))
}

async fn add_report_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(city_id): Path<String>,
    body: Bytes,
) -> Result<Json<serde_json::Value>, ApiError> {
    let report = validation::parse_report(&body).map_err(|e| {
        tracing::debug!(city = %city_id, "rejected report: {}", e);
        e
    })?;
    {
        let mut store = state.store.lock().await;
        store.add_report(&city_id, report);
    }
    tracing::info!(city = %city_id, "report added");
    Ok(message(format!("Weather report added successfully for {}", city_id)))
}

async fn latest_report_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(city_id): Path<String>,
) -> Result<Json<WeatherReport>, ApiError> {
    let store = state.store.lock().await;
    let latest = store.latest_report(&city_id)?.clone();
    Ok(Json(latest))
}

async fn summary_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Json<HashMap<String, WeatherReport>> {
    let store = state.store.lock().await;
    Json(store.summary())
}

async fn update_latest_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(city_id): Path<String>,
    body: Bytes,
) -> Result<Json<serde_json::Value>, ApiError> {
    // body is checked before the city lookup
    let update = validation::parse_update(&body)?;
    {
        let mut store = state.store.lock().await;
        store.update_latest_report(&city_id, &update)?;
    }
    tracing::info!(city = %city_id, "latest report updated");
    Ok(message(format!("Latest weather report for {} updated successfully", city_id)))
}

async fn delete_reports_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(city_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    {
        let mut store = state.store.lock().await;
        store.delete_reports(&city_id)?;
    }
    tracing::info!(city = %city_id, "all reports deleted");
    Ok(message(format!("All weather reports deleted for {}", city_id)))
}
