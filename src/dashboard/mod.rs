//! Read-only HTTP surface over the snapshot store. Handlers never fetch;
//! they render whatever snapshot is current.

mod direction;
mod page;

pub use direction::{primary_direction, Direction};

use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::{extract::State, response::Html, routing::get, Json, Router};
use chrono::Local;
use log::info;
use serde::Serialize;
use tokio::net::TcpListener;

use crate::models::Snapshot;
use crate::store::SnapshotStore;

#[derive(Serialize)]
struct StatusResponse {
    primary: Direction,
    #[serde(flatten)]
    snapshot: Snapshot,
}

#[derive(Clone)]
struct DashboardState {
    store: SnapshotStore,
    /// Page reload period, matching the aggregation interval.
    refresh_secs: u64,
}

pub fn router(store: SnapshotStore, refresh: Duration) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/status", get(status))
        .with_state(DashboardState {
            store,
            refresh_secs: refresh.as_secs(),
        })
}

async fn index(State(state): State<DashboardState>) -> Html<String> {
    let snapshot = state.store.read();
    Html(page::render(
        &snapshot,
        primary_direction(Local::now().time()),
        state.refresh_secs,
    ))
}

async fn status(State(state): State<DashboardState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        primary: primary_direction(Local::now().time()),
        snapshot: (*state.store.read()).clone(),
    })
}

/// Serve the dashboard on `addr` until `shutdown` resolves.
pub async fn serve<F>(
    store: SnapshotStore,
    addr: SocketAddr,
    refresh: Duration,
    shutdown: F,
) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind dashboard on {addr}"))?;
    info!("dashboard listening on http://{addr}");

    axum::serve(listener, router(store, refresh))
        .with_graceful_shutdown(shutdown)
        .await
        .context("dashboard server failed")
}
