// src/routes/health.rs
//! Liveness endpoint of the command listener.
//!
//! Answers as long as the current connection epoch is running; the listener
//! is torn down with everything else on reconnect.

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use super::CommandState;
use crate::client::AccountSession;
use crate::notify::AlertSink;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    vehicles: usize,
}

/// Handle `GET /health`. Never touches the vehicle backend.
async fn health<A, N>(State(state): State<CommandState<A, N>>) -> Json<HealthResponse>
where
    A: AccountSession,
    N: AlertSink + ?Sized,
{
    Json(HealthResponse {
        status: "ok",
        vehicles: state.config.cars.len(),
    })
}

pub fn router<A, N>() -> Router<CommandState<A, N>>
where
    A: AccountSession,
    N: AlertSink + ?Sized,
{
    Router::new().route("/health", get(health::<A, N>))
}
