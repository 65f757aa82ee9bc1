//! HTTP gateway for the command trigger listener.
//!
//! Sibling modules each export a subrouter; this module merges them and
//! binds the listener so the supervisor never sees individual endpoints.
use std::{net::SocketAddr, sync::Arc};

use axum::Router;
use tokio::net::TcpListener;

use crate::client::AccountSession;
use crate::config::FleetConfig;
use crate::notify::AlertSink;

mod health;
mod hvac;

pub use hvac::{CommandResponse, HvacRequest};

// ---

/// Shared state of the command routes for one connection epoch.
pub struct CommandState<A, N: ?Sized> {
    pub account: Arc<A>,
    pub config: Arc<FleetConfig>,
    pub notifier: Arc<N>,
}

impl<A, N: ?Sized> Clone for CommandState<A, N> {
    fn clone(&self) -> Self {
        Self {
            account: self.account.clone(),
            config: self.config.clone(),
            notifier: self.notifier.clone(),
        }
    }
}

pub fn router<A, N>(state: CommandState<A, N>) -> Router
where
    A: AccountSession,
    N: AlertSink + ?Sized,
{
    // ---
    Router::new()
        .merge(hvac::router())
        .merge(health::router())
        .with_state(state)
}

/// Bind `addr` and serve the command routes until the task is cancelled.
pub async fn serve<A, N>(addr: SocketAddr, state: CommandState<A, N>) -> std::io::Result<()>
where
    A: AccountSession,
    N: AlertSink + ?Sized,
{
    // ---
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Command listener started at http://{}", listener.local_addr()?);
    axum::serve(listener, router(state)).await
}
