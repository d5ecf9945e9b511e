//! a small http server holding a quote collection in memory.
//!
//! it speaks the protocol [`crate::remote::QuoteServerClient`] expects and is
//! used as the sync target during development and in tests.

use std::{net::SocketAddr, sync::Arc};

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use tokio::sync::{oneshot, RwLock};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::Instrument;

use crate::{
    error::Result,
    models::{
        quotes::{seed_quotes, Quote},
        remote::PushResponse,
    },
};

type SharedQuotes = Arc<RwLock<Vec<Quote>>>;

/// the collection a fresh server starts with, ids 1 to 3.
pub fn initial_quotes() -> Vec<Quote> {
    seed_quotes()
        .into_iter()
        .zip(1..)
        .map(|(quote, id)| Quote {
            id: Some(id),
            ..quote
        })
        .collect()
}

#[tracing::instrument(skip_all)]
async fn list_quotes(State(quotes): State<SharedQuotes>) -> Json<Vec<Quote>> {
    Json(quotes.read().await.clone())
}

#[tracing::instrument(skip_all)]
async fn replace_quotes(
    State(quotes): State<SharedQuotes>,
    Json(new_quotes): Json<Vec<Quote>>,
) -> (StatusCode, Json<PushResponse>) {
    tracing::info!(count = new_quotes.len(), "replacing quotes");
    *quotes.write().await = new_quotes;

    (
        StatusCode::OK,
        Json(PushResponse {
            message: "Quotes updated successfully".to_string(),
        }),
    )
}

pub fn router(quotes: SharedQuotes) -> Router {
    Router::new()
        .route("/quotes", get(list_quotes).post(replace_quotes))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(quotes)
}

/// controls a running [`QuoteServer`], shutting it down when dropped.
pub struct ServerHandle {
    shutdown_tx: Option<oneshot::Sender<()>>,
    local_addr: SocketAddr,
    quotes: SharedQuotes,
}

impl ServerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.local_addr)
    }

    /// the collection the server currently holds.
    pub async fn quotes(&self) -> Vec<Quote> {
        self.quotes.read().await.clone()
    }

    pub async fn set_quotes(&self, quotes: Vec<Quote>) {
        *self.quotes.write().await = quotes;
    }

    pub fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

pub struct QuoteServer {
    quotes: Vec<Quote>,
}

impl Default for QuoteServer {
    fn default() -> Self {
        QuoteServer {
            quotes: initial_quotes(),
        }
    }
}

impl QuoteServer {
    pub fn with_quotes(quotes: Vec<Quote>) -> Self {
        QuoteServer { quotes }
    }

    /// binds `addr` and serves in the background. port 0 picks a free port.
    pub async fn start(self, addr: SocketAddr) -> Result<ServerHandle> {
        let quotes: SharedQuotes = Arc::new(RwLock::new(self.quotes));
        let app = router(Arc::clone(&quotes));

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .inspect_err(|e| tracing::error!(err = ?e, addr = %addr, "failed to bind quote server"))?;
        let local_addr = listener.local_addr()?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        tokio::spawn(
            async move {
                let graceful = axum::serve(listener, app).with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                });

                if let Err(e) = graceful.await {
                    tracing::error!(err = ?e, "quote server stopped with an error");
                }
            }
            .in_current_span(),
        );

        tracing::info!("quote server running at http://{}", local_addr);

        Ok(ServerHandle {
            shutdown_tx: Some(shutdown_tx),
            local_addr,
            quotes,
        })
    }
}
