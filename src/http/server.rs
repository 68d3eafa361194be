//! HTTP server setup: router assembly, CORS/tracing middleware, graceful shutdown.

use std::net::SocketAddr;

use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::{Error, Result};
use crate::http::routes;
use crate::http::state::AppState;

pub struct HttpServer {
    bind_address: String,
    port: u16,
    enable_cors: bool,
    state: AppState,
    cancel_token: CancellationToken,
}

impl HttpServer {
    pub fn new(bind_address: String, port: u16, enable_cors: bool, state: AppState) -> Self {
        Self { bind_address, port, enable_cors, state, cancel_token: CancellationToken::new() }
    }

    /// Cancellation handle shared with the caller's shutdown-signal wait.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    fn build_router(&self) -> Router {
        let mut router = routes::create_router(self.state.clone());

        if self.enable_cors {
            let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);
            router = router.layer(cors);
        }

        router.layer(TraceLayer::new_for_http())
    }

    pub async fn run(&self) -> Result<()> {
        let addr: SocketAddr = format!("{}:{}", self.bind_address, self.port)
            .parse()
            .map_err(|e| Error::other(format!("invalid bind address: {e}")))?;

        let router = self.build_router();
        let listener = TcpListener::bind(addr).await?;

        tracing::info!("listening on http://{addr}");

        let cancel_token = self.cancel_token.clone();
        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                cancel_token.cancelled().await;
                tracing::info!("shutting down");
            })
            .await
            .map_err(|e| Error::other(format!("server error: {e}")))?;

        Ok(())
    }

    pub fn shutdown(&self) {
        self.cancel_token.cancel();
    }
}
