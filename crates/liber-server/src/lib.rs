//! HTTP surface for Liber.
//!
//! Serves the catalog pages, the loan reservation endpoints, the sign-in
//! handshake, and the QR artifacts. Browser identity rides on a session
//! cookie; unauthenticated page requests are redirected to sign-in rather
//! than rejected.
//!
//! # Example
//!
//! ```ignore
//! use liber_server::{AppState, Server, ServerConfig};
//! use liber_store::LibraryStore;
//!
//! let store = LibraryStore::open(path)?;
//! let state = AppState::new(store, oauth_config, ServerConfig::new(base_url));
//! Server::from_state(state).run().await?;
//! ```

pub mod config;
pub mod error;
pub mod flows;
pub mod pages;
pub mod qr;
pub mod routes;
pub mod session;
pub mod state;

pub use config::ServerConfig;
pub use error::{Result, ServerError};
pub use session::{SessionStore, SessionUser};
pub use state::AppState;

use std::net::SocketAddr;

use axum::{
    Router,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tower_cookies::CookieManagerLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// The Liber HTTP server.
pub struct Server {
    /// Application state.
    state: AppState,
}

impl Server {
    /// Create a server from a pre-built application state.
    pub fn from_state(state: AppState) -> Self {
        Self { state }
    }

    /// Build the router with all routes and middleware.
    pub fn router(&self) -> Router {
        Router::new()
            .merge(routes::health_routes())
            .route(
                "/",
                get(routes::book_list_handler).post(routes::create_book_handler),
            )
            .route("/take/{id}/", get(routes::take_page_handler))
            .route("/take/{id}/reserve/", post(routes::reserve_handler))
            .route("/return/{id}/", post(routes::return_handler))
            .route("/login/", get(routes::login_handler))
            .route("/auth/callback/", get(routes::callback_handler))
            // Legacy alias kept for QR codes printed before the path moved
            .route("/callback/", get(routes::callback_handler))
            .route("/qr/{id}", get(routes::qr_png_handler))
            .route("/print_qr/{id}/", get(routes::print_qr_handler))
            .route(
                "/logout/",
                get(routes::logout_handler).post(routes::logout_handler),
            )
            .layer(CookieManagerLayer::new())
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Run the server on the configured bind address.
    pub async fn run(self) -> Result<()> {
        let addr = self.state.config.bind_address;
        self.run_on(addr).await
    }

    /// Run the server on a specific address (useful for testing).
    pub async fn run_on(self, addr: SocketAddr) -> Result<()> {
        let router = self.router();

        info!("starting server on {}", addr);

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Internal(format!("failed to bind: {e}")))?;

        axum::serve(listener, router)
            .await
            .map_err(|e| ServerError::Internal(format!("server error: {e}")))?;

        Ok(())
    }

    /// Get the configured bind address.
    pub fn bind_address(&self) -> SocketAddr {
        self.state.config.bind_address
    }
}
