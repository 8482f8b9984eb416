//! Application state shared across handlers.

use std::sync::Arc;

use liber_oauth::{OAuthConfig, ProviderClient, TokenExchanger};
use liber_store::LibraryStore;

use crate::config::ServerConfig;
use crate::flows::FlowStore;
use crate::session::SessionStore;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Catalog and loan persistence. Never cached in-process: handlers
    /// always re-read loan state from here.
    pub store: Arc<LibraryStore>,

    /// Identity provider configuration.
    pub oauth: Arc<OAuthConfig>,

    /// Code-for-tokens exchanger (swapped for a mock in tests).
    pub exchanger: Arc<dyn TokenExchanger>,

    /// Server configuration.
    pub config: Arc<ServerConfig>,

    /// Browser sessions.
    pub sessions: Arc<SessionStore>,

    /// In-flight sign-in attempts, keyed by session token.
    pub flows: Arc<FlowStore>,
}

impl AppState {
    /// Create application state backed by the real provider client.
    pub fn new(store: LibraryStore, oauth: OAuthConfig, config: ServerConfig) -> Self {
        let exchanger = Arc::new(ProviderClient::new(oauth.clone()));
        Self::with_exchanger(store, oauth, config, exchanger)
    }

    /// Create application state with an explicit token exchanger.
    pub fn with_exchanger(
        store: LibraryStore,
        oauth: OAuthConfig,
        config: ServerConfig,
        exchanger: Arc<dyn TokenExchanger>,
    ) -> Self {
        Self {
            store: Arc::new(store),
            oauth: Arc::new(oauth),
            exchanger,
            sessions: Arc::new(SessionStore::new(config.session_ttl)),
            flows: Arc::new(FlowStore::new(config.flow_ttl)),
            config: Arc::new(config),
        }
    }

    /// The public deep link a book's QR artifact encodes.
    pub fn take_url(&self, book_id: i64) -> String {
        format!("{}/take/{}/", self.config.public_base_url, book_id)
    }
}
