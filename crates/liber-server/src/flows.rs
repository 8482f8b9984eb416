//! Server-side store for in-flight sign-in attempts.
//!
//! One flow context per browser session, held under the session token with a
//! TTL. `take` removes the entry before returning it, so a flow can be
//! consumed exactly once; a replayed callback finds nothing.

use std::collections::HashMap;

use chrono::Duration;
use tokio::sync::RwLock;

use liber_oauth::AuthFlow;

/// Keyed store of pending sign-in attempts.
pub struct FlowStore {
    flows: RwLock<HashMap<String, AuthFlow>>,
    ttl: Duration,
}

impl FlowStore {
    pub fn new(ttl: std::time::Duration) -> Self {
        Self {
            flows: RwLock::new(HashMap::new()),
            ttl: Duration::from_std(ttl).unwrap_or(Duration::minutes(10)),
        }
    }

    /// Store the flow for a session, overwriting any unfinished attempt.
    pub async fn put(&self, session_token: &str, flow: AuthFlow) {
        self.flows
            .write()
            .await
            .insert(session_token.to_string(), flow);
    }

    /// Consume the session's flow. Stale flows are dropped and reported as
    /// absent, same as a replayed or never-initiated callback.
    pub async fn take(&self, session_token: &str) -> Option<AuthFlow> {
        let flow = self.flows.write().await.remove(session_token)?;
        if flow.is_stale(self.ttl) {
            tracing::debug!("discarding stale sign-in flow");
            return None;
        }
        Some(flow)
    }
}
