//! In-memory browser session store.
//!
//! A session is a random 256-bit token in a cookie mapped to an entry that
//! may or may not carry an authenticated user. Entries expire on idle TTL
//! and are purged lazily whenever the store is touched.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::RngCore;
use tokio::sync::RwLock;
use tower_cookies::{
    Cookie, Cookies,
    cookie::SameSite,
};

use crate::config::SESSION_COOKIE;

/// The authenticated identity attached to a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
    pub username: String,
    pub email: String,
}

#[derive(Debug)]
struct SessionEntry {
    user: Option<SessionUser>,
    last_seen: Instant,
}

/// In-memory session store keyed by cookie token.
pub struct SessionStore {
    entries: RwLock<HashMap<String, SessionEntry>>,
    ttl: Option<Duration>,
}

impl SessionStore {
    pub fn new(ttl: Option<Duration>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// The session token from the request cookie, if the session is alive.
    pub async fn token(&self, cookies: &Cookies) -> Option<String> {
        let token = cookies.get(SESSION_COOKIE)?.value().to_string();
        let mut entries = self.entries.write().await;
        Self::purge_expired(&mut entries, self.ttl);
        let entry = entries.get_mut(&token)?;
        entry.last_seen = Instant::now();
        Some(token)
    }

    /// The session token for this browser, creating a fresh session (and
    /// setting the cookie) if none exists.
    pub async fn ensure(&self, cookies: &Cookies) -> String {
        if let Some(token) = self.token(cookies).await {
            return token;
        }

        let token = new_token();
        self.entries.write().await.insert(
            token.clone(),
            SessionEntry {
                user: None,
                last_seen: Instant::now(),
            },
        );

        let cookie = Cookie::build((SESSION_COOKIE, token.clone()))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .build();
        cookies.add(cookie);

        token
    }

    /// The authenticated user for this request, if any.
    pub async fn user(&self, cookies: &Cookies) -> Option<SessionUser> {
        let token = self.token(cookies).await?;
        self.entries
            .read()
            .await
            .get(&token)
            .and_then(|e| e.user.clone())
    }

    /// Attach an authenticated user to the session.
    pub async fn sign_in(&self, token: &str, user: SessionUser) {
        let mut entries = self.entries.write().await;
        if let Some(entry) = entries.get_mut(token) {
            entry.user = Some(user);
            entry.last_seen = Instant::now();
        }
    }

    /// Drop the session and clear the cookie.
    pub async fn sign_out(&self, cookies: &Cookies) {
        if let Some(cookie) = cookies.get(SESSION_COOKIE) {
            let token = cookie.value().to_string();
            self.entries.write().await.remove(&token);
        }
        cookies.remove(Cookie::build((SESSION_COOKIE, "")).path("/").build());
    }

    fn purge_expired(entries: &mut HashMap<String, SessionEntry>, ttl: Option<Duration>) {
        if let Some(ttl) = ttl {
            let now = Instant::now();
            entries.retain(|_, e| now.duration_since(e.last_seen) <= ttl);
        }
    }
}

/// Generate a fresh session token: 32 random bytes, URL-safe base64.
fn new_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}
