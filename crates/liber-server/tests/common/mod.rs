//! Shared helpers for server integration tests.

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, Response, header},
};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use tower::ServiceExt;

use liber_oauth::{OAuthConfig, OAuthError, TokenExchanger, TokenResponse};
use liber_server::{AppState, Server, ServerConfig};
use liber_store::LibraryStore;

/// Exchanger that accepts any code and returns an ID token with the given
/// claims payload. Claims can be swapped mid-test to simulate a repeat
/// sign-in with different provider data.
pub struct MockExchanger {
    claims: std::sync::Mutex<serde_json::Value>,
}

impl MockExchanger {
    pub fn new(claims: serde_json::Value) -> Self {
        Self {
            claims: std::sync::Mutex::new(claims),
        }
    }

    pub fn set_claims(&self, claims: serde_json::Value) {
        *self.claims.lock().unwrap() = claims;
    }
}

#[async_trait::async_trait]
impl TokenExchanger for MockExchanger {
    async fn exchange_code(&self, _code: &str, _verifier: &str) -> liber_oauth::Result<TokenResponse> {
        let claims = self.claims.lock().unwrap().clone();
        Ok(TokenResponse {
            access_token: "access".to_string(),
            token_type: "Bearer".to_string(),
            expires_in: 3600,
            id_token: fake_id_token(&claims),
            scope: "User.Read".to_string(),
        })
    }
}

/// Exchanger that rejects every code, as the provider does for a bad
/// verifier.
pub struct RejectingExchanger;

#[async_trait::async_trait]
impl TokenExchanger for RejectingExchanger {
    async fn exchange_code(&self, _code: &str, _verifier: &str) -> liber_oauth::Result<TokenResponse> {
        Err(OAuthError::ValidationFailed(
            "AADSTS50148: code_verifier does not match".to_string(),
        ))
    }
}

pub fn fake_id_token(claims: &serde_json::Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
    let body = URL_SAFE_NO_PAD.encode(claims.to_string().as_bytes());
    format!("{header}.{body}.sig")
}

pub fn test_oauth_config() -> OAuthConfig {
    OAuthConfig {
        tenant_id: "test-tenant".to_string(),
        client_id: "test-client".to_string(),
        client_secret: "test-secret".to_string(),
        redirect_uri: "http://localhost:8000/auth/callback/".to_string(),
    }
}

pub fn test_state(exchanger: Arc<dyn TokenExchanger>) -> AppState {
    let store = LibraryStore::open_in_memory().expect("in-memory store");
    AppState::with_exchanger(
        store,
        test_oauth_config(),
        ServerConfig::new("http://localhost:8000"),
        exchanger,
    )
}

pub fn app(state: &AppState) -> Router {
    Server::from_state(state.clone()).router()
}

pub async fn send(app: &Router, req: Request<Body>) -> Response<Body> {
    app.clone().oneshot(req).await.expect("request failed")
}

pub async fn get(app: &Router, uri: &str, cookie: Option<&str>) -> Response<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(c) = cookie {
        builder = builder.header(header::COOKIE, c);
    }
    send(app, builder.body(Body::empty()).unwrap()).await
}

pub async fn post_form(
    app: &Router,
    uri: &str,
    body: &str,
    cookie: Option<&str>,
) -> Response<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(c) = cookie {
        builder = builder.header(header::COOKIE, c);
    }
    send(app, builder.body(Body::from(body.to_string())).unwrap()).await
}

/// The session cookie set by a response, as a `name=value` pair.
pub fn session_cookie(resp: &Response<Body>) -> Option<String> {
    let value = resp.headers().get(header::SET_COOKIE)?.to_str().ok()?;
    Some(value.split(';').next().unwrap_or_default().to_string())
}

pub fn location(resp: &Response<Body>) -> String {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// Pull a query parameter out of a URL without a URL parser.
pub fn query_param(url: &str, name: &str) -> Option<String> {
    let (_, query) = url.split_once('?')?;
    query
        .split('&')
        .find_map(|pair| pair.strip_prefix(&format!("{name}=")))
        .map(str::to_string)
}

pub async fn body_string(resp: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("body read failed");
    String::from_utf8(bytes.to_vec()).expect("body not utf-8")
}

/// Drive the full sign-in handshake and return the authenticated session
/// cookie.
pub async fn sign_in(app: &Router) -> String {
    let login = get(app, "/login/", None).await;
    let cookie = session_cookie(&login).expect("login sets session cookie");
    let state = query_param(&location(&login), "state").expect("state in authorize url");

    let callback = get(
        app,
        &format!("/auth/callback/?code=fake-code&state={state}"),
        Some(&cookie),
    )
    .await;
    assert!(
        callback.status().is_redirection(),
        "sign-in callback failed: {}",
        callback.status()
    );
    cookie
}
