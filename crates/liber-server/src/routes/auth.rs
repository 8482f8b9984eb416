//! Sign-in handshake handlers.
//!
//! `GET /login/` initiates the authorization-code + PKCE flow and parks the
//! flow context server-side; `GET /auth/callback/` (and its legacy alias
//! `GET /callback/`) consumes it exactly once. Every failure is terminal for
//! the attempt; the user restarts from `/login/`.

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_cookies::Cookies;
use tracing::{info, warn};

use liber_oauth::{
    AuthFlow, CallbackParams, IdentityClaims, OAuthError, PkceChallenge,
    build_authorization_url, generate_state,
};

use crate::error::Result;
use crate::session::SessionUser;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    pub next: Option<String>,
}

/// GET /login/
pub async fn login_handler(
    State(state): State<AppState>,
    cookies: Cookies,
    Query(query): Query<LoginQuery>,
) -> Redirect {
    let token = state.sessions.ensure(&cookies).await;

    let pkce = PkceChallenge::generate();
    let flow_state = generate_state();
    let next = sanitize_next(query.next.as_deref());
    let url = build_authorization_url(&state.oauth, &pkce.challenge, &flow_state);

    // Overwrites any unfinished attempt for this session.
    state
        .flows
        .put(&token, AuthFlow::new(&pkce, &flow_state, &next))
        .await;

    info!("sign-in initiated");
    Redirect::to(&url)
}

/// GET /auth/callback/ (also mounted at the legacy /callback/ path)
pub async fn callback_handler(
    State(state): State<AppState>,
    cookies: Cookies,
    Query(params): Query<CallbackParams>,
) -> Result<Response> {
    let token = state
        .sessions
        .token(&cookies)
        .await
        .ok_or(OAuthError::FlowExpired)?;

    // Single-use: taken here, never put back, regardless of what follows.
    let flow = state
        .flows
        .take(&token)
        .await
        .ok_or(OAuthError::FlowExpired)?;

    if let Some(err) = params.provider_error() {
        warn!(error = %err, "provider reported sign-in failure");
        return Err(err.into());
    }

    let code = params
        .code
        .as_deref()
        .ok_or_else(|| OAuthError::ValidationFailed("missing authorization code".into()))?;
    if params.state.as_deref() != Some(flow.state.as_str()) {
        return Err(OAuthError::ValidationFailed("state mismatch".into()).into());
    }

    let tokens = state.exchanger.exchange_code(code, &flow.verifier).await?;
    let claims = IdentityClaims::from_id_token(&tokens.id_token)?;
    let username = claims.username().ok_or(OAuthError::MissingIdentityClaim)?;

    let user = state.store.upsert_user(
        username,
        claims.given_name.as_deref().unwrap_or(""),
        claims.family_name.as_deref().unwrap_or(""),
    )?;
    state
        .sessions
        .sign_in(
            &token,
            SessionUser {
                username: user.username.clone(),
                email: user.email.clone(),
            },
        )
        .await;

    info!(username = %user.username, "sign-in complete");
    Ok(Redirect::to(&flow.next).into_response())
}

/// GET/POST /logout/
pub async fn logout_handler(State(state): State<AppState>, cookies: Cookies) -> Redirect {
    state.sessions.sign_out(&cookies).await;
    Redirect::to("/")
}

/// Resume targets must stay on this site: local absolute paths only.
/// `//host` and `/\host` are both rejected; browsers normalize the
/// backslash and treat them as protocol-relative URLs.
fn sanitize_next(next: Option<&str>) -> String {
    match next {
        Some(n) if n.starts_with('/') && !n.starts_with("//") && !n.starts_with("/\\") => {
            n.to_string()
        }
        _ => "/".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_next_accepts_local_paths() {
        assert_eq!(sanitize_next(Some("/take/7/")), "/take/7/");
        assert_eq!(sanitize_next(Some("/")), "/");
    }

    #[test]
    fn test_sanitize_next_rejects_offsite_targets() {
        assert_eq!(sanitize_next(Some("https://evil.example")), "/");
        assert_eq!(sanitize_next(Some("//evil.example")), "/");
        assert_eq!(sanitize_next(Some("/\\evil.example")), "/");
        assert_eq!(sanitize_next(Some("relative")), "/");
        assert_eq!(sanitize_next(None), "/");
    }
}
