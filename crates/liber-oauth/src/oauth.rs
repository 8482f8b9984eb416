//! OAuth 2.0 authorization-code + PKCE handshake pieces.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Utc};
use rand::RngCore;
use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::error::{OAuthError, Result};

/// Scope requested from the provider. Reserved scopes (`openid`, `profile`,
/// `offline_access`) must not be listed here: the provider injects them
/// itself and duplicates are rejected.
pub const SCOPE: &str = "User.Read";

/// OAuth configuration for the Microsoft identity platform (v2 endpoints).
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: String,
    /// Must exactly match the redirect URI registered with the provider.
    pub redirect_uri: String,
}

impl OAuthConfig {
    pub fn authorize_url(&self) -> String {
        format!(
            "https://login.microsoftonline.com/{}/oauth2/v2.0/authorize",
            self.tenant_id
        )
    }

    pub fn token_url(&self) -> String {
        format!(
            "https://login.microsoftonline.com/{}/oauth2/v2.0/token",
            self.tenant_id
        )
    }
}

/// PKCE code verifier and challenge pair.
#[derive(Debug, Clone)]
pub struct PkceChallenge {
    pub verifier: String,
    pub challenge: String,
}

impl PkceChallenge {
    /// Generate a new PKCE challenge pair.
    pub fn generate() -> Self {
        let mut verifier_bytes = [0u8; 32];
        rand::rng().fill_bytes(&mut verifier_bytes);
        let verifier = URL_SAFE_NO_PAD.encode(verifier_bytes);

        let mut hasher = Sha256::new();
        hasher.update(verifier.as_bytes());
        let challenge_bytes = hasher.finalize();
        let challenge = URL_SAFE_NO_PAD.encode(challenge_bytes);

        Self {
            verifier,
            challenge,
        }
    }
}

/// Generate a random state string for CSRF protection.
pub fn generate_state() -> String {
    let mut state_bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut state_bytes);
    URL_SAFE_NO_PAD.encode(state_bytes)
}

/// Build the authorization URL for one sign-in attempt.
pub fn build_authorization_url(config: &OAuthConfig, challenge: &str, state: &str) -> String {
    let params = [
        ("client_id", config.client_id.as_str()),
        ("response_type", "code"),
        ("redirect_uri", &config.redirect_uri),
        ("scope", SCOPE),
        ("code_challenge", challenge),
        ("code_challenge_method", "S256"),
        ("state", state),
        ("prompt", "select_account"),
    ];

    let query = params
        .iter()
        .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");

    format!("{}?{}", config.authorize_url(), query)
}

/// The full context of one in-flight sign-in attempt.
///
/// Created at login initiation, held server-side keyed by the browser
/// session, and consumed exactly once at callback time.
#[derive(Debug, Clone)]
pub struct AuthFlow {
    pub verifier: String,
    pub state: String,
    /// Where to send the user once sign-in completes.
    pub next: String,
    pub created_at: DateTime<Utc>,
}

impl AuthFlow {
    pub fn new(pkce: &PkceChallenge, state: &str, next: &str) -> Self {
        Self {
            verifier: pkce.verifier.clone(),
            state: state.to_string(),
            next: next.to_string(),
            created_at: Utc::now(),
        }
    }

    /// Whether the attempt is older than `ttl` and should be rejected.
    pub fn is_stale(&self, ttl: chrono::Duration) -> bool {
        Utc::now() - self.created_at > ttl
    }
}

/// Tokens returned from the code exchange.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
    pub id_token: String,
    #[serde(default)]
    pub scope: String,
}

#[derive(Debug, Deserialize)]
struct TokenErrorBody {
    error: String,
    #[serde(default)]
    error_description: String,
}

/// Exchanges an authorization code for tokens. A trait so the handshake can
/// be driven in tests without a live provider.
#[async_trait::async_trait]
pub trait TokenExchanger: Send + Sync {
    async fn exchange_code(&self, code: &str, verifier: &str) -> Result<TokenResponse>;
}

/// The real provider client.
#[derive(Debug, Clone)]
pub struct ProviderClient {
    config: OAuthConfig,
    http: reqwest::Client,
}

impl ProviderClient {
    pub fn new(config: OAuthConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    pub fn config(&self) -> &OAuthConfig {
        &self.config
    }
}

#[async_trait::async_trait]
impl TokenExchanger for ProviderClient {
    async fn exchange_code(&self, code: &str, verifier: &str) -> Result<TokenResponse> {
        let form = [
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", &self.config.client_secret),
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", &self.config.redirect_uri),
            ("code_verifier", verifier),
            ("scope", SCOPE),
        ];

        let response = self
            .http
            .post(self.config.token_url())
            .form(&form)
            .send()
            .await
            .map_err(|e| OAuthError::Network(format!("token exchange request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            // A rejected verifier/state surfaces here as a provider-side
            // validation error, terminal for this attempt.
            return match serde_json::from_str::<TokenErrorBody>(&text) {
                Ok(body) => {
                    tracing::warn!(code = %body.error, "token exchange rejected");
                    Err(OAuthError::ValidationFailed(if body.error_description.is_empty() {
                        body.error
                    } else {
                        body.error_description
                    }))
                }
                Err(_) => Err(OAuthError::ValidationFailed(format!(
                    "token endpoint returned {status}"
                ))),
            };
        }

        response
            .json::<TokenResponse>()
            .await
            .map_err(|e| OAuthError::ValidationFailed(format!("malformed token response: {e}")))
    }
}
