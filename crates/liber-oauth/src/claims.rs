//! Identity claims carried by the provider's ID token.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::Deserialize;

use crate::error::{OAuthError, Result};

/// Claims extracted from the ID token payload.
///
/// The token arrives straight from the provider's token endpoint over TLS in
/// response to our own code + verifier, so the payload is read without
/// re-verifying the signature.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IdentityClaims {
    #[serde(default)]
    pub preferred_username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub given_name: Option<String>,
    #[serde(default)]
    pub family_name: Option<String>,
}

impl IdentityClaims {
    /// Decode the claims from a compact-serialized ID token.
    pub fn from_id_token(id_token: &str) -> Result<Self> {
        let payload = id_token
            .split('.')
            .nth(1)
            .ok_or_else(|| OAuthError::ValidationFailed("malformed identity token".into()))?;
        let bytes = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|e| OAuthError::ValidationFailed(format!("identity token payload: {e}")))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| OAuthError::ValidationFailed(format!("identity token claims: {e}")))
    }

    /// The stable identifier used as the local username: the provider's
    /// preferred username, falling back to the email claim.
    pub fn username(&self) -> Option<&str> {
        self.preferred_username
            .as_deref()
            .or(self.email.as_deref())
            .filter(|s| !s.is_empty())
    }
}

/// Query parameters the provider sends to the callback endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
}

impl CallbackParams {
    /// Provider-reported error, if the callback carries one.
    pub fn provider_error(&self) -> Option<OAuthError> {
        self.error.as_ref().map(|code| OAuthError::Provider {
            code: code.clone(),
            description: self
                .error_description
                .clone()
                .unwrap_or_else(|| "authentication failed".to_string()),
        })
    }
}
