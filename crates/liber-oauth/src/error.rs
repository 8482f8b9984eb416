//! Error types for the identity provider client.
//!
//! Every variant except `Network` is terminal for the sign-in attempt: the
//! user must restart the handshake, nothing is retried automatically.

/// Result type alias for this crate.
pub type Result<T> = std::result::Result<T, OAuthError>;

/// Errors that can occur during the authentication handshake.
#[derive(Debug, thiserror::Error)]
pub enum OAuthError {
    /// Network/HTTP error talking to the provider.
    #[error("network error: {0}")]
    Network(String),

    /// No in-flight sign-in attempt for this session: the flow context was
    /// never created, already consumed, or aged out.
    #[error("sign-in session expired or invalid, please sign in again")]
    FlowExpired,

    /// State or verifier did not validate against the stored flow context.
    #[error("authentication validation failed: {0}")]
    ValidationFailed(String),

    /// The provider reported an error in the callback or token response.
    #[error("provider error {code}: {description}")]
    Provider { code: String, description: String },

    /// The identity token carried neither a preferred username nor an email.
    #[error("no usable username or email claim returned by the provider")]
    MissingIdentityClaim,
}

impl From<reqwest::Error> for OAuthError {
    fn from(e: reqwest::Error) -> Self {
        OAuthError::Network(e.to_string())
    }
}
