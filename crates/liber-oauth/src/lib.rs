//! OAuth 2.0 authorization-code + PKCE client for the Microsoft identity
//! platform.
//!
//! Covers one sign-in attempt end to end: PKCE pair and anti-forgery state
//! generation, the provider authorization URL, the code-for-tokens exchange,
//! and claim extraction from the returned ID token. The flow context
//! ([`AuthFlow`]) is a plain value the caller stores and consumes exactly
//! once; this crate holds no ambient state.

pub mod claims;
pub mod error;
pub mod oauth;

pub use claims::{CallbackParams, IdentityClaims};
pub use error::{OAuthError, Result};
pub use oauth::{
    AuthFlow, OAuthConfig, PkceChallenge, ProviderClient, SCOPE, TokenExchanger, TokenResponse,
    build_authorization_url, generate_state,
};
