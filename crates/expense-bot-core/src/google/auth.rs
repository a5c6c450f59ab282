//! Service account access tokens (OAuth 2.0 JWT bearer flow).
//!
//! A signed RS256 assertion is exchanged at the account's token URI for a
//! short-lived access token. The token is cached until shortly before it
//! expires.

use crate::credentials::ServiceAccountKey;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Scopes requested for the bot: spreadsheet rows and Drive uploads.
pub const SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/spreadsheets",
    "https://www.googleapis.com/auth/drive",
];

const GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
const REFRESH_MARGIN_SECS: i64 = 60;

/// Errors that can occur while obtaining an access token
#[derive(Error, Debug)]
pub enum GoogleAuthError {
    /// Assertion could not be signed
    #[error("JWT signing failed: {0}")]
    Jwt(String),
    /// Token endpoint unreachable
    #[error("Token request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Token endpoint rejected the assertion
    #[error("Token endpoint returned {status}: {body}")]
    TokenEndpoint {
        /// HTTP status code
        status: u16,
        /// Response body
        body: String,
    },
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct AssertionClaims {
    pub(crate) iss: String,
    pub(crate) scope: String,
    pub(crate) aud: String,
    pub(crate) iat: i64,
    pub(crate) exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Clone)]
struct CachedToken {
    value: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn is_usable(&self, now: DateTime<Utc>) -> bool {
        now + ChronoDuration::seconds(REFRESH_MARGIN_SECS) < self.expires_at
    }
}

/// Mints and caches access tokens for one service account.
pub struct GoogleAuth {
    key: ServiceAccountKey,
    http: reqwest::Client,
    token: RwLock<Option<CachedToken>>,
}

impl GoogleAuth {
    /// Create an authenticator for `key`.
    #[must_use]
    pub fn new(key: ServiceAccountKey, http: reqwest::Client) -> Self {
        Self {
            key,
            http,
            token: RwLock::new(None),
        }
    }

    /// Service account e-mail.
    #[must_use]
    pub fn client_email(&self) -> &str {
        &self.key.client_email
    }

    /// Return a valid bearer token, minting a new one when needed.
    ///
    /// # Errors
    ///
    /// Returns an error if signing fails or the token endpoint rejects the
    /// assertion.
    pub async fn access_token(&self) -> Result<String, GoogleAuthError> {
        {
            let cached = self.token.read().await;
            if let Some(token) = cached.as_ref().filter(|t| t.is_usable(Utc::now())) {
                return Ok(token.value.clone());
            }
        }

        let mut slot = self.token.write().await;
        // Another task may have refreshed while we waited for the lock
        if let Some(token) = slot.as_ref().filter(|t| t.is_usable(Utc::now())) {
            return Ok(token.value.clone());
        }

        let token = self.mint(Utc::now()).await?;
        let value = token.value.clone();
        *slot = Some(token);
        Ok(value)
    }

    pub(crate) fn sign_assertion(&self, now: DateTime<Utc>) -> Result<String, GoogleAuthError> {
        let iat = now.timestamp();
        let claims = AssertionClaims {
            iss: self.key.client_email.clone(),
            scope: SCOPES.join(" "),
            aud: self.key.token_uri.clone(),
            iat,
            exp: iat + ASSERTION_LIFETIME_SECS,
        };
        let key = EncodingKey::from_rsa_pem(self.key.private_key.as_bytes())
            .map_err(|e| GoogleAuthError::Jwt(format!("bad private key: {e}")))?;

        jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &key)
            .map_err(|e| GoogleAuthError::Jwt(e.to_string()))
    }

    async fn mint(&self, now: DateTime<Utc>) -> Result<CachedToken, GoogleAuthError> {
        debug!("Requesting access token for {}", self.key.client_email);
        let assertion = self.sign_assertion(now)?;

        let response = self
            .http
            .post(&self.key.token_uri)
            .form(&[("grant_type", GRANT_TYPE), ("assertion", assertion.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unable to read token response body".to_string());
            return Err(GoogleAuthError::TokenEndpoint {
                status: status.as_u16(),
                body,
            });
        }

        let payload: TokenResponse = response.json().await?;
        info!(
            "Obtained Google access token for {} (expires in {}s)",
            self.key.client_email, payload.expires_in
        );
        Ok(CachedToken {
            value: payload.access_token,
            expires_at: now + ChronoDuration::seconds(payload.expires_in),
        })
    }
}
