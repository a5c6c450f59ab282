//! Google API clients
//!
//! Service account authentication plus the small slices of the Drive and
//! Sheets REST APIs the bot needs.

/// Service account token minting.
pub mod auth;
/// Drive uploads and spreadsheet lookup.
pub mod drive;
/// Sheets values API.
pub mod sheets;

pub use auth::{GoogleAuth, GoogleAuthError};
pub use drive::{DriveClient, DriveStorage};
pub use sheets::SheetsClient;

use crate::config::HTTP_TIMEOUT_SECS;
use std::time::Duration;
use thiserror::Error;

/// Errors returned by Google REST calls
#[derive(Error, Debug)]
pub enum GoogleApiError {
    /// Access token could not be obtained
    #[error(transparent)]
    Auth(#[from] GoogleAuthError),
    /// Transport level failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    /// Non-success status from the API
    #[error("Google API returned {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body
        body: String,
    },
    /// Request URL could not be built
    #[error("Invalid URL: {0}")]
    Url(String),
}

/// Build the HTTP client shared by all Google clients.
///
/// # Errors
///
/// Returns an error if the TLS backend cannot be initialized.
pub fn http_client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
        .build()
}

/// Turn a non-success response into [`GoogleApiError::Status`].
pub(crate) async fn check_status(
    response: reqwest::Response,
) -> Result<reqwest::Response, GoogleApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "unable to read response body".to_string());
    Err(GoogleApiError::Status {
        status: status.as_u16(),
        body,
    })
}

/// Append path segments to `base`, percent-encoding each one.
pub(crate) fn api_url(base: &str, segments: &[&str]) -> Result<reqwest::Url, GoogleApiError> {
    let mut url = reqwest::Url::parse(base).map_err(|e| GoogleApiError::Url(e.to_string()))?;
    {
        let mut path = url
            .path_segments_mut()
            .map_err(|()| GoogleApiError::Url(format!("{base} cannot be a base URL")))?;
        path.pop_if_empty().extend(segments);
    }
    Ok(url)
}
