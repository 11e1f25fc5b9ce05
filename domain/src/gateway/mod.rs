//! HTTP clients for the services the domain layer talks to: Google OAuth, the YouTube Data and
//! Analytics APIs, and the video analysis service.

pub mod analyzer;
pub mod google_api;
pub mod google_oauth;
pub mod youtube_analytics;
pub mod youtube_data;

use crate::error::Error;
use log::*;
use serde::de::DeserializeOwned;

/// Reads a JSON body from a successful response. Any non-2xx status becomes an external error
/// carrying the upstream body, which is logged under `context`.
pub(crate) async fn read_json<T: DeserializeOwned>(
    response: reqwest::Response,
    context: &str,
) -> Result<T, Error> {
    let status = response.status();
    if status.is_success() {
        let body = response.text().await?;
        // Some write endpoints answer 204 or an empty body.
        let body = if body.trim().is_empty() { "null" } else { body.as_str() };
        serde_json::from_str(body).map_err(|e| {
            warn!("{context}: unexpected response body: {e:?}");
            Error::from(e)
        })
    } else {
        let error_text = response.text().await.unwrap_or_default();
        warn!("{context} failed with status {status}: {error_text}");
        Err(Error::external(error_text))
    }
}
