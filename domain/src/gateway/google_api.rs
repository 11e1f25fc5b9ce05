//! Per-user authenticated clients for the Google APIs.
//!
//! A client is built fresh for every call from the user's stored OAuth tokens; nothing is
//! cached between requests. [`for_user`] refreshes an expired access token first when a
//! refresh token is available and persists the new token.

use super::google_oauth::GoogleOAuthClient;
use super::read_json;
use crate::error::{DomainErrorKind, Error, InternalErrorKind};
use crate::{users, Id};
use chrono::Utc;
use entity_api::user;
use log::*;
use sea_orm::DatabaseConnection;
use serde::{de::DeserializeOwned, Serialize};
use service::config::Config;

const MISSING_CREDENTIALS: &str = "User not found or missing Google credentials.";

/// Google API a client is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiSurface {
    YouTubeData,
    YouTubeAnalytics,
}

impl ApiSurface {
    pub fn name(&self) -> &'static str {
        match self {
            ApiSurface::YouTubeData => "youtube",
            ApiSurface::YouTubeAnalytics => "youtubeAnalytics",
        }
    }

    pub fn version(&self) -> &'static str {
        match self {
            ApiSurface::YouTubeData => "v3",
            ApiSurface::YouTubeAnalytics => "v2",
        }
    }

    fn base_url<'a>(&self, config: &'a Config) -> &'a str {
        match self {
            ApiSurface::YouTubeData => config.youtube_data_base_url(),
            ApiSurface::YouTubeAnalytics => config.youtube_analytics_base_url(),
        }
    }
}

/// Builds a client for `surface` from the access token already stored on `user`.
pub fn resolve(config: &Config, user: &users::Model, surface: ApiSurface) -> Result<GoogleApiClient, Error> {
    let access_token = user
        .access_token
        .as_deref()
        .filter(|token| !token.is_empty())
        .ok_or_else(|| {
            warn!("User {} has no stored Google access token", user.id);
            Error::unauthenticated(MISSING_CREDENTIALS)
        })?;

    GoogleApiClient::new(
        access_token,
        &format!("{}/{}", surface.base_url(config), surface.version()),
        surface,
    )
}

/// Loads the user, refreshes an expired access token when possible, and builds a client.
pub async fn for_user(
    db: &DatabaseConnection,
    config: &Config,
    user_id: Id,
    surface: ApiSurface,
) -> Result<GoogleApiClient, Error> {
    let user = authorized_user(db, config, user_id).await?;
    resolve(config, &user, surface)
}

/// The user with a usable access token, refreshed and persisted first if it had expired.
pub async fn authorized_user(
    db: &DatabaseConnection,
    config: &Config,
    user_id: Id,
) -> Result<users::Model, Error> {
    let user = user::find_by_id(db, user_id)
        .await
        .map_err(|_| Error::unauthenticated(MISSING_CREDENTIALS))?;
    refresh_if_expired(db, config, user).await
}

async fn refresh_if_expired(
    db: &DatabaseConnection,
    config: &Config,
    user: users::Model,
) -> Result<users::Model, Error> {
    let expired = user
        .token_expires_at
        .is_some_and(|expires_at| expires_at <= Utc::now());
    let refresh_token = match (&user.refresh_token, expired) {
        (Some(refresh_token), true) => refresh_token.clone(),
        _ => return Ok(user),
    };

    let oauth_client = match GoogleOAuthClient::from_config(config) {
        Ok(client) => client,
        Err(Error {
            error_kind: DomainErrorKind::Internal(InternalErrorKind::Config),
            ..
        }) => {
            warn!("Google credentials are not configured; using stored access token as is");
            return Ok(user);
        }
        Err(e) => return Err(e),
    };

    debug!("Access token of user {} expired, refreshing", user.id);
    let tokens = oauth_client.refresh_token(&refresh_token).await?;
    let expires_at = tokens.expires_at(Utc::now());
    Ok(user::update_access_token(db, user, tokens.access_token, expires_at).await?)
}

/// Bearer-authenticated JSON client for one Google API surface.
#[derive(Debug)]
pub struct GoogleApiClient {
    client: reqwest::Client,
    base_url: String,
    surface: ApiSurface,
}

impl GoogleApiClient {
    pub fn new(access_token: &str, base_url: &str, surface: ApiSurface) -> Result<Self, Error> {
        let mut headers = reqwest::header::HeaderMap::new();

        let mut header_value =
            reqwest::header::HeaderValue::from_str(&format!("Bearer {access_token}")).map_err(
                |e| {
                    warn!("Failed to create auth header: {e:?}");
                    Error {
                        source: Some(Box::new(e)),
                        error_kind: DomainErrorKind::Internal(InternalErrorKind::Other(
                            "Invalid access token format".to_string(),
                        )),
                    }
                },
            )?;
        header_value.set_sensitive(true);
        headers.insert(reqwest::header::AUTHORIZATION, header_value);

        let client = reqwest::Client::builder()
            .use_rustls_tls()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            surface,
        })
    }

    pub fn surface(&self) -> ApiSurface {
        self.surface
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, Error> {
        let response = self
            .client
            .get(self.url(path))
            .query(query)
            .send()
            .await
            .inspect_err(|e| warn!("GET {path} on {} failed: {e:?}", self.surface.name()))?;
        read_json(response, &self.context("GET", path)).await
    }

    pub async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        body: &B,
    ) -> Result<T, Error> {
        let response = self
            .client
            .post(self.url(path))
            .query(query)
            .json(body)
            .send()
            .await
            .inspect_err(|e| warn!("POST {path} on {} failed: {e:?}", self.surface.name()))?;
        read_json(response, &self.context("POST", path)).await
    }

    pub async fn put_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        body: &B,
    ) -> Result<T, Error> {
        let response = self
            .client
            .put(self.url(path))
            .query(query)
            .json(body)
            .send()
            .await
            .inspect_err(|e| warn!("PUT {path} on {} failed: {e:?}", self.surface.name()))?;
        read_json(response, &self.context("PUT", path)).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn context(&self, method: &str, path: &str) -> String {
        format!("{} {method} {path}", self.surface.name())
    }
}
