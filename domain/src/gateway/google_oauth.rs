//! Google OAuth client: consent URL, code exchange, token refresh and userinfo lookup.

use super::read_json;
use crate::error::Error;
use chrono::{DateTime, Duration, Utc};
use log::*;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use service::config::Config;

/// Scopes requested on every consent, before any caller-supplied extras.
pub const DEFAULT_SCOPES: [&str; 8] = [
    "https://www.googleapis.com/auth/userinfo.email",
    "https://www.googleapis.com/auth/userinfo.profile",
    "https://www.googleapis.com/auth/youtube.readonly",
    "https://www.googleapis.com/auth/youtube.force-ssl",
    "https://www.googleapis.com/auth/yt-analytics.readonly",
    "https://www.googleapis.com/auth/drive",
    "https://www.googleapis.com/auth/spreadsheets",
    "https://www.googleapis.com/auth/documents",
];

/// OAuth token response from Google
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

impl TokenResponse {
    pub fn expires_at(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.expires_in.map(|secs| now + Duration::seconds(secs))
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GoogleUserInfo {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
}

#[derive(Debug, Serialize)]
struct TokenExchangeRequest<'a> {
    code: &'a str,
    client_id: &'a str,
    client_secret: &'a str,
    redirect_uri: &'a str,
    grant_type: &'static str,
}

#[derive(Debug, Serialize)]
struct TokenRefreshRequest<'a> {
    refresh_token: &'a str,
    client_id: &'a str,
    client_secret: &'a str,
    grant_type: &'static str,
}

#[derive(Debug, Clone)]
pub struct GoogleOAuthUrls {
    pub auth_url: String,
    pub token_url: String,
    pub userinfo_url: String,
}

pub struct GoogleOAuthClient {
    client: reqwest::Client,
    client_id: String,
    client_secret: SecretString,
    redirect_uri: String,
    urls: GoogleOAuthUrls,
}

impl GoogleOAuthClient {
    pub fn new(
        client_id: &str,
        client_secret: &str,
        redirect_uri: &str,
        urls: GoogleOAuthUrls,
    ) -> Result<Self, Error> {
        let client = reqwest::Client::builder().use_rustls_tls().build()?;

        Ok(Self {
            client,
            client_id: client_id.to_string(),
            client_secret: SecretString::new(client_secret.to_string()),
            redirect_uri: redirect_uri.to_string(),
            urls,
        })
    }

    /// Builds a client from the Google credentials in `config`; any missing credential is a
    /// configuration error.
    pub fn from_config(config: &Config) -> Result<Self, Error> {
        let client_id = config.google_client_id().ok_or_else(Error::config)?;
        let client_secret = config.google_client_secret().ok_or_else(Error::config)?;
        let redirect_uri = config.google_redirect_uri().ok_or_else(Error::config)?;

        Self::new(
            &client_id,
            &client_secret,
            &redirect_uri,
            GoogleOAuthUrls {
                auth_url: config.google_oauth_base_url().to_string(),
                token_url: config.google_token_url().to_string(),
                userinfo_url: config.google_userinfo_url().to_string(),
            },
        )
    }

    /// Consent URL requesting offline access, so the first consent yields a refresh token.
    pub fn authorization_url(&self, extra_scopes: &[String], state: Option<&str>) -> String {
        let mut scopes: Vec<String> = DEFAULT_SCOPES.iter().map(|scope| scope.to_string()).collect();
        for scope in extra_scopes {
            if !scopes.contains(scope) {
                scopes.push(scope.clone());
            }
        }
        let scopes = scopes.join(" ");

        let mut url = format!(
            "{}?\
            client_id={}&\
            redirect_uri={}&\
            response_type=code&\
            scope={}&\
            access_type=offline&\
            prompt=consent",
            self.urls.auth_url,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.redirect_uri),
            urlencoding::encode(&scopes),
        );
        if let Some(state) = state {
            url.push_str(&format!("&state={}", urlencoding::encode(state)));
        }
        url
    }

    pub async fn exchange_code(&self, code: &str) -> Result<TokenResponse, Error> {
        let request = TokenExchangeRequest {
            code,
            client_id: &self.client_id,
            client_secret: self.client_secret.expose_secret(),
            redirect_uri: &self.redirect_uri,
            grant_type: "authorization_code",
        };

        debug!("Exchanging Google OAuth code for tokens");

        let response = self
            .client
            .post(&self.urls.token_url)
            .form(&request)
            .send()
            .await
            .inspect_err(|e| warn!("Failed to exchange Google OAuth code: {e:?}"))?;

        let tokens: TokenResponse = read_json(response, "Google OAuth code exchange").await?;
        info!("Successfully exchanged Google OAuth code for tokens");
        Ok(tokens)
    }

    pub async fn refresh_token(&self, refresh_token: &str) -> Result<TokenResponse, Error> {
        let request = TokenRefreshRequest {
            refresh_token,
            client_id: &self.client_id,
            client_secret: self.client_secret.expose_secret(),
            grant_type: "refresh_token",
        };

        debug!("Refreshing Google access token");

        let response = self
            .client
            .post(&self.urls.token_url)
            .form(&request)
            .send()
            .await
            .inspect_err(|e| warn!("Failed to refresh Google token: {e:?}"))?;

        let tokens: TokenResponse = read_json(response, "Google token refresh").await?;
        info!("Successfully refreshed Google access token");
        Ok(tokens)
    }

    pub async fn get_user_info(&self, access_token: &str) -> Result<GoogleUserInfo, Error> {
        let response = self
            .client
            .get(&self.urls.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await
            .inspect_err(|e| warn!("Failed to get Google user info: {e:?}"))?;

        read_json(response, "Google user info").await
    }
}
