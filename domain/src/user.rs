//! Google sign-in and the signed-in user's profile.

use crate::error::Error;
use crate::gateway::google_api::{self, ApiSurface};
use crate::gateway::google_oauth::GoogleOAuthClient;
use crate::gateway::youtube_data::{ChannelSelector, YouTubeDataClient};
use crate::Id;
use chrono::Utc;
use log::*;
use sea_orm::DatabaseConnection;
use serde_json::{json, Value};
use service::config::Config;

pub use entity_api::user::{find_by_id, AuthSession, Backend, GoogleIdentity};

const SCOPE_PREFIX: &str = "https://www.googleapis.com/auth/";

/// Turns a comma separated `scopes` query value into full Google scope URLs.
fn requested_scopes(scopes: Option<&str>) -> Vec<String> {
    scopes
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|scope| !scope.is_empty())
        .map(|scope| {
            if scope.starts_with("https://") {
                scope.to_string()
            } else {
                format!("{SCOPE_PREFIX}{scope}")
            }
        })
        .collect()
}

/// The Google consent URL, requesting the default scopes plus any extras named in `scopes`.
pub fn google_authorize_url(config: &Config, scopes: Option<&str>) -> Result<String, Error> {
    let client = GoogleOAuthClient::from_config(config)?;
    Ok(client.authorization_url(&requested_scopes(scopes), None))
}

/// Exchanges the authorization `code` and looks up who it belongs to.
pub async fn sign_in_with_google(config: &Config, code: &str) -> Result<GoogleIdentity, Error> {
    let client = GoogleOAuthClient::from_config(config)?;
    let tokens = client.exchange_code(code).await?;
    let token_expires_at = tokens.expires_at(Utc::now());
    let user_info = client.get_user_info(&tokens.access_token).await?;

    info!("Google sign-in for {}", user_info.email);

    Ok(GoogleIdentity {
        google_id: user_info.id,
        email: user_info.email,
        name: user_info.name,
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
        token_expires_at,
    })
}

/// Google userinfo of the user, extended with their YouTube channel when they have one.
pub async fn profile_with_channel(
    db: &DatabaseConnection,
    config: &Config,
    user_id: Id,
) -> Result<Value, Error> {
    let user = google_api::authorized_user(db, config, user_id).await?;
    let youtube = YouTubeDataClient::new(google_api::resolve(config, &user, ApiSurface::YouTubeData)?);
    let channel = youtube.fetch_channel(&ChannelSelector::Mine, "id,snippet").await?;

    // `resolve` above already rejected a missing token
    let access_token = user.access_token.unwrap_or_default();
    let user_info = GoogleOAuthClient::from_config(config)?
        .get_user_info(&access_token)
        .await?;

    let mut profile = serde_json::to_value(user_info)?;
    if let (Some(channel), Value::Object(fields)) = (channel, &mut profile) {
        let snippet = channel.snippet.unwrap_or_default();
        let thumbnail = snippet
            .thumbnails
            .as_ref()
            .and_then(|thumbnails| thumbnails.pointer("/default/url"))
            .cloned()
            .unwrap_or(Value::Null);
        fields.insert("channelId".to_string(), json!(channel.id));
        fields.insert("channelTitle".to_string(), json!(snippet.title));
        fields.insert("channelThumbnail".to_string(), thumbnail);
    }
    Ok(profile)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use mockito::{Matcher, Server};

    fn config(server_url: &str) -> Config {
        Config::parse_from(["channel_insights_rs"])
            .set_google_credentials("client-id", "client-secret", "http://localhost:4000/auth/google/callback")
            .set_google_oauth_urls(
                &format!("{server_url}/token"),
                &format!("{server_url}/userinfo"),
            )
    }

    #[test]
    fn short_scope_names_are_expanded() {
        assert_eq!(
            requested_scopes(Some("drive.file, ,https://www.googleapis.com/auth/calendar")),
            vec![
                "https://www.googleapis.com/auth/drive.file".to_string(),
                "https://www.googleapis.com/auth/calendar".to_string(),
            ]
        );
        assert!(requested_scopes(None).is_empty());
    }

    #[test]
    fn authorize_url_requires_google_credentials() {
        let config = Config::parse_from(["channel_insights_rs"]);
        assert!(google_authorize_url(&config, None).is_err());
    }

    #[test]
    fn authorize_url_includes_requested_scopes() {
        let url = google_authorize_url(&config("http://127.0.0.1"), Some("calendar")).unwrap();
        assert!(url.contains(&*urlencoding::encode("https://www.googleapis.com/auth/calendar")));
        assert!(url.contains("access_type=offline"));
    }

    #[tokio::test]
    async fn sign_in_returns_identity_with_tokens() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/token")
            .with_status(200)
            .with_body(r#"{"access_token":"ya29.new","refresh_token":"1//refresh","expires_in":3599}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/userinfo")
            .match_header("authorization", "Bearer ya29.new")
            .with_status(200)
            .with_body(r#"{"id":"1089","email":"creator@example.com","name":"Creator"}"#)
            .create_async()
            .await;

        let identity = sign_in_with_google(&config(&server.url()), "4/code")
            .await
            .unwrap();

        assert_eq!(identity.google_id, "1089");
        assert_eq!(identity.email, "creator@example.com");
        assert_eq!(identity.refresh_token.as_deref(), Some("1//refresh"));
        assert!(identity.token_expires_at.is_some());
    }

    #[cfg(feature = "mock")]
    #[tokio::test]
    async fn profile_merges_channel_fields_into_userinfo() {
        use crate::users;
        use sea_orm::{DatabaseBackend, MockDatabase};

        let mut server = Server::new_async().await;
        server
            .mock("GET", "/v3/channels")
            .match_query(Matcher::UrlEncoded("mine".into(), "true".into()))
            .with_status(200)
            .with_body(
                r#"{"items":[{"id":"UCme","snippet":{"title":"My Channel","thumbnails":{"default":{"url":"https://yt3.example/me.jpg"}}}}]}"#,
            )
            .create_async()
            .await;
        server
            .mock("GET", "/userinfo")
            .with_status(200)
            .with_body(r#"{"id":"1089","email":"creator@example.com"}"#)
            .create_async()
            .await;

        let now = Utc::now();
        let user = users::Model {
            id: Id::new_v4(),
            email: "creator@example.com".to_string(),
            google_id: Some("1089".to_string()),
            name: None,
            access_token: Some("ya29.token".to_string()),
            refresh_token: None,
            token_expires_at: None,
            created_at: now.into(),
            updated_at: now.into(),
        };
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![user.clone()]])
            .into_connection();
        let config = config(&server.url()).set_youtube_data_base_url(&server.url());

        let profile = profile_with_channel(&db, &config, user.id).await.unwrap();

        assert_eq!(profile["email"], "creator@example.com");
        assert_eq!(profile["channelId"], "UCme");
        assert_eq!(profile["channelTitle"], "My Channel");
        assert_eq!(profile["channelThumbnail"], "https://yt3.example/me.jpg");
    }
}
