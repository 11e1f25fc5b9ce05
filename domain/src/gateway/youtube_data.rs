//! Typed access to the YouTube Data API v3 resources used by channel analysis, sync and
//! scheduled publishing.

use super::google_api::{self, ApiSurface, GoogleApiClient};
use crate::error::Error;
use crate::Id;
use chrono::{DateTime, Utc};
use log::*;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use service::config::Config;

/// Page size of `playlistItems.list`, the API maximum.
pub const PLAYLIST_PAGE_SIZE: u32 = 50;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VideoResource {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<VideoSnippet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_details: Option<VideoContentDetails>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statistics: Option<VideoStatistics>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ResourceStatus>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VideoSnippet {
    pub title: Option<String>,
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
    pub published_at: Option<DateTime<Utc>>,
    pub channel_id: Option<String>,
    pub channel_title: Option<String>,
    pub thumbnails: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VideoContentDetails {
    /// ISO-8601 duration, e.g. `PT4M13S`
    pub duration: Option<String>,
}

/// Counters are reported as decimal strings.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VideoStatistics {
    pub view_count: Option<String>,
    pub like_count: Option<String>,
    pub dislike_count: Option<String>,
    pub comment_count: Option<String>,
}

impl VideoStatistics {
    pub fn views(&self) -> Option<i64> {
        parse_count(&self.view_count)
    }

    pub fn likes(&self) -> Option<i64> {
        parse_count(&self.like_count)
    }

    pub fn dislikes(&self) -> Option<i64> {
        parse_count(&self.dislike_count)
    }

    pub fn comments(&self) -> Option<i64> {
        parse_count(&self.comment_count)
    }
}

fn parse_count(count: &Option<String>) -> Option<i64> {
    count.as_deref().and_then(|count| count.parse().ok())
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResourceStatus {
    pub privacy_status: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelResource {
    pub id: String,
    #[serde(default)]
    pub snippet: Option<ChannelSnippet>,
    #[serde(default)]
    pub statistics: Option<Value>,
    #[serde(default)]
    pub content_details: Option<ChannelContentDetails>,
}

impl ChannelResource {
    pub fn uploads_playlist_id(&self) -> Option<&str> {
        self.content_details
            .as_ref()
            .and_then(|details| details.related_playlists.as_ref())
            .and_then(|playlists| playlists.uploads.as_deref())
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelSnippet {
    pub title: Option<String>,
    pub description: Option<String>,
    pub custom_url: Option<String>,
    pub thumbnails: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelContentDetails {
    pub related_playlists: Option<RelatedPlaylists>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RelatedPlaylists {
    pub uploads: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistItem {
    #[serde(default)]
    pub snippet: Option<PlaylistItemSnippet>,
    #[serde(default)]
    pub content_details: Option<PlaylistItemContentDetails>,
    #[serde(default)]
    pub status: Option<ResourceStatus>,
}

impl PlaylistItem {
    /// Video id from `snippet.resourceId`, falling back to `contentDetails`.
    pub fn video_id(&self) -> Option<&str> {
        self.snippet
            .as_ref()
            .and_then(|snippet| snippet.resource_id.as_ref())
            .and_then(|resource_id| resource_id.video_id.as_deref())
            .or_else(|| {
                self.content_details
                    .as_ref()
                    .and_then(|details| details.video_id.as_deref())
            })
    }

    pub fn is_private(&self) -> bool {
        self.status
            .as_ref()
            .and_then(|status| status.privacy_status.as_deref())
            == Some("private")
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistItemSnippet {
    pub title: Option<String>,
    pub description: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub thumbnails: Option<Value>,
    pub resource_id: Option<ResourceId>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResourceId {
    pub video_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistItemContentDetails {
    pub video_id: Option<String>,
    pub video_published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct SearchResult {
    #[serde(default)]
    snippet: Option<SearchSnippet>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchSnippet {
    channel_id: Option<String>,
}

/// Which channel a `channels.list` call addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelSelector {
    /// The channel of the authenticated user.
    Mine,
    Id(String),
}

impl ChannelSelector {
    fn query_param(&self) -> (&'static str, String) {
        match self {
            ChannelSelector::Mine => ("mine", "true".to_string()),
            ChannelSelector::Id(id) => ("id", id.clone()),
        }
    }
}

pub struct YouTubeDataClient {
    api: GoogleApiClient,
}

impl YouTubeDataClient {
    pub fn new(api: GoogleApiClient) -> Self {
        Self { api }
    }

    pub async fn for_user(
        db: &DatabaseConnection,
        config: &Config,
        user_id: Id,
    ) -> Result<Self, Error> {
        Ok(Self::new(
            google_api::for_user(db, config, user_id, ApiSurface::YouTubeData).await?,
        ))
    }

    /// `videos.list` for a single id; `None` when YouTube returns no item.
    pub async fn fetch_video(&self, video_id: &str, parts: &str) -> Result<Option<VideoResource>, Error> {
        let response: ListResponse<VideoResource> = self
            .api
            .get(
                "videos",
                &[("part", parts.to_string()), ("id", video_id.to_string())],
            )
            .await?;
        Ok(response.items.into_iter().next())
    }

    /// `videos.list` for up to 50 ids in one request.
    pub async fn fetch_videos(&self, video_ids: &[String], parts: &str) -> Result<Vec<VideoResource>, Error> {
        if video_ids.is_empty() {
            return Ok(Vec::new());
        }
        let response: ListResponse<VideoResource> = self
            .api
            .get(
                "videos",
                &[("part", parts.to_string()), ("id", video_ids.join(","))],
            )
            .await?;
        Ok(response.items)
    }

    pub async fn fetch_channel(
        &self,
        selector: &ChannelSelector,
        parts: &str,
    ) -> Result<Option<ChannelResource>, Error> {
        let response: ListResponse<ChannelResource> = self
            .api
            .get("channels", &[("part", parts.to_string()), selector.query_param()])
            .await?;
        Ok(response.items.into_iter().next())
    }

    /// Id of the channel's uploads playlist, if the channel exists and has one.
    pub async fn uploads_playlist_id(&self, selector: &ChannelSelector) -> Result<Option<String>, Error> {
        let channel = self.fetch_channel(selector, "contentDetails").await?;
        Ok(channel.and_then(|channel| channel.uploads_playlist_id().map(str::to_string)))
    }

    pub async fn playlist_page(
        &self,
        playlist_id: &str,
        parts: &str,
        page_token: Option<&str>,
    ) -> Result<ListResponse<PlaylistItem>, Error> {
        let mut query = vec![
            ("part", parts.to_string()),
            ("playlistId", playlist_id.to_string()),
            ("maxResults", PLAYLIST_PAGE_SIZE.to_string()),
        ];
        if let Some(page_token) = page_token {
            query.push(("pageToken", page_token.to_string()));
        }
        self.api.get("playlistItems", &query).await
    }

    /// Every item of the channel's uploads playlist in API order. A channel that cannot be
    /// found or has no uploads playlist yields an empty list.
    pub async fn list_uploads(
        &self,
        selector: &ChannelSelector,
        parts: &str,
    ) -> Result<Vec<PlaylistItem>, Error> {
        let Some(playlist_id) = self.uploads_playlist_id(selector).await? else {
            debug!("No uploads playlist for channel {selector:?}");
            return Ok(Vec::new());
        };

        let mut items = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let page = self
                .playlist_page(&playlist_id, parts, page_token.as_deref())
                .await?;
            items.extend(page.items);
            match page.next_page_token {
                Some(next) => page_token = Some(next),
                None => break,
            }
        }

        debug!("Listed {} uploads of playlist {playlist_id}", items.len());
        Ok(items)
    }

    /// Resolves a custom name or handle to a channel id through `search.list`.
    pub async fn search_channel_id(&self, query: &str) -> Result<Option<String>, Error> {
        let response: ListResponse<SearchResult> = self
            .api
            .get(
                "search",
                &[
                    ("part", "snippet".to_string()),
                    ("type", "channel".to_string()),
                    ("maxResults", "1".to_string()),
                    ("q", query.to_string()),
                ],
            )
            .await?;
        Ok(response
            .items
            .into_iter()
            .next()
            .and_then(|item| item.snippet)
            .and_then(|snippet| snippet.channel_id))
    }

    /// Switches a video's privacy status to public.
    pub async fn publish_video(&self, video_id: &str) -> Result<(), Error> {
        let body = json!({
            "id": video_id,
            "status": { "privacyStatus": "public" }
        });
        let _: Value = self
            .api
            .put_json("videos", &[("part", "status".to_string())], &body)
            .await?;
        info!("Published video {video_id}");
        Ok(())
    }

    /// Posts a top-level comment on a video.
    pub async fn post_comment(&self, video_id: &str, text: &str) -> Result<(), Error> {
        let body = json!({
            "snippet": {
                "videoId": video_id,
                "topLevelComment": { "snippet": { "textOriginal": text } }
            }
        });
        let _: Value = self
            .api
            .post_json("commentThreads", &[("part", "snippet".to_string())], &body)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server, ServerGuard};

    fn client(server: &ServerGuard) -> YouTubeDataClient {
        YouTubeDataClient::new(
            GoogleApiClient::new(
                "ya29.token",
                &format!("{}/v3", server.url()),
                ApiSurface::YouTubeData,
            )
            .unwrap(),
        )
    }

    async fn mock_uploads_playlist(server: &mut ServerGuard, body: &str) -> mockito::Mock {
        server
            .mock("GET", "/v3/channels")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("part".into(), "contentDetails".into()),
                Matcher::UrlEncoded("id".into(), "UCabc".into()),
            ]))
            .with_status(200)
            .with_body(body)
            .create_async()
            .await
    }

    #[tokio::test]
    async fn list_uploads_follows_page_tokens_in_order() {
        let mut server = Server::new_async().await;
        mock_uploads_playlist(
            &mut server,
            r#"{"items":[{"id":"UCabc","contentDetails":{"relatedPlaylists":{"uploads":"UUabc"}}}]}"#,
        )
        .await;
        server
            .mock("GET", "/v3/playlistItems")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("playlistId".into(), "UUabc".into()),
                // first page only: no pageToken after maxResults
                Matcher::Regex("maxResults=50$".into()),
            ]))
            .with_status(200)
            .with_body(
                r#"{"items":[{"snippet":{"resourceId":{"videoId":"aaaaaaaaaaa"}}}],"nextPageToken":"P2"}"#,
            )
            .create_async()
            .await;
        server
            .mock("GET", "/v3/playlistItems")
            .match_query(Matcher::UrlEncoded("pageToken".into(), "P2".into()))
            .with_status(200)
            .with_body(r#"{"items":[{"contentDetails":{"videoId":"bbbbbbbbbbb"}}]}"#)
            .create_async()
            .await;

        let items = client(&server)
            .list_uploads(&ChannelSelector::Id("UCabc".to_string()), "snippet,status")
            .await
            .unwrap();

        let ids: Vec<_> = items.iter().filter_map(PlaylistItem::video_id).collect();
        assert_eq!(ids, vec!["aaaaaaaaaaa", "bbbbbbbbbbb"]);
    }

    #[tokio::test]
    async fn list_uploads_of_unknown_channel_is_empty() {
        let mut server = Server::new_async().await;
        mock_uploads_playlist(&mut server, r#"{"items":[]}"#).await;
        let playlist = server
            .mock("GET", "/v3/playlistItems")
            .expect(0)
            .create_async()
            .await;

        let items = client(&server)
            .list_uploads(&ChannelSelector::Id("UCabc".to_string()), "snippet")
            .await
            .unwrap();

        assert!(items.is_empty());
        playlist.assert_async().await;
    }

    #[tokio::test]
    async fn fetch_video_without_items_is_none() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/v3/videos")
            .match_query(Matcher::UrlEncoded("id".into(), "dQw4w9WgXcQ".into()))
            .with_status(200)
            .with_body(r#"{"items":[]}"#)
            .create_async()
            .await;

        let video = client(&server)
            .fetch_video("dQw4w9WgXcQ", "snippet,contentDetails,statistics")
            .await
            .unwrap();

        assert_eq!(video, None);
    }

    #[tokio::test]
    async fn publish_video_sets_privacy_status_public() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("PUT", "/v3/videos")
            .match_query(Matcher::UrlEncoded("part".into(), "status".into()))
            .match_body(Matcher::Json(json!({
                "id": "dQw4w9WgXcQ",
                "status": { "privacyStatus": "public" }
            })))
            .with_status(200)
            .with_body(r#"{"id":"dQw4w9WgXcQ"}"#)
            .create_async()
            .await;

        client(&server).publish_video("dQw4w9WgXcQ").await.unwrap();
        mock.assert_async().await;
    }

    #[test]
    fn unparsable_statistics_are_none() {
        let statistics: VideoStatistics =
            serde_json::from_str(r#"{"viewCount":"1200","likeCount":"n/a"}"#).unwrap();
        assert_eq!(statistics.views(), Some(1200));
        assert_eq!(statistics.likes(), None);
        assert_eq!(statistics.comments(), None);
    }

    #[test]
    fn playlist_item_privacy() {
        let item: PlaylistItem =
            serde_json::from_str(r#"{"status":{"privacyStatus":"private"}}"#).unwrap();
        assert!(item.is_private());
        assert_eq!(item.video_id(), None);
    }
}
