//! Channel analysis: resolve a pasted channel URL, track it as a project and import every
//! upload as a video.

use crate::error::Error;
use crate::gateway::youtube_data::{
    ChannelSelector, PlaylistItem, VideoResource, YouTubeDataClient,
};
use crate::project::ProjectWithVideos;
use crate::video::blank_model;
use crate::youtube_reference::{parse_channel_reference, ChannelReference};
use crate::{videos, Id};
use entity_api::{project, video};
use log::*;
use sea_orm::DatabaseConnection;
use service::config::Config;
use std::collections::HashMap;

/// Stored project descriptions are cut to this many characters.
pub const DESCRIPTION_MAX_CHARS: usize = 200;

/// Columns refreshed when an already tracked video is imported again.
const REFRESHED_COLUMNS: [videos::Column; 6] = [
    videos::Column::Title,
    videos::Column::Description,
    videos::Column::UploadTime,
    videos::Column::Views,
    videos::Column::Likes,
    videos::Column::CommentsCount,
];

/// Every item of a channel's uploads playlist, using the caller's Google credentials.
pub async fn list_all_videos(
    db: &DatabaseConnection,
    config: &Config,
    user_id: Id,
    selector: &ChannelSelector,
    parts: &str,
) -> Result<Vec<PlaylistItem>, Error> {
    let client = YouTubeDataClient::for_user(db, config, user_id).await?;
    client.list_uploads(selector, parts).await
}

/// Creates or refreshes the project for the channel at `channel_url` and imports its uploads.
///
/// Running it again for the same channel updates the same rows instead of adding new ones.
pub async fn analyze_channel(
    db: &DatabaseConnection,
    config: &Config,
    user_id: Id,
    channel_url: &str,
) -> Result<ProjectWithVideos, Error> {
    let client = YouTubeDataClient::for_user(db, config, user_id).await?;

    let channel_id = resolve_channel_id(&client, channel_url).await?;
    let channel = client
        .fetch_channel(
            &ChannelSelector::Id(channel_id.clone()),
            "snippet,statistics,contentDetails",
        )
        .await?
        .ok_or_else(|| Error::not_found("YouTube channel not found."))?;

    let snippet = channel.snippet.clone().unwrap_or_default();
    let description = snippet
        .description
        .map(|description| truncate_chars(&description, DESCRIPTION_MAX_CHARS));
    let project = project::upsert_by_channel_id(
        db,
        user_id,
        &channel_id,
        snippet.title.unwrap_or_default(),
        description,
    )
    .await?;
    info!("Analyzing channel {channel_id} for project {}", project.id);

    let Some(playlist_id) = channel.uploads_playlist_id() else {
        warn!("Channel {channel_id} has no uploads playlist");
        let videos = video::find_by_project(db, project.id).await?;
        return Ok(ProjectWithVideos { project, videos });
    };

    let mut imported = 0;
    let mut page_token: Option<String> = None;
    loop {
        let page = client
            .playlist_page(playlist_id, "snippet,contentDetails", page_token.as_deref())
            .await?;

        let ids: Vec<String> = page
            .items
            .iter()
            .filter_map(|item| item.video_id().map(str::to_string))
            .collect();
        let details: HashMap<String, VideoResource> = client
            .fetch_videos(&ids, "statistics,snippet")
            .await?
            .into_iter()
            .map(|resource| (resource.id.clone(), resource))
            .collect();

        for item in &page.items {
            let Some(video_id) = item.video_id() else {
                continue;
            };
            let model = imported_video(project.id, video_id, item, details.get(video_id));
            video::upsert_by_video_id(db, model, &REFRESHED_COLUMNS).await?;
            imported += 1;
        }

        match page.next_page_token {
            Some(next) => page_token = Some(next),
            None => break,
        }
    }
    debug!("Imported {imported} videos of channel {channel_id}");

    let videos = video::find_by_project(db, project.id).await?;
    Ok(ProjectWithVideos { project, videos })
}

async fn resolve_channel_id(client: &YouTubeDataClient, channel_url: &str) -> Result<String, Error> {
    let channel_id = match parse_channel_reference(channel_url) {
        Some(ChannelReference::Id(id)) => Some(id),
        Some(ChannelReference::Custom(name)) | Some(ChannelReference::Handle(name)) => {
            client.search_channel_id(&name).await?
        }
        None => None,
    };
    channel_id.ok_or_else(|| Error::not_found("Could not determine channel ID"))
}

fn imported_video(
    project_id: Id,
    video_id: &str,
    item: &PlaylistItem,
    detail: Option<&VideoResource>,
) -> videos::Model {
    let item_snippet = item.snippet.clone().unwrap_or_default();
    let detail_snippet = detail.and_then(|d| d.snippet.clone()).unwrap_or_default();
    let statistics = detail.and_then(|d| d.statistics.clone()).unwrap_or_default();

    let title = item_snippet
        .title
        .or(detail_snippet.title)
        .unwrap_or_default();
    let mut model = blank_model(project_id, video_id, &title);
    model.description = item_snippet.description.or(detail_snippet.description);
    model.upload_time = item_snippet
        .published_at
        .or(detail_snippet.published_at)
        .map(Into::into);
    model.tags = detail_snippet.tags.unwrap_or_default();
    model.views = statistics.views();
    model.likes = statistics.likes();
    model.comments_count = statistics.comments();
    model
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptions_are_truncated_by_characters() {
        let long = "é".repeat(250);
        assert_eq!(truncate_chars(&long, DESCRIPTION_MAX_CHARS).chars().count(), 200);
        assert_eq!(truncate_chars("short", DESCRIPTION_MAX_CHARS), "short");
    }

    #[test]
    fn imported_video_takes_statistics_and_tags_from_details() {
        let item: PlaylistItem = serde_json::from_str(
            r#"{"snippet":{"title":"Trailer","publishedAt":"2024-05-01T12:00:00Z"},
                "contentDetails":{"videoId":"dQw4w9WgXcQ"}}"#,
        )
        .unwrap();
        let detail: VideoResource = serde_json::from_str(
            r#"{"id":"dQw4w9WgXcQ","snippet":{"tags":["music"]},
                "statistics":{"viewCount":"10","likeCount":"3","commentCount":"1"}}"#,
        )
        .unwrap();

        let model = imported_video(Id::new_v4(), "dQw4w9WgXcQ", &item, Some(&detail));

        assert_eq!(model.title, "Trailer");
        assert_eq!(model.tags, vec!["music".to_string()]);
        assert_eq!(model.views, Some(10));
        assert_eq!(model.comments_count, Some(1));
        assert!(model.upload_time.is_some());
        assert_eq!(model.status, crate::video_status::VideoStatus::NotAnalyzed);
    }
}
