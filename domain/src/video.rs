//! Videos of a project: CRUD, platform detail lookup and the single-video analysis lifecycle.

use crate::error::Error;
use crate::gateway::analyzer::AnalyzerClient;
use crate::gateway::youtube_data::{VideoResource, YouTubeDataClient};
use crate::video_status::VideoStatus;
use crate::youtube_reference::{extract_video_id, watch_url};
use crate::{videos, Id};
use chrono::{DateTime, Utc};
use entity_api::mutate::{self, IntoUpdateMap, UpdateMap};
use entity_api::video;
use log::*;
use sea_orm::{DatabaseConnection, IntoActiveModel, Value};
use serde::Deserialize;
use service::config::Config;
use std::sync::Arc;
use utoipa::ToSchema;

pub use entity_api::video::{find_by_id, find_by_project, find_by_video_id_and_user};

/// Parts requested when a user looks up a single video.
const DETAIL_PARTS: &str = "snippet,contentDetails,statistics";

/// Columns a client may change on a stored video. Identity, ownership and timestamps are
/// managed by the server.
const MUTABLE_COLUMNS: [&str; 21] = [
    "title",
    "description",
    "tags",
    "upload_time",
    "duration",
    "views",
    "likes",
    "dislikes",
    "comments_count",
    "impressions",
    "ctr",
    "avg_watch_time",
    "retention_curve",
    "hook_length",
    "cta_position",
    "scene_cuts",
    "script_segments",
    "subtitle_text",
    "editing_pattern",
    "status",
    "analysis",
];

/// A manually added video.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewVideo {
    pub video_id: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    #[schema(value_type = Option<String>, format = DateTime)]
    pub upload_time: Option<DateTime<Utc>>,
    pub duration: Option<i32>,
    pub tags: Option<Vec<String>>,
}

/// A video row with every optional column empty and status `not_analyzed`.
pub(crate) fn blank_model(project_id: Id, video_id: &str, title: &str) -> videos::Model {
    let now = Utc::now();
    videos::Model {
        id: Id::nil(),
        project_id,
        video_id: video_id.to_string(),
        title: title.to_string(),
        description: None,
        tags: Vec::new(),
        upload_time: None,
        duration: None,
        views: None,
        likes: None,
        dislikes: None,
        comments_count: None,
        impressions: None,
        ctr: None,
        avg_watch_time: None,
        retention_curve: None,
        hook_length: None,
        cta_position: None,
        scene_cuts: None,
        script_segments: None,
        subtitle_text: None,
        editing_pattern: None,
        status: VideoStatus::default(),
        analysis: None,
        created_at: now.into(),
        updated_at: now.into(),
    }
}

pub async fn create(
    db: &DatabaseConnection,
    project_id: Id,
    new_video: NewVideo,
) -> Result<videos::Model, Error> {
    let (Some(video_id), Some(title), Some(upload_time)) =
        (new_video.video_id, new_video.title, new_video.upload_time)
    else {
        return Err(Error::invalid("Missing required fields: videoId, title, uploadTime."));
    };

    let mut model = blank_model(project_id, &video_id, &title);
    model.description = new_video.description;
    model.upload_time = Some(upload_time.into());
    model.duration = new_video.duration;
    model.tags = new_video.tags.unwrap_or_default();

    Ok(video::create(db, model).await?)
}

pub async fn update(
    db: &DatabaseConnection,
    existing: videos::Model,
    params: impl IntoUpdateMap,
) -> Result<videos::Model, Error> {
    let mut requested = params.into_update_map();
    let mut update_map = UpdateMap::new();
    for column in MUTABLE_COLUMNS {
        update_map.insert(column.to_string(), requested.remove(column));
    }
    if update_map.is_empty() {
        return Ok(existing);
    }
    update_map.insert(
        "updated_at".to_string(),
        Some(Value::from(Utc::now().fixed_offset())),
    );

    Ok(mutate::update::<videos::ActiveModel, videos::Column>(
        db,
        existing.into_active_model(),
        update_map,
    )
    .await?)
}

pub async fn delete(db: &DatabaseConnection, id: Id) -> Result<(), Error> {
    video::delete_by_id(db, id).await?;
    info!("Deleted video {id}");
    Ok(())
}

/// Looks up a video on YouTube from a URL or bare reference. `Ok(None)` when YouTube does not
/// know the id.
pub async fn fetch_video_details(
    db: &DatabaseConnection,
    config: &Config,
    user_id: Id,
    reference: &str,
) -> Result<Option<VideoResource>, Error> {
    let video_id =
        extract_video_id(reference).ok_or_else(|| Error::invalid("Invalid YouTube URL or video ID"))?;

    let client = YouTubeDataClient::for_user(db, config, user_id).await?;
    client.fetch_video(&video_id, DETAIL_PARTS).await
}

/// Marks a video of `user_id` as pending and asks the analysis service to process it in the
/// background. The returned model already carries the pending status.
///
/// The result arrives later through [`store_analysis_result`]; if the service cannot be reached
/// or rejects the request the video is marked failed.
pub async fn trigger_analysis(
    db: Arc<DatabaseConnection>,
    config: &Config,
    user_id: Id,
    video_id: &str,
) -> Result<videos::Model, Error> {
    let video = video::find_by_video_id_and_user(db.as_ref(), video_id, user_id)
        .await?
        .ok_or_else(|| Error::not_found("Video not found or user does not have access."))?;

    let analyzer = AnalyzerClient::from_config(config)?;
    let pending = video::update_status(db.as_ref(), video.id, VideoStatus::Pending).await?;

    let id = pending.id;
    let external_id = pending.video_id.clone();
    tokio::spawn(async move {
        if let Err(e) = analyzer
            .request_analysis(&watch_url(&external_id), &external_id)
            .await
        {
            error!("Analysis of video {external_id} could not be started: {e:?}");
            if let Err(e) = video::update_status(db.as_ref(), id, VideoStatus::Failed).await {
                error!("Failed to mark video {external_id} as failed: {e:?}");
            }
        }
    });

    Ok(pending)
}

/// Stores the analysis payload posted back by the analysis service and completes the video.
pub async fn store_analysis_result(
    db: &DatabaseConnection,
    video_id: &str,
    payload: serde_json::Value,
) -> Result<videos::Model, Error> {
    let video = video::find_by_video_id(db, video_id)
        .await?
        .ok_or_else(|| Error::not_found("Video not found."))?;

    let completed = video::complete_analysis(db, video.id, payload).await?;
    info!("Stored analysis result for video {video_id}");
    Ok(completed)
}

#[cfg(test)]
#[cfg(feature = "mock")]
mod tests {
    use super::*;
    use crate::error::{DomainErrorKind, EntityErrorKind, InternalErrorKind};
    use crate::users;
    use clap::Parser;
    use mockito::Server;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use serde_json::json;

    fn user() -> users::Model {
        let now = Utc::now();
        users::Model {
            id: Id::new_v4(),
            email: "creator@example.com".to_string(),
            google_id: Some("1087".to_string()),
            name: None,
            access_token: Some("ya29.token".to_string()),
            refresh_token: None,
            token_expires_at: None,
            created_at: now.into(),
            updated_at: now.into(),
        }
    }

    fn stored_video(status: VideoStatus) -> videos::Model {
        let mut model = blank_model(Id::new_v4(), "dQw4w9WgXcQ", "Trailer");
        model.id = Id::new_v4();
        model.status = status;
        model
    }

    #[tokio::test]
    async fn create_requires_id_title_and_upload_time() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

        let err = create(
            &db,
            Id::new_v4(),
            NewVideo {
                video_id: Some("dQw4w9WgXcQ".to_string()),
                title: Some("Trailer".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();

        assert_eq!(
            err.error_kind,
            DomainErrorKind::Internal(InternalErrorKind::Entity(EntityErrorKind::Invalid(Some(
                "Missing required fields: videoId, title, uploadTime.".to_string()
            ))))
        );
        assert!(db.into_transaction_log().is_empty());
    }

    #[tokio::test]
    async fn fetch_video_details_rejects_unparsable_reference() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let config = Config::parse_from(["channel_insights_rs"]);

        let err = fetch_video_details(&db, &config, Id::new_v4(), "not a video")
            .await
            .unwrap_err();

        assert!(matches!(
            err.error_kind,
            DomainErrorKind::Internal(InternalErrorKind::Entity(EntityErrorKind::Invalid(_)))
        ));
    }

    #[tokio::test]
    async fn fetch_video_details_returns_the_platform_resource() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/v3/videos")
            .match_query(mockito::Matcher::UrlEncoded(
                "part".into(),
                "snippet,contentDetails,statistics".into(),
            ))
            .with_status(200)
            .with_body(
                r#"{"items":[{"id":"dQw4w9WgXcQ","snippet":{"title":"Trailer"},"contentDetails":{"duration":"PT3M32S"}}]}"#,
            )
            .create_async()
            .await;

        let user = user();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![user.clone()]])
            .into_connection();
        let config =
            Config::parse_from(["channel_insights_rs"]).set_youtube_data_base_url(&server.url());

        let details = fetch_video_details(&db, &config, user.id, "https://youtu.be/dQw4w9WgXcQ")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(details.id, "dQw4w9WgXcQ");
        assert_eq!(
            details.content_details.and_then(|d| d.duration).as_deref(),
            Some("PT3M32S")
        );
    }

    #[tokio::test]
    async fn trigger_analysis_of_unknown_video_is_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<videos::Model>::new()])
                .into_connection(),
        );
        let config = Config::parse_from(["channel_insights_rs"]);

        let err = trigger_analysis(db, &config, Id::new_v4(), "dQw4w9WgXcQ")
            .await
            .unwrap_err();

        assert!(matches!(
            err.error_kind,
            DomainErrorKind::Internal(InternalErrorKind::Entity(EntityErrorKind::NotFound(_)))
        ));
    }

    #[tokio::test]
    async fn rejected_analysis_request_marks_the_video_failed() {
        let mut server = Server::new_async().await;
        let analyzer = server
            .mock("POST", "/analyze_video")
            .with_status(503)
            .create_async()
            .await;

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([
                    vec![stored_video(VideoStatus::NotAnalyzed)],
                    vec![stored_video(VideoStatus::Pending)],
                    vec![stored_video(VideoStatus::Failed)],
                ])
                .into_connection(),
        );
        let config =
            Config::parse_from(["channel_insights_rs"]).set_analyzer_base_url(&server.url());

        let pending = trigger_analysis(Arc::clone(&db), &config, Id::new_v4(), "dQw4w9WgXcQ")
            .await
            .unwrap();
        assert_eq!(pending.status, VideoStatus::Pending);

        // Give the spawned task time to execute
        tokio::time::sleep(tokio::time::Duration::from_millis(200)).await;
        analyzer.assert_async().await;

        let db = Arc::try_unwrap(db).unwrap();
        let log = db.into_transaction_log();
        assert_eq!(log.len(), 3);
        assert!(log[2].statements()[0].sql.contains("\"status\""));
    }

    #[tokio::test]
    async fn unreachable_analyzer_marks_the_video_failed() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([
                    vec![stored_video(VideoStatus::NotAnalyzed)],
                    vec![stored_video(VideoStatus::Pending)],
                    vec![stored_video(VideoStatus::Failed)],
                ])
                .into_connection(),
        );
        // Nothing listens on port 1, so the request fails before any response.
        let config =
            Config::parse_from(["channel_insights_rs"]).set_analyzer_base_url("http://127.0.0.1:1");

        let pending = trigger_analysis(Arc::clone(&db), &config, Id::new_v4(), "dQw4w9WgXcQ")
            .await
            .unwrap();
        assert_eq!(pending.status, VideoStatus::Pending);

        tokio::time::sleep(tokio::time::Duration::from_millis(500)).await;

        let db = Arc::try_unwrap(db).unwrap();
        let log = db.into_transaction_log();
        assert_eq!(log.len(), 3);
        let statement = &log[2].statements()[0];
        assert!(statement.sql.starts_with("UPDATE"));
        assert!(format!("{:?}", statement.values).contains("\"failed\""));
    }

    #[tokio::test]
    async fn analysis_result_completes_the_video() {
        let completed = {
            let mut model = stored_video(VideoStatus::Completed);
            model.analysis = Some(json!({"hook_length": 2.5}));
            model
        };
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![stored_video(VideoStatus::Pending)], vec![completed]])
            .into_connection();

        let video = store_analysis_result(&db, "dQw4w9WgXcQ", json!({"hook_length": 2.5}))
            .await
            .unwrap();

        assert_eq!(video.status, VideoStatus::Completed);
        assert_eq!(video.analysis, Some(json!({"hook_length": 2.5})));
    }

    #[tokio::test]
    async fn analysis_result_for_unknown_video_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<videos::Model>::new()])
            .into_connection();

        let result = store_analysis_result(&db, "dQw4w9WgXcQ", json!({})).await;

        assert!(result.is_err());
    }
}
