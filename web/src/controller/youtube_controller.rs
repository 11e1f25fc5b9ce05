use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::extractors::authenticated_user::AuthenticatedUser;
use crate::params::youtube::VideoDetailsParams;
use crate::{AppState, Error};
use domain::error::Error as DomainError;
use domain::scheduled_publish::{self as ScheduledPublishApi, SchedulePublishParams};
use domain::video as VideoApi;
use log::*;

/// POST look up a single video on YouTube by URL or id.
#[utoipa::path(
    post,
    path = "/api/youtube/video-details",
    request_body = VideoDetailsParams,
    responses(
        (status = 200, description = "The YouTube video resource", body = Object),
        (status = 400, description = "youtubeUrl missing or not a YouTube video reference"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Video not found"),
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn video_details(
    AuthenticatedUser(user): AuthenticatedUser,
    State(app_state): State<AppState>,
    Json(params): Json<VideoDetailsParams>,
) -> Result<impl IntoResponse, Error> {
    let reference = params
        .youtube_url
        .filter(|url| !url.trim().is_empty())
        .ok_or_else(|| DomainError::invalid("youtubeUrl is required"))?;

    let video = VideoApi::fetch_video_details(
        app_state.db_conn_ref(),
        &app_state.config,
        user.id,
        &reference,
    )
    .await?
    .ok_or_else(|| DomainError::not_found("Video not found."))?;

    Ok(Json(video))
}

/// GET the private uploads of the user's own channel.
#[utoipa::path(
    get,
    path = "/api/youtube/private-videos",
    responses(
        (status = 200, description = "Private uploads", body = [domain::scheduled_publish::PrivateVideo]),
        (status = 401, description = "Unauthorized"),
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn private_videos(
    AuthenticatedUser(user): AuthenticatedUser,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, Error> {
    let videos =
        ScheduledPublishApi::list_private_videos(app_state.db_conn_ref(), &app_state.config, user.id)
            .await?;
    Ok(Json(videos))
}

/// POST schedule a private upload to go public, optionally followed by comments.
#[utoipa::path(
    post,
    path = "/api/youtube/schedule-publish",
    request_body = SchedulePublishParams,
    responses(
        (status = 200, description = "Video scheduling request received"),
        (status = 400, description = "Missing fields or unreadable publishTime"),
        (status = 401, description = "Unauthorized"),
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn schedule_publish(
    AuthenticatedUser(user): AuthenticatedUser,
    State(app_state): State<AppState>,
    Json(params): Json<SchedulePublishParams>,
) -> Result<impl IntoResponse, Error> {
    debug!("POST Schedule publish for user {}: {params:?}", user.id);

    ScheduledPublishApi::create(app_state.db_conn_ref(), user.id, params).await?;

    Ok(Json(
        json!({ "message": "Video scheduling request received." }),
    ))
}
