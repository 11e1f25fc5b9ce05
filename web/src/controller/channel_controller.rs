use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;

use crate::extractors::authenticated_user::AuthenticatedUser;
use crate::params::channel::AnalyzeParams;
use crate::{AppState, Error};
use domain::channel as ChannelApi;
use domain::error::Error as DomainError;
use log::*;

/// POST analyze a channel: track it as a project and import its uploads.
///
/// Calling it again for a tracked channel refreshes the same project and videos.
#[utoipa::path(
    post,
    path = "/api/channel/analyze",
    request_body = AnalyzeParams,
    responses(
        (status = 200, description = "The project with its imported videos", body = domain::project::ProjectWithVideos),
        (status = 400, description = "channelUrl is missing or not a channel URL"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Channel not found on YouTube"),
        (status = 502, description = "YouTube could not be reached"),
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn analyze(
    AuthenticatedUser(user): AuthenticatedUser,
    State(app_state): State<AppState>,
    Json(params): Json<AnalyzeParams>,
) -> Result<impl IntoResponse, Error> {
    let channel_url = params
        .channel_url
        .filter(|url| !url.trim().is_empty())
        .ok_or_else(|| DomainError::invalid("channelUrl is required"))?;
    debug!("POST Analyze channel {channel_url} for user {}", user.id);

    let project = ChannelApi::analyze_channel(
        app_state.db_conn_ref(),
        &app_state.config,
        user.id,
        &channel_url,
    )
    .await?;

    Ok(Json(project))
}
