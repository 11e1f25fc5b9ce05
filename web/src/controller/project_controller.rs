use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::extractors::authenticated_user::AuthenticatedUser;
use crate::params::project::UpdateParams;
use crate::{AppState, Error};
use domain::sync::SyncJob;
use domain::{project as ProjectApi, Id};
use log::*;

/// GET all projects of the session user, each with its videos.
#[utoipa::path(
    get,
    path = "/api/projects",
    responses(
        (status = 200, description = "Successfully retrieved the user's projects", body = [domain::project::ProjectWithVideos]),
        (status = 401, description = "Unauthorized"),
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn index(
    AuthenticatedUser(user): AuthenticatedUser,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, Error> {
    debug!("GET Projects of user {}", user.id);

    let projects = ProjectApi::find_by_user_with_videos(app_state.db_conn_ref(), user.id).await?;

    Ok(Json(projects))
}

/// PUT partially update a project.
#[utoipa::path(
    put,
    path = "/api/projects/{id}",
    params(("id" = uuid::Uuid, Path, description = "Id of the project to update")),
    request_body = UpdateParams,
    responses(
        (status = 200, description = "Successfully updated the project", body = domain::projects::Model),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Project not found"),
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn update(
    AuthenticatedUser(user): AuthenticatedUser,
    State(app_state): State<AppState>,
    Path(id): Path<Id>,
    Json(params): Json<UpdateParams>,
) -> Result<impl IntoResponse, Error> {
    debug!("PUT Update project {id} with {params:?}");

    let project = ProjectApi::update(app_state.db_conn_ref(), user.id, id, params).await?;

    Ok(Json(project))
}

/// DELETE a project and all of its videos.
#[utoipa::path(
    delete,
    path = "/api/projects/{id}",
    params(("id" = uuid::Uuid, Path, description = "Id of the project to delete")),
    responses(
        (status = 204, description = "Successfully deleted the project"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Project not found"),
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn delete(
    AuthenticatedUser(user): AuthenticatedUser,
    State(app_state): State<AppState>,
    Path(id): Path<Id>,
) -> Result<impl IntoResponse, Error> {
    debug!("DELETE project {id}");

    ProjectApi::delete(app_state.db_conn_ref(), user.id, id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// POST queue a sync of the project's videos with YouTube and the analysis service.
///
/// Responds as soon as the sync is queued; its outcome is only visible by reading the project
/// again later.
#[utoipa::path(
    post,
    path = "/api/projects/{id}/sync",
    params(("id" = uuid::Uuid, Path, description = "Id of the project to sync")),
    responses(
        (status = 202, description = "Sync process initiated"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Project not found"),
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn sync(
    AuthenticatedUser(user): AuthenticatedUser,
    State(app_state): State<AppState>,
    Path(id): Path<Id>,
) -> Result<impl IntoResponse, Error> {
    app_state.sync_queue.enqueue(SyncJob {
        user_id: user.id,
        project_id: id,
    })?;

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({ "message": "Sync process initiated." })),
    ))
}
