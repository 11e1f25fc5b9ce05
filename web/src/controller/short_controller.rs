//! Manual CRUD over the videos of a project. The routes say "shorts" but cover any video.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use crate::params::short::UpdateParams;
use crate::{AppState, Error};
use domain::video::NewVideo;
use domain::{video as VideoApi, Id};
use log::*;

/// GET the videos of a project.
#[utoipa::path(
    get,
    path = "/api/projects/{id}/shorts",
    params(("id" = uuid::Uuid, Path, description = "Project id")),
    responses(
        (status = 200, description = "Videos of the project", body = [domain::videos::Model]),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Project not found"),
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn index(
    State(app_state): State<AppState>,
    Path(project_id): Path<Id>,
) -> Result<impl IntoResponse, Error> {
    let videos = VideoApi::find_by_project(app_state.db_conn_ref(), project_id).await?;
    Ok(Json(videos))
}

/// POST add a video to a project by hand.
#[utoipa::path(
    post,
    path = "/api/projects/{id}/shorts",
    params(("id" = uuid::Uuid, Path, description = "Project id")),
    request_body = NewVideo,
    responses(
        (status = 201, description = "Successfully created the video", body = domain::videos::Model),
        (status = 400, description = "Missing required fields"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Project not found"),
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn create(
    State(app_state): State<AppState>,
    Path(project_id): Path<Id>,
    Json(new_video): Json<NewVideo>,
) -> Result<impl IntoResponse, Error> {
    debug!("POST Create video in project {project_id}: {new_video:?}");

    let video = VideoApi::create(app_state.db_conn_ref(), project_id, new_video).await?;

    Ok((StatusCode::CREATED, Json(video)))
}

/// PUT partially update a video of a project.
#[utoipa::path(
    put,
    path = "/api/projects/{id}/shorts/{short_id}",
    params(
        ("id" = uuid::Uuid, Path, description = "Project id"),
        ("short_id" = uuid::Uuid, Path, description = "Video id"),
    ),
    request_body = UpdateParams,
    responses(
        (status = 200, description = "Successfully updated the video", body = domain::videos::Model),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Project or video not found"),
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn update(
    State(app_state): State<AppState>,
    Path((_project_id, short_id)): Path<(Id, Id)>,
    Json(params): Json<UpdateParams>,
) -> Result<impl IntoResponse, Error> {
    let existing = VideoApi::find_by_id(app_state.db_conn_ref(), short_id).await?;
    let video = VideoApi::update(app_state.db_conn_ref(), existing, params).await?;
    Ok(Json(video))
}

/// DELETE a video of a project.
#[utoipa::path(
    delete,
    path = "/api/projects/{id}/shorts/{short_id}",
    params(
        ("id" = uuid::Uuid, Path, description = "Project id"),
        ("short_id" = uuid::Uuid, Path, description = "Video id"),
    ),
    responses(
        (status = 204, description = "Successfully deleted the video"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Project or video not found"),
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn delete(
    State(app_state): State<AppState>,
    Path((_project_id, short_id)): Path<(Id, Id)>,
) -> Result<impl IntoResponse, Error> {
    VideoApi::delete(app_state.db_conn_ref(), short_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
#[cfg(feature = "mock")]
mod tests {
    use crate::test_support::{
        self, body_json, body_text, json_request, login, project, send, video,
    };
    use axum::http::StatusCode;
    use domain::{videos, Id};
    use sea_orm::{DatabaseBackend, MockDatabase};
    use serde_json::json;

    #[tokio::test]
    async fn create_without_required_fields_is_a_bad_request() {
        let user = test_support::user();
        let owned = project(user.id);
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![user.clone()]])
            .append_query_results([vec![owned.clone()]])
            .into_connection();
        let app = test_support::app(db, test_support::config(), user);
        let cookie = login(&app).await;

        let response = send(
            &app,
            json_request(
                "POST",
                &format!("/api/projects/{}/shorts", owned.id),
                &cookie,
                json!({ "title": "No id" }),
            ),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_text(response).await,
            "Missing required fields: videoId, title, uploadTime."
        );
    }

    #[tokio::test]
    async fn create_returns_the_new_video() {
        let user = test_support::user();
        let owned = project(user.id);
        let created = video(owned.id);
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![user.clone()]])
            .append_query_results([vec![owned.clone()]])
            .append_query_results([vec![created.clone()]])
            .into_connection();
        let app = test_support::app(db, test_support::config(), user);
        let cookie = login(&app).await;

        let response = send(
            &app,
            json_request(
                "POST",
                &format!("/api/projects/{}/shorts", owned.id),
                &cookie,
                json!({
                    "videoId": "dQw4w9WgXcQ",
                    "title": "Launch",
                    "uploadTime": "2026-01-05T10:00:00Z",
                    "duration": 59
                }),
            ),
        )
        .await;

        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        assert_eq!(body["video_id"], "dQw4w9WgXcQ");
        assert_eq!(body["status"], "not_analyzed");
    }

    #[tokio::test]
    async fn video_of_another_project_is_not_found() {
        let user = test_support::user();
        let owned = project(user.id);
        let elsewhere = video(Id::new_v4());
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![user.clone()]])
            .append_query_results([vec![owned.clone()]])
            .append_query_results([vec![elsewhere.clone()]])
            .into_connection();
        let app = test_support::app(db, test_support::config(), user);
        let cookie = login(&app).await;

        let response = send(
            &app,
            json_request(
                "PUT",
                &format!("/api/projects/{}/shorts/{}", owned.id, elsewhere.id),
                &cookie,
                json!({ "title": "Hijacked" }),
            ),
        )
        .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn update_applies_partial_changes() {
        let user = test_support::user();
        let owned = project(user.id);
        let existing = video(owned.id);
        let updated = videos::Model {
            hook_length: Some(2.5),
            ..existing.clone()
        };
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![user.clone()]])
            .append_query_results([vec![owned.clone()]])
            .append_query_results([vec![existing.clone()]])
            .append_query_results([vec![existing.clone()]])
            .append_query_results([vec![updated]])
            .into_connection();
        let app = test_support::app(db, test_support::config(), user);
        let cookie = login(&app).await;

        let response = send(
            &app,
            json_request(
                "PUT",
                &format!("/api/projects/{}/shorts/{}", owned.id, existing.id),
                &cookie,
                json!({ "hookLength": 2.5 }),
            ),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["hook_length"], 2.5);
    }
}
