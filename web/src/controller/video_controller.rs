//! Single-video analysis: the trigger called by the dashboard and the callback the analysis
//! service posts its results to.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::extractors::authenticated_user::AuthenticatedUser;
use crate::{AppState, Error};
use domain::error::Error as DomainError;
use domain::video as VideoApi;
use log::*;

/// Header carrying the shared secret on analysis callbacks.
pub(crate) const WEBHOOK_SECRET_HEADER: &str = "x-webhook-secret";

/// POST start analysis of one of the user's videos. Results arrive later on the callback.
#[utoipa::path(
    post,
    path = "/api/video/{video_id}/analyze",
    params(("video_id" = String, Path, description = "YouTube video id")),
    responses(
        (status = 202, description = "Analysis has been initiated"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Video not found or user does not have access"),
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn analyze(
    AuthenticatedUser(user): AuthenticatedUser,
    State(app_state): State<AppState>,
    Path(video_id): Path<String>,
) -> Result<impl IntoResponse, Error> {
    debug!("POST Analyze video {video_id}");

    VideoApi::trigger_analysis(app_state.db_conn(), &app_state.config, user.id, &video_id).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({ "message": "Analysis has been initiated." })),
    ))
}

/// POST analysis results for a video. Called by the analysis service, not by users.
#[utoipa::path(
    post,
    path = "/api/video/{video_id}/analysis-result",
    params(
        ("video_id" = String, Path, description = "YouTube video id"),
        ("x-webhook-secret" = Option<String>, Header, description = "Shared secret, required when one is configured"),
    ),
    request_body = Object,
    responses(
        (status = 200, description = "Analysis results received and stored"),
        (status = 401, description = "Secret missing or wrong"),
        (status = 404, description = "Video not found"),
    )
)]
pub async fn analysis_result(
    State(app_state): State<AppState>,
    Path(video_id): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<serde_json::Value>,
) -> Result<impl IntoResponse, Error> {
    if let Some(expected) = app_state.config.analysis_callback_secret() {
        let provided = headers
            .get(WEBHOOK_SECRET_HEADER)
            .and_then(|value| value.to_str().ok());
        if provided != Some(expected.as_str()) {
            warn!("Rejected analysis result for video {video_id}: bad webhook secret");
            return Err(DomainError::unauthenticated("Invalid webhook secret.").into());
        }
    }

    VideoApi::store_analysis_result(app_state.db_conn_ref(), &video_id, payload).await?;

    Ok(Json(
        json!({ "message": "Analysis results received and stored." }),
    ))
}

#[cfg(test)]
#[cfg(feature = "mock")]
mod tests {
    use super::WEBHOOK_SECRET_HEADER;
    use crate::test_support::{self, body_json, json_request, login, project, send, video};
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use domain::video_status::VideoStatus;
    use domain::{videos, Id};
    use mockito::Server;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use serde_json::json;

    fn callback(secret: Option<&str>, body: serde_json::Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/api/video/dQw4w9WgXcQ/analysis-result")
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(secret) = secret {
            builder = builder.header(WEBHOOK_SECRET_HEADER, secret);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    #[tokio::test]
    async fn analyze_marks_the_video_pending_and_accepts() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/analyze_video")
            .with_status(200)
            .create_async()
            .await;

        let user = test_support::user();
        let existing = video(project(user.id).id);
        let pending = videos::Model {
            status: VideoStatus::Pending,
            ..existing.clone()
        };
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![user.clone()]])
            .append_query_results([vec![existing]])
            .append_query_results([vec![pending]])
            .into_connection();
        let config = test_support::config().set_analyzer_base_url(&server.url());
        let app = test_support::app(db, config, user);
        let cookie = login(&app).await;

        let response = send(
            &app,
            json_request("POST", "/api/video/dQw4w9WgXcQ/analyze", &cookie, json!({})),
        )
        .await;

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(
            body_json(response).await,
            json!({ "message": "Analysis has been initiated." })
        );
    }

    #[tokio::test]
    async fn analyze_of_an_unknown_video_is_not_found() {
        let user = test_support::user();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![user.clone()]])
            .append_query_results([Vec::<videos::Model>::new()])
            .into_connection();
        let app = test_support::app(db, test_support::config(), user);
        let cookie = login(&app).await;

        let response = send(
            &app,
            json_request("POST", "/api/video/unknown0000/analyze", &cookie, json!({})),
        )
        .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn callback_stores_the_payload_without_a_session() {
        let existing = video(Id::new_v4());
        let completed = videos::Model {
            status: VideoStatus::Completed,
            analysis: Some(json!({ "hook_length": 2.1 })),
            ..existing.clone()
        };
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![existing]])
            .append_query_results([vec![completed]])
            .into_connection();
        let app = test_support::app(db, test_support::config(), test_support::user());

        let response = send(&app, callback(None, json!({ "hook_length": 2.1 }))).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({ "message": "Analysis results received and stored." })
        );
    }

    #[tokio::test]
    async fn callback_with_a_wrong_secret_is_rejected() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let config = test_support::config().set_analysis_callback_secret(Some("s3cret".to_string()));
        let app = test_support::app(db, config, test_support::user());

        let response = send(&app, callback(Some("guess"), json!({}))).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = send(&app, callback(None, json!({}))).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn callback_for_an_unknown_video_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<videos::Model>::new()])
            .into_connection();
        let config = test_support::config().set_analysis_callback_secret(Some("s3cret".to_string()));
        let app = test_support::app(db, config, test_support::user());

        let response = send(&app, callback(Some("s3cret"), json!({}))).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
