//! Router harness for handler tests: a MockDatabase-backed app with an in-memory session store
//! and a `/test/login` route that signs in a fixed user.

use crate::{router, with_layers, AppState};
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    response::Response,
    routing::post,
    Router,
};
use axum_login::tower_sessions::{MemoryStore, SessionManagerLayer};
use chrono::Utc;
use clap::Parser;
use domain::sync::SyncQueue;
use domain::user::AuthSession;
use domain::video_status::VideoStatus;
use domain::{projects, users, videos, Id};
use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};
use service::config::Config;
use std::sync::Arc;
use tower::ServiceExt;

pub(crate) fn config() -> Config {
    Config::parse_from(["channel_insights_rs"])
}

pub(crate) fn user() -> users::Model {
    let now = Utc::now();
    users::Model {
        id: Id::new_v4(),
        email: "creator@example.com".to_string(),
        google_id: Some("1089".to_string()),
        name: Some("Creator".to_string()),
        access_token: Some("ya29.token".to_string()),
        refresh_token: None,
        token_expires_at: None,
        created_at: now.into(),
        updated_at: now.into(),
    }
}

pub(crate) fn project(user_id: Id) -> projects::Model {
    let now = Utc::now();
    projects::Model {
        id: Id::new_v4(),
        user_id,
        channel_id: "UC_x5XG1OV2P6uZZ5FSM9Ttw".to_string(),
        channel_name: "Google for Developers".to_string(),
        description: None,
        created_at: now.into(),
        updated_at: now.into(),
    }
}

pub(crate) fn video(project_id: Id) -> videos::Model {
    let now = Utc::now();
    videos::Model {
        id: Id::new_v4(),
        project_id,
        video_id: "dQw4w9WgXcQ".to_string(),
        title: "Launch".to_string(),
        description: None,
        tags: vec![],
        upload_time: Some(now.into()),
        duration: Some(59),
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
        status: VideoStatus::NotAnalyzed,
        analysis: None,
        created_at: now.into(),
        updated_at: now.into(),
    }
}

/// The full router over `db`. Background syncs run against their own empty database so they
/// never consume query results queued for the request under test.
pub(crate) fn app(db: DatabaseConnection, config: Config, user: users::Model) -> Router {
    let db = Arc::new(db);
    let queue_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
    let app_state = AppState::new(
        service::AppState::new(config.clone(), &db),
        SyncQueue::start(queue_db, config),
    );

    let login_route = Router::new().route(
        "/test/login",
        post(move |mut auth_session: AuthSession| {
            let user = user.clone();
            async move {
                match auth_session.login(&user).await {
                    Ok(()) => StatusCode::OK,
                    Err(_) => StatusCode::INTERNAL_SERVER_ERROR,
                }
            }
        }),
    );

    let session_layer = SessionManagerLayer::new(MemoryStore::default()).with_secure(false);
    with_layers(
        router::define_routes(app_state.clone()).merge(login_route),
        &app_state,
        session_layer,
    )
}

/// Signs in the harness user and returns the session cookie.
pub(crate) async fn login(app: &Router) -> String {
    let request = Request::builder()
        .method("POST")
        .uri("/test/login")
        .body(Body::empty())
        .unwrap();
    let response = send(app, request).await;
    assert_eq!(response.status(), StatusCode::OK);

    response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|cookie| cookie.to_str().ok())
        .and_then(|cookie| cookie.split(';').next())
        .map(str::to_string)
        .expect("login sets a session cookie")
}

pub(crate) async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.unwrap()
}

pub(crate) fn json_request(method: &str, uri: &str, cookie: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::COOKIE, cookie)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub(crate) fn get_request(uri: &str, cookie: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap()
}

pub(crate) async fn body_json(response: Response) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub(crate) async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
