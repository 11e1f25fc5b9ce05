use crate::{
    controller::{
        ask_controller, auth_controller, channel_controller, health_check_controller,
        project_controller, short_controller, upload_controller, video_controller,
        youtube_controller,
    },
    middleware::auth::require_auth,
    params, protect, AppState,
};
use axum::{
    extract::DefaultBodyLimit,
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get, post, put},
    Router,
};
use tower_http::services::ServeDir;

use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_rapidoc::RapiDoc;

// Global definition of the OpenAPI document. A path or schema only shows up in the rendered
// document when it is listed here.
#[derive(OpenApi)]
#[openapi(
        info(
            title = "Channel Insights API"
        ),
        paths(
            ask_controller::ask,
            auth_controller::google,
            auth_controller::google_callback,
            auth_controller::status,
            auth_controller::me,
            auth_controller::logout,
            channel_controller::analyze,
            health_check_controller::health_check,
            project_controller::index,
            project_controller::update,
            project_controller::delete,
            project_controller::sync,
            short_controller::index,
            short_controller::create,
            short_controller::update,
            short_controller::delete,
            upload_controller::upload_images,
            video_controller::analyze,
            video_controller::analysis_result,
            youtube_controller::video_details,
            youtube_controller::private_videos,
            youtube_controller::schedule_publish,
        ),
        components(
            schemas(
                domain::projects::Model,
                domain::videos::Model,
                domain::users::Model,
                domain::scheduled_publishes::Model,
                domain::video_status::VideoStatus,
                domain::scheduled_publish_status::ScheduledPublishStatus,
                domain::project::ProjectWithVideos,
                domain::scheduled_publish::PrivateVideo,
                domain::scheduled_publish::SchedulePublishParams,
                domain::video::NewVideo,
                params::ask::AskParams,
                params::channel::AnalyzeParams,
                params::project::UpdateParams,
                params::short::UpdateParams,
                params::youtube::VideoDetailsParams,
            )
        ),
        modifiers(&SecurityAddon),
        tags(
            (name = "channel_insights", description = "YouTube channel and video analytics API")
        )
    )]
struct ApiDoc;

struct SecurityAddon;

// Cookie session authentication requirement for the OpenAPI document.
impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "cookie_auth",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                    "channel_insights.sid",
                    "Session id set by the Google sign-in callback via Set-Cookie header",
                ))),
            )
        }
    }
}

pub fn define_routes(app_state: AppState) -> Router {
    let upload_dir = app_state.config.upload_dir().to_string();

    Router::new()
        .merge(health_routes())
        .merge(auth_routes(app_state.clone()))
        .merge(auth_protected_routes(app_state.clone()))
        .merge(project_routes(app_state.clone()))
        .merge(short_routes(app_state.clone()))
        .merge(channel_routes(app_state.clone()))
        .merge(video_routes(app_state.clone()))
        .merge(analysis_callback_routes(app_state.clone()))
        .merge(ask_routes(app_state.clone()))
        .merge(upload_routes(app_state.clone()))
        .merge(youtube_routes(app_state))
        .merge(RapiDoc::with_openapi("/api-docs/openapi.json", ApiDoc::openapi()).path("/rapidoc"))
        .nest_service(upload_controller::PUBLIC_IMAGES_PATH, ServeDir::new(upload_dir))
}

fn health_routes() -> Router {
    Router::new().route("/health", get(health_check_controller::health_check))
}

fn auth_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/auth/google", get(auth_controller::google))
        .route("/auth/google/callback", get(auth_controller::google_callback))
        .route("/auth/status", get(auth_controller::status))
        .with_state(app_state)
}

fn auth_protected_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/auth/me", get(auth_controller::me))
        .route("/auth/logout", delete(auth_controller::logout))
        .route_layer(from_fn(require_auth))
        .with_state(app_state)
}

fn project_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/api/projects", get(project_controller::index))
        .merge(
            // PUT, DELETE /api/projects/:id and POST /api/projects/:id/sync
            Router::new()
                .route("/api/projects/:id", put(project_controller::update))
                .route("/api/projects/:id", delete(project_controller::delete))
                .route("/api/projects/:id/sync", post(project_controller::sync))
                .route_layer(from_fn_with_state(
                    app_state.clone(),
                    protect::projects::owned,
                )),
        )
        .route_layer(from_fn(require_auth))
        .with_state(app_state)
}

fn short_routes(app_state: AppState) -> Router {
    Router::new()
        .merge(
            // GET, POST /api/projects/:id/shorts
            Router::new()
                .route("/api/projects/:id/shorts", get(short_controller::index))
                .route("/api/projects/:id/shorts", post(short_controller::create))
                .route_layer(from_fn_with_state(
                    app_state.clone(),
                    protect::projects::owned,
                )),
        )
        .merge(
            // PUT, DELETE /api/projects/:id/shorts/:short_id
            Router::new()
                .route(
                    "/api/projects/:id/shorts/:short_id",
                    put(short_controller::update),
                )
                .route(
                    "/api/projects/:id/shorts/:short_id",
                    delete(short_controller::delete),
                )
                .route_layer(from_fn_with_state(
                    app_state.clone(),
                    protect::shorts::owned,
                )),
        )
        .route_layer(from_fn(require_auth))
        .with_state(app_state)
}

fn channel_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/api/channel/analyze", post(channel_controller::analyze))
        .route_layer(from_fn(require_auth))
        .with_state(app_state)
}

fn video_routes(app_state: AppState) -> Router {
    Router::new()
        .route(
            "/api/video/:video_id/analyze",
            post(video_controller::analyze),
        )
        .route_layer(from_fn(require_auth))
        .with_state(app_state)
}

// Called by the analysis service, which has no user session.
fn analysis_callback_routes(app_state: AppState) -> Router {
    Router::new()
        .route(
            "/api/video/:video_id/analysis-result",
            post(video_controller::analysis_result),
        )
        .with_state(app_state)
}

fn ask_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/api/ask", post(ask_controller::ask))
        .route_layer(from_fn(require_auth))
        .with_state(app_state)
}

fn upload_routes(app_state: AppState) -> Router {
    Router::new()
        .route(
            "/api/upload/multiple-images",
            post(upload_controller::upload_images),
        )
        .route_layer(DefaultBodyLimit::max(upload_controller::MAX_UPLOAD_BYTES))
        .route_layer(from_fn(require_auth))
        .with_state(app_state)
}

fn youtube_routes(app_state: AppState) -> Router {
    Router::new()
        .route(
            "/api/youtube/video-details",
            post(youtube_controller::video_details),
        )
        .route(
            "/api/youtube/private-videos",
            get(youtube_controller::private_videos),
        )
        .route(
            "/api/youtube/schedule-publish",
            post(youtube_controller::schedule_publish),
        )
        .route_layer(from_fn(require_auth))
        .with_state(app_state)
}
