use axum::http::{
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    HeaderValue, Method,
};
use axum::Router;
use axum_login::{
    tower_sessions::{Expiry, SessionManagerLayer, SessionStore},
    AuthManagerLayerBuilder,
};
use domain::sync::SyncQueue;
use domain::user::Backend;
use log::*;
use service::config::Config;
use std::io;
use std::ops::Deref;
use time::Duration;
use tower_http::cors::CorsLayer;
use tower_sessions_sqlx_store::PostgresStore;

mod controller;
mod error;
mod extractors;
mod middleware;
mod params;
mod protect;
pub mod router;

#[cfg(test)]
#[cfg(feature = "mock")]
mod test_support;

pub use error::{Error, Result};

/// Web-level state: the service infrastructure plus the background sync queue.
#[derive(Clone)]
pub struct AppState {
    service_state: service::AppState,
    pub sync_queue: SyncQueue,
}

impl AppState {
    pub fn new(service_state: service::AppState, sync_queue: SyncQueue) -> Self {
        Self {
            service_state,
            sync_queue,
        }
    }
}

impl Deref for AppState {
    type Target = service::AppState;

    fn deref(&self) -> &Self::Target {
        &self.service_state
    }
}

pub async fn init_server(app_state: AppState) -> io::Result<()> {
    let pool = app_state.db_conn_ref().get_postgres_connection_pool().clone();
    let session_store = PostgresStore::new(pool)
        .with_schema_name(service::DB_SCHEMA)
        .map_err(io::Error::other)?;
    session_store.migrate().await.map_err(io::Error::other)?;

    let session_layer = session_layer(session_store, &app_state.config);
    let app = with_layers(router::define_routes(app_state.clone()), &app_state, session_layer);

    let server_url = format!("{}:{}", app_state.config.interface, app_state.config.port);
    let listener = tokio::net::TcpListener::bind(&server_url).await?;
    info!("Server starting... listening for connections on http://{server_url}");

    axum::serve(listener, app).await
}

fn session_layer<S: SessionStore + Clone>(store: S, config: &Config) -> SessionManagerLayer<S> {
    SessionManagerLayer::new(store)
        .with_name("channel_insights.sid")
        .with_secure(config.is_production())
        .with_expiry(Expiry::OnInactivity(Duration::seconds(
            config.backend_session_expiry_seconds as i64,
        )))
}

/// Wraps `router` with the session, authentication and CORS layers.
fn with_layers<S: SessionStore + Clone>(
    router: Router,
    app_state: &AppState,
    session_layer: SessionManagerLayer<S>,
) -> Router {
    let backend = Backend::new(&app_state.database_connection);
    let auth_layer = AuthManagerLayerBuilder::new(backend, session_layer).build();

    router
        .layer(auth_layer)
        .layer(cors_layer(&app_state.config))
}

fn cors_layer(config: &Config) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(origin) => Some(origin),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {origin}");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([ACCEPT, AUTHORIZATION, CONTENT_TYPE])
}
