use axum::http::StatusCode;
use axum::response::IntoResponse;

/// GET liveness probe
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "API router is up and responding to requests", body = String),
    )
)]
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "healthy")
}

#[cfg(test)]
#[cfg(feature = "mock")]
mod tests {
    use crate::test_support::{self, body_text, send};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn health_needs_no_session() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let app = test_support::app(db, test_support::config(), test_support::user());

        let response = send(
            &app,
            Request::builder().uri("/health").body(Body::empty()).unwrap(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "healthy");
    }
}
