use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use domain::user::AuthSession;
use log::*;

/// Rejects requests without a signed-in user with 401 instead of redirecting to a login page.
pub async fn require_auth(auth_session: AuthSession, request: Request, next: Next) -> Response {
    if auth_session.user.is_some() {
        return next.run(request).await;
    }
    trace!("Rejecting unauthenticated request to {}", request.uri().path());
    (StatusCode::UNAUTHORIZED, "Unauthorized").into_response()
}
