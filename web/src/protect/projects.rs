use crate::protect::{authorize, Predicate, UserOwnsProject};
use crate::{extractors::authenticated_user::AuthenticatedUser, AppState};
use axum::{
    extract::{Path, Request, State},
    middleware::Next,
    response::IntoResponse,
};
use domain::Id;

/// Checks that the project in the path belongs to the authenticated user.
/// Intended to be given to axum::middleware::from_fn_with_state in the router
pub(crate) async fn owned(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(project_id): Path<Id>,
    request: Request,
    next: Next,
) -> impl IntoResponse {
    let checks = vec![Predicate::new(UserOwnsProject, vec![project_id])];
    authorize(&app_state, user, request, next, checks).await
}
