use crate::protect::{authorize, Predicate, UserOwnsProject, VideoInProject};
use crate::{extractors::authenticated_user::AuthenticatedUser, AppState};
use axum::{
    extract::{Path, Request, State},
    middleware::Next,
    response::IntoResponse,
};
use domain::Id;

/// Checks that the project in the path belongs to the authenticated user and that the video
/// in the path belongs to that project.
pub(crate) async fn owned(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path((project_id, short_id)): Path<(Id, Id)>,
    request: Request,
    next: Next,
) -> impl IntoResponse {
    let checks = vec![
        Predicate::new(UserOwnsProject, vec![project_id]),
        Predicate::new(VideoInProject, vec![project_id, short_id]),
    ];
    authorize(&app_state, user, request, next, checks).await
}
