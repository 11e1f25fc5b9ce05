//! Ownership checks run as route middleware before a handler touches a project or video.
//!
//! Every check answers whether the authenticated user may act on the rows named in the path.
//! A failed check is reported as 404 so a client cannot learn that another user's row exists.

pub(crate) mod projects;
pub(crate) mod shorts;

use crate::AppState;
use axum::{
    async_trait, extract::Request, http::StatusCode, middleware::Next, response::IntoResponse,
};
use domain::{project as ProjectApi, video as VideoApi, Id};
use log::*;

/// A single authorization rule, evaluated against the authenticated user and the path ids
/// supplied in `args`.
#[async_trait]
pub trait Check: Send + Sync {
    async fn eval(&self, app: &AppState, user: &domain::users::Model, args: Vec<Id>) -> bool;
}

/// Pairs a [`Check`] with the ids it is evaluated against.
pub(crate) struct Predicate {
    predicate: Box<dyn Check>,
    args: Vec<Id>,
}

impl Predicate {
    pub(crate) fn new<C: Check + 'static>(predicate: C, args: Vec<Id>) -> Self {
        Self {
            predicate: Box::new(predicate),
            args,
        }
    }

    pub(crate) async fn check(&self, app_state: &AppState, user: &domain::users::Model) -> bool {
        self.predicate
            .eval(app_state, user, self.args.clone())
            .await
    }
}

/// Runs `checks` in order and only calls `next` when all of them pass.
pub(crate) async fn authorize(
    app_state: &AppState,
    authenticated_user: domain::users::Model,
    request: Request,
    next: Next,
    checks: Vec<Predicate>,
) -> impl IntoResponse {
    for check in checks {
        if !check.check(app_state, &authenticated_user).await {
            return (StatusCode::NOT_FOUND, "NOT FOUND").into_response();
        }
    }
    next.run(request).await
}

/// args: `[project_id]`
pub struct UserOwnsProject;

#[async_trait]
impl Check for UserOwnsProject {
    async fn eval(
        &self,
        app_state: &AppState,
        authenticated_user: &domain::users::Model,
        args: Vec<Id>,
    ) -> bool {
        let project_id = args[0];
        match ProjectApi::find_by_id(app_state.db_conn_ref(), project_id).await {
            Ok(project) => project.user_id == authenticated_user.id,
            Err(e) => {
                debug!("Project {project_id} not found: {e:?}");
                false
            }
        }
    }
}

/// args: `[project_id, video_id]`
pub struct VideoInProject;

#[async_trait]
impl Check for VideoInProject {
    async fn eval(
        &self,
        app_state: &AppState,
        _authenticated_user: &domain::users::Model,
        args: Vec<Id>,
    ) -> bool {
        let (project_id, video_id) = (args[0], args[1]);
        match VideoApi::find_by_id(app_state.db_conn_ref(), video_id).await {
            Ok(video) => video.project_id == project_id,
            Err(e) => {
                debug!("Video {video_id} not found: {e:?}");
                false
            }
        }
    }
}
