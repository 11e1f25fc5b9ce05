//! Google sign-in and session introspection.
//!
//! The Google endpoints are reached through browser redirects, so they are not behind the
//! `require_auth` layer.

use crate::extractors::authenticated_user::AuthenticatedUser;
use crate::{AppState, Error};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;
use domain::user::{self as UserApi, AuthSession};
use log::*;
use serde::Deserialize;
use serde_json::json;
use utoipa::IntoParams;

#[derive(Debug, Deserialize, IntoParams)]
pub struct GoogleAuthParams {
    /// Comma separated extra scopes, e.g. `drive.file,calendar`
    pub scopes: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct GoogleCallbackParams {
    pub code: Option<String>,
    pub error: Option<String>,
}

/// GET /auth/google
#[utoipa::path(
    get,
    path = "/auth/google",
    params(GoogleAuthParams),
    responses(
        (status = 303, description = "Redirect to the Google consent screen"),
        (status = 500, description = "Google OAuth is not configured"),
    )
)]
pub async fn google(
    State(app_state): State<AppState>,
    Query(params): Query<GoogleAuthParams>,
) -> Result<impl IntoResponse, Error> {
    let url = UserApi::google_authorize_url(&app_state.config, params.scopes.as_deref())?;
    Ok(Redirect::to(&url))
}

/// GET /auth/google/callback
///
/// Exchanges the authorization code, stores the user's tokens, starts a session and sends the
/// browser back to the frontend.
#[utoipa::path(
    get,
    path = "/auth/google/callback",
    params(GoogleCallbackParams),
    responses(
        (status = 303, description = "Signed in, redirect to the frontend"),
        (status = 500, description = "Authentication failed"),
    )
)]
pub async fn google_callback(
    State(app_state): State<AppState>,
    mut auth_session: AuthSession,
    Query(params): Query<GoogleCallbackParams>,
) -> Response {
    let failed = || (StatusCode::INTERNAL_SERVER_ERROR, "Authentication failed").into_response();

    let code = match (params.code, params.error) {
        (Some(code), None) => code,
        (_, error) => {
            warn!("Google sign-in was not completed: {error:?}");
            return failed();
        }
    };

    let identity = match UserApi::sign_in_with_google(&app_state.config, &code).await {
        Ok(identity) => identity,
        Err(e) => {
            error!("Error retrieving Google tokens: {e:?}");
            return failed();
        }
    };

    let user = match auth_session.authenticate(identity).await {
        Ok(Some(user)) => user,
        Ok(None) => return failed(),
        Err(e) => {
            error!("Storing Google user failed: {e:?}");
            return failed();
        }
    };

    if let Err(e) = auth_session.login(&user).await {
        error!("Session login failed: {e:?}");
        return failed();
    }

    info!("User {} signed in with Google", user.id);
    Redirect::to(app_state.config.frontend_base_url()).into_response()
}

/// GET /auth/status
#[utoipa::path(
    get,
    path = "/auth/status",
    responses(
        (status = 200, description = "Signed in, with the session user"),
        (status = 401, description = "No session"),
    )
)]
pub async fn status(auth_session: AuthSession) -> impl IntoResponse {
    match auth_session.user {
        Some(user) => (
            StatusCode::OK,
            Json(json!({ "authenticated": true, "user": user })),
        ),
        None => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "authenticated": false })),
        ),
    }
}

/// GET /auth/me
///
/// Google profile of the session user, with `channelId`, `channelTitle` and `channelThumbnail`
/// when the account has a YouTube channel.
#[utoipa::path(
    get,
    path = "/auth/me",
    responses(
        (status = 200, description = "Profile of the session user"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Failed to fetch user profile"),
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn me(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<impl IntoResponse, Error> {
    let profile =
        UserApi::profile_with_channel(app_state.db_conn_ref(), &app_state.config, user.id).await?;
    Ok(Json(profile))
}

/// DELETE /auth/logout
#[utoipa::path(
    delete,
    path = "/auth/logout",
    responses(
        (status = 200, description = "Signed out"),
        (status = 401, description = "Unauthorized"),
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn logout(mut auth_session: AuthSession) -> Response {
    match auth_session.logout().await {
        Ok(user) => {
            debug!("Signed out user {:?}", user.map(|user| user.id));
            (StatusCode::OK, Json(json!({ "message": "Logged out." }))).into_response()
        }
        Err(e) => {
            error!("Logout failed: {e:?}");
            (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL SERVER ERROR").into_response()
        }
    }
}
