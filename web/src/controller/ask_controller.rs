use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;

use crate::params::ask::AskParams;
use crate::{AppState, Error};
use domain::ask as AskApi;

/// POST a question about the indexed transcripts; the LLM service's answer is returned as is.
#[utoipa::path(
    post,
    path = "/api/ask",
    request_body = AskParams,
    responses(
        (status = 200, description = "Answer of the LLM service", body = Object),
        (status = 400, description = "Query is required"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "The LLM service failed"),
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn ask(
    State(app_state): State<AppState>,
    Json(params): Json<AskParams>,
) -> Result<impl IntoResponse, Error> {
    let answer = AskApi::ask(&app_state.config, params.into()).await?;
    Ok(Json(answer))
}

#[cfg(test)]
#[cfg(feature = "mock")]
mod tests {
    use crate::test_support::{self, body_json, json_request, login, send};
    use axum::http::StatusCode;
    use mockito::Server;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use serde_json::json;

    #[tokio::test]
    async fn answer_is_passed_through() {
        let mut server = Server::new_async().await;
        let upstream = server
            .mock("POST", "/ask_llm")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"answer":"Hooks under 3s retain best","sources":[]}"#)
            .create_async()
            .await;

        let user = test_support::user();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![user.clone()]])
            .into_connection();
        let config = test_support::config().set_analyzer_base_url(&server.url());
        let app = test_support::app(db, config, user);
        let cookie = login(&app).await;

        let response = send(
            &app,
            json_request(
                "POST",
                "/api/ask",
                &cookie,
                json!({ "query": "Which hooks work?", "max_tokens": 200 }),
            ),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({ "answer": "Hooks under 3s retain best", "sources": [] })
        );
        upstream.assert_async().await;
    }

    #[tokio::test]
    async fn empty_query_is_a_bad_request() {
        let user = test_support::user();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![user.clone()]])
            .into_connection();
        let app = test_support::app(db, test_support::config(), user);
        let cookie = login(&app).await;

        let response = send(
            &app,
            json_request("POST", "/api/ask", &cookie, json!({ "query": "  " })),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
