use domain::gateway::analyzer::AskRequest;
use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct AskParams {
    pub query: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f64>,
}

impl From<AskParams> for AskRequest {
    fn from(params: AskParams) -> Self {
        AskRequest {
            query: params.query.unwrap_or_default(),
            max_tokens: params.max_tokens,
            temperature: params.temperature,
        }
    }
}
