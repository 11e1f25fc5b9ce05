use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeParams {
    /// Any channel URL form: `/channel/<id>`, `/c/<name>`, `/user/<name>` or `@handle`
    pub channel_url: Option<String>,
}
