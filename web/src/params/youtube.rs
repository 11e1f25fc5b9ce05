use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VideoDetailsParams {
    /// Watch, short, embed or `youtu.be` URL, or a bare video id
    pub youtube_url: Option<String>,
}
