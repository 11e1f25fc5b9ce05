//! Client for the video analysis service: per-video analysis, transcript embeddings and the
//! LLM question endpoint.

use super::read_json;
use crate::error::Error;
use log::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use service::config::Config;

#[derive(Debug, Serialize)]
struct AnalyzeVideoRequest<'a> {
    video_url: &'a str,
    video_id: &'a str,
}

/// Derived features of a video. The service omits whatever it could not compute.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct AnalysisResult {
    pub transcript: Option<String>,
    pub scene_cuts: Option<Value>,
    pub hook_length: Option<f64>,
    pub cta_position: Option<f64>,
    pub ocr_text: Option<String>,
    pub editing_pattern: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EmbeddingMetadata {
    pub video_id: String,
    pub title: String,
    pub project_id: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EmbeddingDocument {
    pub text: String,
    pub metadata: EmbeddingMetadata,
    pub id: String,
}

impl EmbeddingDocument {
    pub fn transcript(video_id: &str, title: &str, project_id: &str, transcript: &str) -> Self {
        Self {
            text: transcript.to_string(),
            metadata: EmbeddingMetadata {
                video_id: video_id.to_string(),
                title: title.to_string(),
                project_id: project_id.to_string(),
            },
            id: format!("transcript-{video_id}"),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct AskRequest {
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
}

pub struct AnalyzerClient {
    client: reqwest::Client,
    base_url: String,
}

impl AnalyzerClient {
    pub fn new(base_url: &str) -> Result<Self, Error> {
        let client = reqwest::Client::builder().use_rustls_tls().build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, Error> {
        Self::new(config.analyzer_base_url())
    }

    pub async fn analyze_video(&self, video_url: &str, video_id: &str) -> Result<AnalysisResult, Error> {
        debug!("Requesting analysis of video {video_id}");
        let response = self
            .client
            .post(format!("{}/analyze_video", self.base_url))
            .json(&AnalyzeVideoRequest {
                video_url,
                video_id,
            })
            .send()
            .await
            .inspect_err(|e| warn!("Failed to reach the analysis service: {e:?}"))?;

        // A 2xx with an empty body means nothing could be derived.
        let result: Option<AnalysisResult> = read_json(response, "Video analysis").await?;
        Ok(result.unwrap_or_default())
    }

    /// Asks the service to analyze a video and post the result back to the analysis-result
    /// callback later. Only the response status is checked.
    pub async fn request_analysis(&self, video_url: &str, video_id: &str) -> Result<(), Error> {
        let response = self
            .client
            .post(format!("{}/analyze_video", self.base_url))
            .json(&AnalyzeVideoRequest {
                video_url,
                video_id,
            })
            .send()
            .await
            .inspect_err(|e| warn!("Failed to reach the analysis service: {e:?}"))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let error_text = response.text().await.unwrap_or_default();
            warn!("Analysis request for video {video_id} failed with status {status}: {error_text}");
            Err(Error::external(error_text))
        }
    }

    pub async fn store_embeddings(&self, document: &EmbeddingDocument) -> Result<(), Error> {
        debug!("Storing embeddings for {}", document.id);
        let response = self
            .client
            .post(format!("{}/store_embeddings", self.base_url))
            .json(document)
            .send()
            .await
            .inspect_err(|e| warn!("Failed to reach the analysis service: {e:?}"))?;

        let _: Value = read_json(response, "Embedding storage").await?;
        Ok(())
    }

    /// Forwards a question to the LLM endpoint and returns its answer untouched.
    pub async fn ask(&self, request: &AskRequest) -> Result<Value, Error> {
        let response = self
            .client
            .post(format!("{}/ask_llm", self.base_url))
            .json(request)
            .send()
            .await
            .inspect_err(|e| warn!("Failed to reach the LLM service: {e:?}"))?;

        read_json(response, "LLM question").await
    }
}
