use crate::error::Error;
use crate::gateway::analyzer::{AnalyzerClient, AskRequest};
use log::*;
use service::config::Config;

/// Forwards a question about the indexed transcripts to the LLM service and returns its answer
/// untouched.
pub async fn ask(config: &Config, request: AskRequest) -> Result<serde_json::Value, Error> {
    if request.query.trim().is_empty() {
        return Err(Error::invalid("Query is required."));
    }

    debug!("Forwarding question to the LLM service");
    AnalyzerClient::from_config(config)?
        .ask(&request)
        .await
        .inspect_err(|e| error!("Error calling LLM service: {e:?}"))
}
