use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, error, instrument};

use super::prompt::AnalysisRequest;
use crate::config::AnalysisConfig;

#[derive(Debug, Error)]
pub enum ServiceError {
    /// Network failure or non-2xx status.
    #[error("{0}")]
    Transport(String),
    /// The envelope arrived but carried no readable text.
    #[error("{0}")]
    Unreadable(String),
}

/// The hosted model that turns meal text into an assessment.
#[async_trait]
pub trait AnalysisService: Send + Sync {
    /// Sends the request and returns the concatenated text of the reply.
    async fn analyze(&self, request: &AnalysisRequest) -> Result<String, ServiceError>;
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentSegment>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentSegment {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Joins every text segment, in order, ignoring other segment kinds.
fn join_text(segments: Vec<ContentSegment>) -> String {
    segments
        .into_iter()
        .filter_map(|s| match s {
            ContentSegment::Text { text } => Some(text),
            ContentSegment::Other => None,
        })
        .collect()
}

/// Client for the Anthropic Messages API.
pub struct AnthropicClient {
    client: Client,
    config: AnalysisConfig,
}

impl AnthropicClient {
    pub fn new(config: AnalysisConfig) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.config.api_url)
    }
}

fn describe_failure(status: reqwest::StatusCode, body: &str) -> String {
    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(e) => format!("status {status}: {}", e.error.message),
        Err(_) => format!(
            "status {status}: {}",
            body.chars().take(200).collect::<String>()
        ),
    }
}

#[async_trait]
impl AnalysisService for AnthropicClient {
    #[instrument(skip(self, request), fields(model = %request.model))]
    async fn analyze(&self, request: &AnalysisRequest) -> Result<String, ServiceError> {
        let response = self
            .client
            .post(self.messages_url())
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", &self.config.api_version)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "analysis request failed");
                ServiceError::Transport(format!("failed to connect: {e}"))
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            error!(error = %e, "reading analysis response failed");
            ServiceError::Transport(format!("failed to read response: {e}"))
        })?;

        if !status.is_success() {
            let message = describe_failure(status, &body);
            error!(%status, %message, "analysis service returned an error");
            return Err(ServiceError::Transport(message));
        }

        let envelope: MessagesResponse = serde_json::from_str(&body)
            .map_err(|e| ServiceError::Unreadable(e.to_string()))?;
        let text = join_text(envelope.content);
        debug!(chars = text.len(), "analysis reply received");
        Ok(text)
    }
}


#[cfg(test)]
mod client_tests {
    use super::*;

    #[test]
    fn joins_only_text_segments_in_order() {
        let envelope: MessagesResponse = serde_json::from_str(
            r#"{
                "id": "msg_1",
                "content": [
                    {"type": "text", "text": "```json\n{\"a\":"},
                    {"type": "tool_use", "id": "t1", "name": "x", "input": {}},
                    {"type": "text", "text": "1}\n```"}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(join_text(envelope.content), "```json\n{\"a\":1}\n```");
    }

    #[test]
    fn missing_content_joins_to_empty() {
        let envelope: MessagesResponse = serde_json::from_str(r#"{"id":"msg_2"}"#).unwrap();
        assert_eq!(join_text(envelope.content), "");
    }

    #[test]
    fn failure_description_prefers_api_message() {
        let msg = describe_failure(
            reqwest::StatusCode::TOO_MANY_REQUESTS,
            r#"{"type":"error","error":{"type":"rate_limit_error","message":"slow down"}}"#,
        );
        assert!(msg.contains("429"));
        assert!(msg.contains("slow down"));

        let msg = describe_failure(reqwest::StatusCode::BAD_GATEWAY, "<html>oops</html>");
        assert!(msg.contains("<html>oops</html>"));
    }

    #[test]
    fn messages_url_joins_base() {
        let client = AnthropicClient::new(AnalysisConfig {
            api_url: "http://localhost:4010".into(),
            ..AnalysisConfig::default()
        })
        .unwrap();
        assert_eq!(client.messages_url(), "http://localhost:4010/v1/messages");
    }
}
