//! ChatService trait implementation for OpenAiClient.

use async_trait::async_trait;
use tracing::debug;

use crate::{ChatError, ChatService, ModelInfo, TurnReply, TurnRequest};

use super::client::{parse_models, OpenAiClient};

#[async_trait]
impl ChatService for OpenAiClient {
    async fn send_turn(&self, request: &TurnRequest) -> Result<TurnReply, ChatError> {
        let body = self.build_request_body(request);

        debug!(model = %request.model, "OpenAI responses request");

        let response = self
            .http
            .post(self.responses_url())
            .header(
                "Authorization",
                format!("Bearer {}", self.config.api_key),
            )
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body: serde_json::Value = response.json().await.unwrap_or_default();
            return Err(self.classify_error(status, &body));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|_| ChatError::MalformedReply)?;

        self.parse_response(json)
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>, ChatError> {
        let response = self
            .http
            .get(self.models_url())
            .header(
                "Authorization",
                format!("Bearer {}", self.config.api_key),
            )
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body: serde_json::Value = response.json().await.unwrap_or_default();
            return Err(self.classify_error(status, &body));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|_| ChatError::MalformedReply)?;

        Ok(parse_models(&json))
    }
}

fn map_transport_error(err: reqwest::Error) -> ChatError {
    if err.is_timeout() {
        ChatError::Timeout
    } else {
        ChatError::NetworkError(err.to_string())
    }
}
