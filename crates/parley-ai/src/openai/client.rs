//! OpenAI client struct, request building, and response parsing.

use crate::{ChatError, ModelInfo, Role, TurnInput, TurnReply, TurnRequest};

use super::config::OpenAiConfig;

/// Stale-handle error code in Responses API error payloads.
const TURN_NOT_FOUND_CODE: &str = "previous_response_not_found";

/// OpenAI API client.
pub struct OpenAiClient {
    pub(crate) config: OpenAiConfig,
    pub(crate) http: reqwest::Client,
}

impl OpenAiClient {
    pub fn new(config: OpenAiConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::builder()
                .connect_timeout(std::time::Duration::from_secs(10))
                .timeout(std::time::Duration::from_secs(120))
                .build()
                .expect("failed to build HTTP client"),
        }
    }

    pub(crate) fn responses_url(&self) -> String {
        format!("{}/responses", self.config.base_url)
    }

    pub(crate) fn models_url(&self) -> String {
        format!("{}/models", self.config.base_url)
    }

    /// Build the JSON request body for the Responses API.
    pub(crate) fn build_request_body(&self, request: &TurnRequest) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": request.model,
            "store": request.store,
        });

        match &request.input {
            TurnInput::Continuation { handle, prompt } => {
                body["input"] = serde_json::json!([{
                    "role": "user",
                    "content": prompt,
                }]);
                body["previous_response_id"] = serde_json::json!(handle);
            }
            TurnInput::FullContext(messages) => {
                let msgs: Vec<_> = messages
                    .iter()
                    .map(|msg| {
                        // Internal role vocabulary → API role vocabulary.
                        let role = match msg.role {
                            Role::User => "user",
                            Role::Model => "assistant",
                        };
                        serde_json::json!({
                            "role": role,
                            "content": msg.content,
                        })
                    })
                    .collect();
                body["input"] = serde_json::json!(msgs);
            }
        }

        if let Some(effort) = request.reasoning {
            body["reasoning"] = serde_json::json!({ "effort": effort.as_str() });
        }

        body
    }

    /// Parse a successful Responses API payload into a reply.
    ///
    /// Extraction is an ordered chain of total strategies, first hit wins:
    /// 1. top-level `output_text`
    /// 2. text reconstructed from `output[].content[]` blocks
    ///
    /// Differently-shaped but well-formed payloads fall through the chain;
    /// only an empty result overall is an error.
    pub(crate) fn parse_response(&self, json: serde_json::Value) -> Result<TurnReply, ChatError> {
        let text = extract_output_text(&json)
            .or_else(|| extract_from_output_blocks(&json))
            .ok_or(ChatError::MalformedReply)?;

        let handle = json["id"]
            .as_str()
            .map(String::from)
            .ok_or(ChatError::MalformedReply)?;

        Ok(TurnReply { text, handle })
    }

    /// Map a non-success response body to the error taxonomy.
    pub(crate) fn classify_error(
        &self,
        status: reqwest::StatusCode,
        body: &serde_json::Value,
    ) -> ChatError {
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return ChatError::RateLimited;
        }

        let code = body["error"]["code"].as_str().unwrap_or("");
        let message = body["error"]["message"].as_str().unwrap_or("");
        // Code is the machine-checkable kind; the message substring covers
        // older payloads that only carried prose.
        if code == TURN_NOT_FOUND_CODE || message.contains("Previous response") {
            return ChatError::TurnNotFound;
        }

        let detail = if message.is_empty() {
            body.to_string().chars().take(200).collect::<String>()
        } else {
            message.to_string()
        };
        ChatError::ApiError(format!("HTTP {status}: {detail}"))
    }
}

/// Parse a models-list payload into sorted model infos. Entries without
/// an id are skipped.
pub(crate) fn parse_models(json: &serde_json::Value) -> Vec<ModelInfo> {
    let mut models: Vec<ModelInfo> = json["data"]
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| {
                    Some(ModelInfo {
                        id: item["id"].as_str()?.to_string(),
                        owned_by: item["owned_by"].as_str().unwrap_or("").to_string(),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    models.sort_by(|a, b| a.id.cmp(&b.id));
    models
}

/// Strategy 1: the convenience `output_text` field.
fn extract_output_text(json: &serde_json::Value) -> Option<String> {
    json["output_text"]
        .as_str()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(String::from)
}

/// Strategy 2: concatenate `output_text` content blocks from the
/// structured `output` list.
fn extract_from_output_blocks(json: &serde_json::Value) -> Option<String> {
    let items = json["output"].as_array()?;
    let texts: Vec<&str> = items
        .iter()
        .filter(|item| item["type"] == "message")
        .flat_map(|item| item["content"].as_array().into_iter().flatten())
        .filter(|block| block["type"] == "output_text")
        .filter_map(|block| block["text"].as_str())
        .filter(|text| !text.is_empty())
        .collect();

    if texts.is_empty() {
        None
    } else {
        Some(texts.join("\n").trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ReasoningEffort, WireMessage};

    fn client() -> OpenAiClient {
        OpenAiClient::new(OpenAiConfig::new("sk-test"))
    }

    fn continuation_request(reasoning: Option<ReasoningEffort>) -> TurnRequest {
        TurnRequest {
            model: "gpt-5-mini".to_string(),
            input: TurnInput::Continuation {
                handle: "resp_prev".to_string(),
                prompt: "next question".to_string(),
            },
            store: true,
            reasoning,
        }
    }

    #[test]
    fn continuation_body_references_the_handle() {
        let body = client().build_request_body(&continuation_request(None));
        assert_eq!(body["previous_response_id"], "resp_prev");
        assert_eq!(body["store"], true);
        let input = body["input"].as_array().unwrap();
        assert_eq!(input.len(), 1);
        assert_eq!(input[0]["role"], "user");
        assert_eq!(input[0]["content"], "next question");
    }

    #[test]
    fn full_context_body_replays_history_with_mapped_roles() {
        let request = TurnRequest {
            model: "gpt-4o".to_string(),
            input: TurnInput::FullContext(vec![
                WireMessage {
                    role: Role::User,
                    content: "q1".to_string(),
                },
                WireMessage {
                    role: Role::Model,
                    content: "a1".to_string(),
                },
                WireMessage {
                    role: Role::User,
                    content: "q2".to_string(),
                },
            ]),
            store: true,
            reasoning: None,
        };
        let body = client().build_request_body(&request);

        assert!(body.get("previous_response_id").is_none());
        let input = body["input"].as_array().unwrap();
        assert_eq!(input.len(), 3);
        assert_eq!(input[0]["role"], "user");
        // Internal `model` role goes out as `assistant`.
        assert_eq!(input[1]["role"], "assistant");
        assert_eq!(input[1]["content"], "a1");
        assert_eq!(input[2]["content"], "q2");
    }

    #[test]
    fn reasoning_attached_only_when_present() {
        let with = client().build_request_body(&continuation_request(Some(ReasoningEffort::High)));
        assert_eq!(with["reasoning"]["effort"], "high");

        let without = client().build_request_body(&continuation_request(None));
        assert!(without.get("reasoning").is_none());
    }

    #[test]
    fn parse_prefers_output_text() {
        let json = serde_json::json!({
            "id": "resp_1",
            "output_text": "direct answer",
            "output": [{
                "type": "message",
                "content": [{ "type": "output_text", "text": "ignored" }],
            }],
        });
        let reply = client().parse_response(json).unwrap();
        assert_eq!(reply.text, "direct answer");
        assert_eq!(reply.handle, "resp_1");
    }

    #[test]
    fn parse_reconstructs_from_output_blocks() {
        let json = serde_json::json!({
            "id": "resp_2",
            "output": [
                { "type": "reasoning", "content": [] },
                {
                    "type": "message",
                    "content": [
                        { "type": "output_text", "text": "part one" },
                        { "type": "output_text", "text": "part two" },
                    ],
                },
            ],
        });
        let reply = client().parse_response(json).unwrap();
        assert_eq!(reply.text, "part one\npart two");
    }

    #[test]
    fn parse_rejects_payload_with_no_text() {
        let json = serde_json::json!({
            "id": "resp_3",
            "output": [{ "type": "reasoning", "content": [] }],
        });
        assert!(matches!(
            client().parse_response(json),
            Err(ChatError::MalformedReply)
        ));
    }

    #[test]
    fn parse_rejects_payload_without_a_handle() {
        let json = serde_json::json!({ "output_text": "text but no id" });
        assert!(matches!(
            client().parse_response(json),
            Err(ChatError::MalformedReply)
        ));
    }

    #[test]
    fn stale_handle_error_maps_to_turn_not_found() {
        let body = serde_json::json!({
            "error": {
                "code": "previous_response_not_found",
                "message": "Previous response with id 'resp_x' not found.",
            }
        });
        let err = client().classify_error(reqwest::StatusCode::NOT_FOUND, &body);
        assert!(matches!(err, ChatError::TurnNotFound));

        // Prose-only payloads are matched by message substring.
        let prose = serde_json::json!({
            "error": { "message": "Previous response expired" }
        });
        let err = client().classify_error(reqwest::StatusCode::BAD_REQUEST, &prose);
        assert!(matches!(err, ChatError::TurnNotFound));
    }

    #[test]
    fn model_list_is_parsed_and_sorted_ascending() {
        let json = serde_json::json!({
            "data": [
                { "id": "gpt-5-mini", "owned_by": "system" },
                { "id": "dall-e-3", "owned_by": "system" },
                { "id": "gpt-4o", "owned_by": "openai" },
                { "owned_by": "system" },
            ]
        });
        let models = parse_models(&json);
        let ids: Vec<&str> = models.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["dall-e-3", "gpt-4o", "gpt-5-mini"]);
        assert_eq!(models[1].owned_by, "openai");
    }

    #[test]
    fn model_list_tolerates_missing_data() {
        assert!(parse_models(&serde_json::json!({})).is_empty());
    }

    #[test]
    fn rate_limit_and_generic_errors_map_to_their_kinds() {
        let err = client().classify_error(
            reqwest::StatusCode::TOO_MANY_REQUESTS,
            &serde_json::json!({}),
        );
        assert!(matches!(err, ChatError::RateLimited));

        let err = client().classify_error(
            reqwest::StatusCode::UNAUTHORIZED,
            &serde_json::json!({ "error": { "message": "bad key" } }),
        );
        match err {
            ChatError::ApiError(msg) => assert!(msg.contains("bad key")),
            other => panic!("expected ApiError, got {other:?}"),
        }
    }
}
