//! Conversation engine for Parley.
//!
//! Talks to a stateful, turn-based chat completion service with:
//! - Per-conversation transcript and token accounting
//! - Turn threading via service-side continuation handles, with a
//!   bounded full-context fallback when a handle goes stale
//! - Reasoning-effort gating by model family
//! - An OpenAI Responses API client behind the `ChatService` trait

pub mod openai;
pub mod reasoning;
pub mod session;
pub mod tokenizer;

use async_trait::async_trait;

pub use openai::{OpenAiClient, OpenAiConfig};
pub use reasoning::{supports_reasoning, ReasoningEffort};
pub use session::{Conversation, ConversationId, TranscriptEntry};
pub use tokenizer::TokenCounter;

/// Remote turn-based chat completion service.
///
/// The engine only ever reaches the network through this trait; tests
/// substitute a scripted mock, production uses [`OpenAiClient`].
#[async_trait]
pub trait ChatService: Send + Sync {
    /// Execute one turn. The service is asked to persist the turn so the
    /// returned handle can thread the next request.
    async fn send_turn(&self, request: &TurnRequest) -> Result<TurnReply, ChatError>;

    /// List the models available to the configured credentials.
    async fn list_models(&self) -> Result<Vec<ModelInfo>, ChatError>;
}

/// One outbound turn, fully decided by the protocol before it reaches
/// the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnRequest {
    pub model: String,
    pub input: TurnInput,
    /// Ask the service to store this turn for later continuation.
    pub store: bool,
    /// Present only for reasoning-compatible models.
    pub reasoning: Option<ReasoningEffort>,
}

/// The two request-building strategies. Mutually exclusive by construction:
/// a request either references a stored prior turn or replays history.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnInput {
    /// Reference the service's stored prior turn; only the new prompt rides.
    Continuation { handle: String, prompt: String },
    /// Replay the whole transcript as role-tagged messages (new prompt last).
    FullContext(Vec<WireMessage>),
}

/// Role-tagged message as the wire sees it.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct WireMessage {
    pub role: Role,
    pub content: String,
}

/// Who authored a transcript entry. `Model` is the internal label for
/// service-authored turns; transports map it to their own vocabulary
/// (`"assistant"` for OpenAI).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

/// A completed turn as returned by the service.
#[derive(Debug, Clone)]
pub struct TurnReply {
    /// Extracted reply text (never empty — see `ChatError::MalformedReply`).
    pub text: String,
    /// Continuation handle for the next request.
    pub handle: String,
}

/// A model advertised by the service.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ModelInfo {
    pub id: String,
    #[serde(default)]
    pub owned_by: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    /// No usable token encoding for the model — fatal configuration error,
    /// surfaced at conversation creation, never per-call.
    #[error("no token encoding available for model '{0}'")]
    EncodingUnavailable(String),
    #[error("API error: {0}")]
    ApiError(String),
    #[error("Rate limited")]
    RateLimited,
    #[error("Network error: {0}")]
    NetworkError(String),
    /// Transport timeout. Non-retryable: the bounded fallback in
    /// `Conversation::send` applies to `TurnNotFound` only.
    #[error("Timeout")]
    Timeout,
    /// The referenced prior turn no longer exists on the service side.
    /// The single condition that triggers the full-context fallback.
    #[error("previous turn not found on service")]
    TurnNotFound,
    /// A response arrived but no reply text could be extracted from it.
    #[error("no reply text in service response")]
    MalformedReply,
    /// The conversation already has an in-flight send.
    #[error("conversation is busy with another request")]
    Busy,
}
