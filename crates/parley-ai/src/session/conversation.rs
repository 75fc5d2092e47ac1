//! Conversation struct: transcript, configuration, and token accounting.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::tokenizer::TokenCounter;
use crate::{ChatError, ReasoningEffort, Role};

use super::types::ConversationId;

/// One transcript message. Immutable once appended; `token_count` reflects
/// the encoding in effect at append time and is never recomputed.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TranscriptEntry {
    pub role: Role,
    pub text: String,
    pub token_count: u32,
}

/// A chat conversation: identity, credentials, transcript, and the
/// continuation handle from the last completed remote turn.
pub struct Conversation {
    id: ConversationId,
    name: String,
    /// Owned exclusively by this conversation; never logged.
    api_key: String,
    model: String,
    effort: ReasoningEffort,
    /// Append-only, conversation order, never pruned.
    transcript: Vec<TranscriptEntry>,
    /// `None` until a turn completes, and again after `reset_threading`.
    pub(super) last_turn_handle: Option<String>,
    /// Running sum over the transcript; recomputed after every append.
    total_tokens: u64,
    counter: TokenCounter,
    /// Whether a send is currently in flight.
    pub(super) busy: Arc<AtomicBool>,
}

impl Conversation {
    /// Create a conversation. Fails only if no token encoding can be
    /// resolved for `model` — a configuration error, not a soft condition.
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        name: impl Into<String>,
    ) -> Result<Self, ChatError> {
        let model = model.into();
        let counter = TokenCounter::for_model(&model)?;
        Ok(Self {
            id: ConversationId::new(),
            name: name.into(),
            api_key: api_key.into(),
            model,
            effort: ReasoningEffort::default(),
            transcript: Vec::new(),
            last_turn_handle: None,
            total_tokens: 0,
            counter,
            busy: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn with_effort(mut self, effort: ReasoningEffort) -> Self {
        self.effort = effort;
        self
    }

    /// Append the user's side of a turn. No remote contact.
    pub fn append_user_turn(&mut self, text: impl Into<String>) {
        self.push_entry(Role::User, text.into());
    }

    /// Append the service's side of a turn and remember its continuation
    /// handle for the next send.
    pub fn append_assistant_turn(&mut self, text: impl Into<String>, handle: impl Into<String>) {
        self.push_entry(Role::Model, text.into());
        self.last_turn_handle = Some(handle.into());
    }

    /// Forget the continuation handle so the next send replays the full
    /// transcript. The transcript itself is untouched.
    pub fn reset_threading(&mut self) {
        self.last_turn_handle = None;
    }

    /// Change the reasoning effort. Rejected while a send is in flight.
    pub fn set_effort(&mut self, effort: ReasoningEffort) -> Result<(), ChatError> {
        self.ensure_idle()?;
        self.effort = effort;
        Ok(())
    }

    /// Switch models between turns. Rejected while a send is in flight;
    /// resolves the new model's token encoding before committing.
    pub fn set_model(&mut self, model: impl Into<String>) -> Result<(), ChatError> {
        self.ensure_idle()?;
        let model = model.into();
        self.counter = TokenCounter::for_model(&model)?;
        self.model = model;
        Ok(())
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Advisory token count for a prompt the user is still composing.
    pub fn count_prompt(&self, text: &str) -> usize {
        self.counter.count(text)
    }

    pub fn id(&self) -> &ConversationId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn effort(&self) -> ReasoningEffort {
        self.effort
    }

    /// The full conversation history, in order.
    pub fn transcript(&self) -> &[TranscriptEntry] {
        &self.transcript
    }

    pub fn message_count(&self) -> usize {
        self.transcript.len()
    }

    /// Approximate tokens in context across the whole transcript.
    pub fn total_tokens(&self) -> u64 {
        self.total_tokens
    }

    pub fn last_turn_handle(&self) -> Option<&str> {
        self.last_turn_handle.as_deref()
    }

    fn push_entry(&mut self, role: Role, text: String) {
        let token_count = self.counter.count(&text) as u32;
        self.transcript.push(TranscriptEntry {
            role,
            text,
            token_count,
        });
        self.recompute_total();
    }

    /// Full re-sum rather than an incremental add, so the total can never
    /// drift from the transcript.
    fn recompute_total(&mut self) {
        self.total_tokens = self
            .transcript
            .iter()
            .map(|entry| u64::from(entry.token_count))
            .sum();
    }

    fn ensure_idle(&self) -> Result<(), ChatError> {
        if self.busy.load(Ordering::Acquire) {
            return Err(ChatError::Busy);
        }
        Ok(())
    }
}

impl fmt::Debug for Conversation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Conversation")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("effort", &self.effort)
            .field("messages", &self.transcript.len())
            .field("total_tokens", &self.total_tokens)
            .field("threaded", &self.last_turn_handle.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conversation() -> Conversation {
        Conversation::new("sk-test", "gpt-4o", "Test").unwrap()
    }

    #[test]
    fn total_always_equals_transcript_sum() {
        let mut conv = conversation();
        conv.append_user_turn("Hello there");
        conv.append_assistant_turn("General Kenobi", "resp_1");
        conv.append_user_turn("You are a bold one");

        let sum: u64 = conv
            .transcript()
            .iter()
            .map(|e| u64::from(e.token_count))
            .sum();
        assert_eq!(conv.total_tokens(), sum);
        assert!(conv.total_tokens() > 0);
    }

    #[test]
    fn assistant_turn_sets_handle_and_reset_clears_it() {
        let mut conv = conversation();
        conv.append_user_turn("hi");
        conv.append_assistant_turn("hello", "resp_42");
        assert_eq!(conv.last_turn_handle(), Some("resp_42"));

        conv.reset_threading();
        assert_eq!(conv.last_turn_handle(), None);
        // Transcript untouched by the reset.
        assert_eq!(conv.message_count(), 2);
    }

    #[test]
    fn mutation_rejected_while_busy() {
        let mut conv = conversation();
        conv.busy.store(true, Ordering::SeqCst);

        assert!(matches!(
            conv.set_effort(ReasoningEffort::High),
            Err(ChatError::Busy)
        ));
        assert!(matches!(conv.set_model("gpt-4o-mini"), Err(ChatError::Busy)));
        assert_eq!(conv.effort(), ReasoningEffort::Medium);
        assert_eq!(conv.model(), "gpt-4o");

        conv.busy.store(false, Ordering::SeqCst);
        conv.set_effort(ReasoningEffort::High).unwrap();
        assert_eq!(conv.effort(), ReasoningEffort::High);
    }

    #[test]
    fn debug_never_exposes_api_key() {
        let conv = Conversation::new("sk-very-secret", "gpt-4o", "Test").unwrap();
        let debug = format!("{conv:?}");
        assert!(!debug.contains("sk-very-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn switching_models_rebuilds_the_counter() {
        let mut conv = conversation();
        conv.set_model("gpt-5-mini").unwrap();
        assert_eq!(conv.model(), "gpt-5-mini");
        assert!(conv.count_prompt("hello world") > 0);
    }
}
