//! The send protocol: continuation threading with bounded full-context
//! fallback.

use tracing::{debug, warn};

use crate::{supports_reasoning, ChatError, ChatService, Role, TurnInput, TurnRequest, WireMessage};

use super::conversation::Conversation;
use super::types::BusyGuard;

impl Conversation {
    /// Send `prompt` as the next user turn and return the assistant's reply.
    ///
    /// If the conversation has a continuation handle, the request references
    /// it and carries only the new prompt. When the service reports the
    /// referenced turn gone (`TurnNotFound`), threading is reset and the
    /// request is retried exactly once with the full transcript replayed.
    /// Any other error, including a failure of that retry, propagates.
    ///
    /// The user and assistant turns land in the transcript together, once
    /// the service has replied. A failed or cancelled send therefore leaves
    /// the conversation exactly as it was.
    pub async fn send(
        &mut self,
        service: &dyn ChatService,
        prompt: impl Into<String>,
    ) -> Result<String, ChatError> {
        let _guard = BusyGuard::acquire(&self.busy)?;
        let prompt = prompt.into();

        // Decided once; the fallback retry reuses it.
        let reasoning = supports_reasoning(self.model()).then(|| self.effort());

        let continuation = self.last_turn_handle.clone();
        let request = TurnRequest {
            model: self.model().to_string(),
            input: match continuation {
                Some(handle) => TurnInput::Continuation {
                    handle,
                    prompt: prompt.clone(),
                },
                None => self.full_context_input(&prompt),
            },
            // Always ask the service to keep the turn so the *next* send
            // can thread off it.
            store: true,
            reasoning,
        };

        let threaded = matches!(request.input, TurnInput::Continuation { .. });
        debug!(
            conversation = %self.id(),
            model = %request.model,
            threaded,
            "sending turn"
        );

        let reply = match service.send_turn(&request).await {
            Ok(reply) => reply,
            Err(ChatError::TurnNotFound) if threaded => {
                warn!(
                    conversation = %self.id(),
                    "continuation handle stale, replaying full history"
                );
                self.reset_threading();
                let retry = TurnRequest {
                    model: request.model,
                    input: self.full_context_input(&prompt),
                    store: true,
                    reasoning,
                };
                service.send_turn(&retry).await?
            }
            Err(err) => return Err(err),
        };

        self.append_user_turn(prompt);
        self.append_assistant_turn(reply.text.as_str(), reply.handle);
        debug!(
            conversation = %self.id(),
            total_tokens = self.total_tokens(),
            "turn completed"
        );
        Ok(reply.text)
    }

    /// Replay the whole transcript as role-tagged wire messages, new prompt
    /// last.
    fn full_context_input(&self, prompt: &str) -> TurnInput {
        let mut messages: Vec<WireMessage> = self
            .transcript()
            .iter()
            .map(|entry| WireMessage {
                role: entry.role,
                content: entry.text.clone(),
            })
            .collect();
        messages.push(WireMessage {
            role: Role::User,
            content: prompt.to_string(),
        });
        TurnInput::FullContext(messages)
    }
}
