//! Per-conversation state and the message-threading send protocol.
//!
//! A `Conversation` owns its transcript, credentials, token totals, and the
//! continuation handle from the last remote turn. `Conversation::send` is
//! the only operation that touches the network.

mod conversation;
mod send;
mod types;

pub use conversation::{Conversation, TranscriptEntry};
pub use types::ConversationId;
