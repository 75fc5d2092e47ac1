//! Local token counting with `tiktoken-rs`.
//!
//! Counts are an approximation of what the service would bill — good enough
//! for the "tokens in context" display, not for invoicing.

use tiktoken_rs::CoreBPE;
use tracing::debug;

use crate::ChatError;

/// Token counter bound to one model's encoding.
///
/// Resolution chain: the model's own registered encoding, then `o200k_base`
/// (newer families), then `cl100k_base` (legacy). All three missing is a
/// broken installation and fails construction; counting itself never fails.
pub struct TokenCounter {
    bpe: CoreBPE,
    model: String,
}

impl TokenCounter {
    pub fn for_model(model: &str) -> Result<Self, ChatError> {
        let bpe = tiktoken_rs::get_bpe_from_model(model)
            .ok()
            .or_else(|| {
                debug!(model, "no registered encoding, falling back to o200k_base");
                tiktoken_rs::o200k_base().ok()
            })
            .or_else(|| tiktoken_rs::cl100k_base().ok())
            .ok_or_else(|| ChatError::EncodingUnavailable(model.to_string()))?;

        Ok(Self {
            bpe,
            model: model.to_string(),
        })
    }

    /// Count the tokens in `text`. Pure and deterministic for a given
    /// `(text, model)` pair; the empty string is zero tokens.
    pub fn count(&self, text: &str) -> usize {
        if text.is_empty() {
            return 0;
        }
        self.bpe.encode_with_special_tokens(text).len()
    }
}

impl std::fmt::Debug for TokenCounter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCounter")
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}
