//! OpenAI Responses API client.
//!
//! Implements the `ChatService` trait against `POST /v1/responses` and
//! `GET /v1/models`. Threading uses the API's `previous_response_id`
//! mechanism; the stale-handle error is surfaced as
//! `ChatError::TurnNotFound` so the session layer can fall back.

mod api;
mod client;
mod config;

pub use client::OpenAiClient;
pub use config::OpenAiConfig;
