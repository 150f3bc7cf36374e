//! Chatbot integration
//!
//! - **client**: the HTTP client and the `ChatBackend` seam
//! - **pipeline**: worker thread that runs requests off the UI thread

pub mod client;
pub mod pipeline;

pub use client::{parse_reply, ChatBackend, ChatRequest, ChatbaseClient};
pub use pipeline::{ChatCancel, ChatCommand, ChatEvent, ChatPipeline};
