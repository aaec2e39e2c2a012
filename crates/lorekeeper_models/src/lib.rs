//! Model transport for Lorekeeper.
//!
//! [`ChatCompletionsClient`] speaks the OpenAI-compatible
//! `/chat/completions` protocol and implements
//! [`StructuredGenerator`](lorekeeper_interface::StructuredGenerator):
//! the reply text is searched for a JSON object, and anything that is not
//! one becomes an empty mapping.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod client;
mod dto;
mod extraction;

pub use client::{ChatCompletionsClient, ClientSettings, ClientSettingsBuilder};
pub use dto::{ChatMessage, ChatRequest, ChatRequestBuilder, ChatResponse, ChatChoice, ResponseFormat};
pub use extraction::{extract_json, parse_mapping};
