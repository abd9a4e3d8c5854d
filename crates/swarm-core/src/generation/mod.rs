//! Generation client for an external chat-completion service.
//!
//! Agents only see the [`Generator`] trait: "is a credential configured" and
//! "give me a JSON object for these messages". Every failure mode collapses
//! into a [`GenerationError`] that agents treat as "unavailable this call".

pub mod client;
pub mod config;

pub use client::{
    ChatMessage, CompletionRequest, GenerationError, Generator, HttpGenerator, JsonSchema, Role,
};
pub use config::{AzureSettings, GenerationConfig, Provider};
