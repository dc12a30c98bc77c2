//! LLM collaborator implementations for the generation core.
//!
//! `OpenAiCompatibleClient` talks to any chat-completions endpoint
//! (OpenAI, OpenRouter, Groq, local gateways). `ScriptedClient` replays
//! queued responses for deterministic tests. Neither retries internally;
//! the core owns all retry policy.

pub mod openai_compatible;
pub mod scripted;

pub use openai_compatible::OpenAiCompatibleClient;
pub use scripted::ScriptedClient;
