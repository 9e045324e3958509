//! Provider layer for Sidechat: registry, wire clients, dispatch, speech.
//!
//! # Architecture
//!
//! - [`registry`]: static specs for every vendor and its models
//! - [`traits::ChatProvider`]: one implementation per wire format
//!   ([`openai`], [`anthropic`], [`gemini`])
//! - [`dispatcher::Dispatcher`]: validates, resolves credentials and models,
//!   and makes exactly one upstream call
//! - [`speech::SpeechClient`]: ElevenLabs voices and synthesis
//! - [`session::ChatSession`]: per-session context with project selection
//!   and single-request-in-flight enforcement

pub mod anthropic;
pub mod dispatcher;
pub mod gemini;
pub mod http;
pub mod openai;
pub mod registry;
pub mod session;
pub mod speech;
pub mod traits;

pub use dispatcher::{Completion, DispatchOptions, Dispatcher};
pub use registry::{ModelSpec, ProviderSpec, WireFormat, PROVIDERS};
pub use session::ChatSession;
pub use speech::SpeechClient;
pub use traits::{ChatProvider, QueryRequest};
