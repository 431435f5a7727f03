//! Transport-only client primitives for the agent execution backend.
//!
//! This crate owns request building, key-convention translation, and decoding of the
//! framed streaming response. It contains no auth code, no retry policy and no
//! rendering.
//!
//! Structured bodies travel in snake_case on the wire and camelCase inside the
//! application; [`normalize`] is applied at both boundaries by [`AgentApiClient`].
//! Streaming responses are decoded lazily by [`TokenStream`], which yields one token per
//! `data: ` frame until `[DONE]` or `[ERROR] <message>` arrives.

pub mod casing;
pub mod client;
pub mod config;
pub mod error;
pub mod headers;
pub mod sse;
pub mod stream;
pub mod url;

pub use casing::{normalize, NamingConvention, StructuredValue};
pub use client::AgentApiClient;
pub use config::AgentApiConfig;
pub use error::AgentApiError;
pub use sse::{DecodeOutcome, DecoderState, FrameDecoder, StreamSignal};
pub use stream::{ByteStream, TokenStream};
pub use url::join_endpoint;

pub use reqwest::{Method, StatusCode};
