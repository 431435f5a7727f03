//! Client for an agent-execution backend.
//!
//! - [`AgentsApi`] wraps the agent resource endpoints with typed models.
//! - [`Conversation`] runs streamed turns and rolls back a reply whose stream fails.
//! - [`Settings`] reads backend location and log filter from the environment.
//!
//! Transport, framing, and key-convention translation live in the `agent_api` crate and
//! are re-exported here as [`api`].

pub mod agents;
pub mod chat;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;

pub use agent_api as api;

pub use agents::AgentsApi;
pub use chat::{Conversation, Message, ReplyWriter, Role};
pub use config::Settings;
pub use error::AgentDeckError;
pub use model::{
    Agent, AgentCreate, AgentExecuteInput, AgentExecuteOutput, AgentUpdate, Execution, Page,
};
