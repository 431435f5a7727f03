//! In-memory conversation with an agent, one streamed turn at a time.
//!
//! A turn appends the user message and an empty assistant message, then grows the
//! assistant message token by token. If the token sequence fails, the assistant message
//! is removed again so no half-written reply is ever kept. The user message stays.

use std::io::{self, Write};

use agent_api::AgentApiError;
use futures_util::{Stream, StreamExt};
use tracing::{debug, warn};

use crate::agents::AgentsApi;
use crate::error::AgentDeckError;
use crate::model::AgentExecuteInput;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Conversation {
    agent_id: String,
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new(agent_id: impl Into<String>) -> Self {
        Self {
            agent_id: agent_id.into(),
            messages: Vec::new(),
        }
    }

    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Send `user_input` to the agent and stream the reply into the conversation.
    ///
    /// `on_token` sees every token as it arrives. On failure the partial reply is rolled
    /// back before the error is returned.
    pub async fn send<F>(
        &mut self,
        api: &AgentsApi,
        user_input: &str,
        on_token: F,
    ) -> Result<&Message, AgentDeckError>
    where
        F: FnMut(&str),
    {
        let user_input = self.begin_turn(user_input)?;
        let input = AgentExecuteInput::new(user_input);
        let tokens = match api.execute_stream(&self.agent_id, &input).await {
            Ok(tokens) => tokens,
            Err(error) => {
                self.rollback_turn();
                return Err(error);
            }
        };
        self.consume_turn(tokens, on_token).await
    }

    /// Run one turn over an already-open token sequence.
    pub async fn run_turn<S, F>(
        &mut self,
        user_input: &str,
        tokens: S,
        on_token: F,
    ) -> Result<&Message, AgentDeckError>
    where
        S: Stream<Item = Result<String, AgentApiError>> + Unpin,
        F: FnMut(&str),
    {
        self.begin_turn(user_input)?;
        self.consume_turn(tokens, on_token).await
    }

    fn begin_turn(&mut self, user_input: &str) -> Result<String, AgentDeckError> {
        let user_input = user_input.trim();
        if user_input.is_empty() {
            return Err(AgentDeckError::EmptyInput);
        }
        self.messages.push(Message::user(user_input));
        self.messages.push(Message::assistant(String::new()));
        Ok(user_input.to_owned())
    }

    async fn consume_turn<S, F>(
        &mut self,
        mut tokens: S,
        mut on_token: F,
    ) -> Result<&Message, AgentDeckError>
    where
        S: Stream<Item = Result<String, AgentApiError>> + Unpin,
        F: FnMut(&str),
    {
        while let Some(token) = tokens.next().await {
            match token {
                Ok(token) => {
                    on_token(&token);
                    if let Some(reply) = self.messages.last_mut() {
                        reply.content.push_str(&token);
                    }
                }
                Err(error) => {
                    warn!(%error, "turn failed; rolling back partial reply");
                    self.rollback_turn();
                    return Err(error.into());
                }
            }
        }

        let reply = self
            .messages
            .last()
            .ok_or_else(|| AgentApiError::decode("conversation lost its reply"))?;
        debug!(agent_id = %self.agent_id, reply_len = reply.content.len(), "turn completed");
        Ok(reply)
    }

    fn rollback_turn(&mut self) {
        if self
            .messages
            .last()
            .is_some_and(|message| message.role == Role::Assistant)
        {
            self.messages.pop();
        }
    }
}

/// Writes streamed tokens to `out` as they arrive.
///
/// The first write failure is kept and later tokens are skipped; [`ReplyWriter::finish`]
/// reports it.
#[derive(Debug)]
pub struct ReplyWriter<W> {
    out: W,
    error: Option<io::Error>,
}

impl<W: Write> ReplyWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out, error: None }
    }

    pub fn write_token(&mut self, token: &str) {
        if self.error.is_some() {
            return;
        }
        if let Err(error) = self
            .out
            .write_all(token.as_bytes())
            .and_then(|()| self.out.flush())
        {
            warn!(%error, "reply output failed; dropping remaining tokens");
            self.error = Some(error);
        }
    }

    pub fn finish(self) -> io::Result<W> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.out),
        }
    }
}
