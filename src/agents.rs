//! Typed access to the agent resources of the backend.
//!
//! Every call goes through [`AgentApiClient`], so request bodies leave in wire convention
//! and responses come back in caller convention before being deserialized.

use agent_api::{AgentApiClient, ByteStream, Method, TokenStream};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::error::AgentDeckError;
use crate::model::{
    Agent, AgentCreate, AgentExecuteInput, AgentExecuteOutput, AgentUpdate, Execution, Page,
};

const AGENTS_PATH: &str = "/api/v1/agents";

#[derive(Debug)]
pub struct AgentsApi {
    client: AgentApiClient,
}

impl AgentsApi {
    pub fn new(client: AgentApiClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &AgentApiClient {
        &self.client
    }

    pub async fn list(&self, page: Page) -> Result<Vec<Agent>, AgentDeckError> {
        let value = self
            .client
            .request(Method::GET, &format!("{AGENTS_PATH}?{}", page.query()), None)
            .await?;
        decode("agent list", value)
    }

    pub async fn get(&self, id: &str) -> Result<Agent, AgentDeckError> {
        let value = self
            .client
            .request(Method::GET, &agent_path(id), None)
            .await?;
        decode("agent", value)
    }

    pub async fn create(&self, data: &AgentCreate) -> Result<Agent, AgentDeckError> {
        let body = encode("agent create", data)?;
        let value = self
            .client
            .request(Method::POST, AGENTS_PATH, Some(&body))
            .await?;
        decode("agent", value)
    }

    pub async fn update(&self, id: &str, data: &AgentUpdate) -> Result<Agent, AgentDeckError> {
        let body = encode("agent update", data)?;
        let value = self
            .client
            .request(Method::PATCH, &agent_path(id), Some(&body))
            .await?;
        decode("agent", value)
    }

    pub async fn delete(&self, id: &str) -> Result<(), AgentDeckError> {
        self.client
            .request(Method::DELETE, &agent_path(id), None)
            .await?;
        debug!(agent_id = id, "agent deleted");
        Ok(())
    }

    /// Run an agent and wait for the whole result.
    pub async fn execute(
        &self,
        id: &str,
        input: &AgentExecuteInput,
    ) -> Result<AgentExecuteOutput, AgentDeckError> {
        let body = encode("execute input", input)?;
        let value = self
            .client
            .request(
                Method::POST,
                &format!("{}/execute", agent_path(id)),
                Some(&body),
            )
            .await?;
        decode("execute output", value)
    }

    /// Run an agent and receive its output token by token.
    pub async fn execute_stream(
        &self,
        id: &str,
        input: &AgentExecuteInput,
    ) -> Result<TokenStream<ByteStream>, AgentDeckError> {
        let body = encode("execute input", input)?;
        let tokens = self
            .client
            .stream(&format!("{}/execute/stream", agent_path(id)), &body)
            .await?;
        Ok(tokens)
    }

    pub async fn executions(
        &self,
        id: &str,
        page: Page,
    ) -> Result<Vec<Execution>, AgentDeckError> {
        let value = self
            .client
            .request(
                Method::GET,
                &format!("{}/executions?{}", agent_path(id), page.query()),
                None,
            )
            .await?;
        decode("execution list", value)
    }
}

/// Path of one agent. The id is percent-encoded so it always stays a single segment.
fn agent_path(id: &str) -> String {
    format!("{AGENTS_PATH}/{}", urlencoding::encode(id))
}

fn encode<T: Serialize>(resource: &'static str, data: &T) -> Result<Value, AgentDeckError> {
    serde_json::to_value(data).map_err(|source| AgentDeckError::payload(resource, source))
}

fn decode<T: DeserializeOwned>(resource: &'static str, value: Value) -> Result<T, AgentDeckError> {
    serde_json::from_value(value).map_err(|source| AgentDeckError::payload(resource, source))
}

#[cfg(test)]
mod tests {
    use super::agent_path;

    #[test]
    fn agent_path_keeps_id_in_one_segment() {
        assert_eq!(agent_path("3f1c"), "/api/v1/agents/3f1c");
        assert_eq!(agent_path("a/b?c#d"), "/api/v1/agents/a%2Fb%3Fc%23d");
        assert_eq!(agent_path("../x"), "/api/v1/agents/..%2Fx");
    }
}
