use agent_api::AgentApiError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentDeckError {
    #[error(transparent)]
    Api(#[from] AgentApiError),

    #[error("unexpected {resource} payload: {source}")]
    Payload {
        resource: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("message is empty")]
    EmptyInput,
}

impl AgentDeckError {
    #[must_use]
    pub fn payload(resource: &'static str, source: serde_json::Error) -> Self {
        Self::Payload { resource, source }
    }

    /// The transport-level error, when the failure came from the backend exchange.
    pub fn api(&self) -> Option<&AgentApiError> {
        match self {
            Self::Api(error) => Some(error),
            Self::Payload { .. } | Self::EmptyInput => None,
        }
    }
}
