use std::collections::BTreeMap;

use crate::config::AgentApiConfig;

pub const HEADER_ACCEPT: &str = "accept";
pub const HEADER_CONTENT_TYPE: &str = "content-type";
pub const HEADER_USER_AGENT: &str = "user-agent";

pub const CONTENT_TYPE_JSON: &str = "application/json";
pub const CONTENT_TYPE_EVENT_STREAM: &str = "text/event-stream";

/// What the caller expects back from a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    Json,
    EventStream,
}

impl ResponseKind {
    pub fn accept(self) -> &'static str {
        match self {
            Self::Json => CONTENT_TYPE_JSON,
            Self::EventStream => CONTENT_TYPE_EVENT_STREAM,
        }
    }
}

/// Build a deterministic header map for backend requests.
///
/// Extra headers from the config are applied last and may override the defaults.
pub fn build_headers(config: &AgentApiConfig, kind: ResponseKind) -> BTreeMap<String, String> {
    let mut headers = BTreeMap::new();

    headers.insert(HEADER_ACCEPT.to_owned(), kind.accept().to_owned());
    headers.insert(HEADER_CONTENT_TYPE.to_owned(), CONTENT_TYPE_JSON.to_owned());

    let ua = config
        .user_agent
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToOwned::to_owned)
        .unwrap_or_else(default_user_agent);
    headers.insert(HEADER_USER_AGENT.to_owned(), ua);

    for (key, value) in &config.extra_headers {
        headers.insert(key.trim().to_ascii_lowercase(), value.trim().to_owned());
    }

    headers
}

fn default_user_agent() -> String {
    format!("agent_api/{}", env!("CARGO_PKG_VERSION"))
}
