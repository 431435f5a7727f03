//! Environment configuration.

use std::env;
use std::time::Duration;

use agent_api::url::DEFAULT_BASE_URL;
use agent_api::AgentApiConfig;

pub const ENV_API_URL: &str = "AGENTDECK_API_URL";
pub const ENV_TIMEOUT_SECS: &str = "AGENTDECK_TIMEOUT_SECS";
pub const ENV_LOG: &str = "AGENTDECK_LOG";

pub const DEFAULT_LOG_FILTER: &str = "warn";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_url: String,
    pub timeout: Option<Duration>,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_BASE_URL.to_string(),
            timeout: None,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_url: env_string_opt(ENV_API_URL).unwrap_or(defaults.api_url),
            timeout: env_string_opt(ENV_TIMEOUT_SECS)
                .and_then(|value| value.trim().parse::<u64>().ok())
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
            log_filter: env_string_opt(ENV_LOG).unwrap_or(defaults.log_filter),
        }
    }

    pub fn api_config(&self) -> AgentApiConfig {
        let config = AgentApiConfig::new(self.api_url.clone())
            .with_user_agent(concat!("agentdeck/", env!("CARGO_PKG_VERSION")));
        match self.timeout {
            Some(timeout) => config.with_timeout(timeout),
            None => config,
        }
    }
}

fn env_string_opt(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|value| {
        if value.trim().is_empty() {
            None
        } else {
            Some(value)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::{Settings, DEFAULT_LOG_FILTER, ENV_API_URL, ENV_LOG, ENV_TIMEOUT_SECS};
    use std::env;
    use std::sync::{Mutex, OnceLock};
    use std::time::Duration;

    struct EnvGuard {
        key: &'static str,
        previous: Option<String>,
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            if let Some(value) = &self.previous {
                env::set_var(self.key, value);
            } else {
                env::remove_var(self.key);
            }
        }
    }

    fn env_lock() -> std::sync::MutexGuard<'static, ()> {
        static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        LOCK.get_or_init(|| Mutex::new(()))
            .lock()
            .expect("env lock poisoned")
    }

    fn set_env_guard(key: &'static str, value: Option<&str>) -> EnvGuard {
        let previous = env::var(key).ok();
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
        EnvGuard { key, previous }
    }

    #[test]
    fn env_defaults_point_at_local_backend() {
        let _lock = env_lock();
        let _g1 = set_env_guard(ENV_API_URL, None);
        let _g2 = set_env_guard(ENV_TIMEOUT_SECS, None);
        let _g3 = set_env_guard(ENV_LOG, None);

        let settings = Settings::from_env();
        assert_eq!(settings.api_url, "http://localhost:8000");
        assert!(settings.timeout.is_none());
        assert_eq!(settings.log_filter, DEFAULT_LOG_FILTER);
    }

    #[test]
    fn env_values_override_defaults() {
        let _lock = env_lock();
        let _g1 = set_env_guard(ENV_API_URL, Some("https://agents.example.com"));
        let _g2 = set_env_guard(ENV_TIMEOUT_SECS, Some("30"));
        let _g3 = set_env_guard(ENV_LOG, Some("agent_api=debug"));

        let settings = Settings::from_env();
        assert_eq!(settings.api_url, "https://agents.example.com");
        assert_eq!(settings.timeout, Some(Duration::from_secs(30)));
        assert_eq!(settings.log_filter, "agent_api=debug");

        let config = settings.api_config();
        assert_eq!(config.base_url, "https://agents.example.com");
        assert_eq!(config.timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn blank_or_invalid_values_are_ignored() {
        let _lock = env_lock();
        let _g1 = set_env_guard(ENV_API_URL, Some("   "));
        let _g2 = set_env_guard(ENV_TIMEOUT_SECS, Some("soon"));
        let _g3 = set_env_guard(ENV_LOG, Some(""));

        let settings = Settings::from_env();
        assert_eq!(settings, Settings::default());
    }
}
