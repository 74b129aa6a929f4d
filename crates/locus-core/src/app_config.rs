use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub discovery_url: String,
    pub log_level: String,
    pub profile_id: Option<String>,
    pub user_agent: String,
    pub connect_timeout_secs: u64,
    /// Idle timeout applied to each body read. `None` waits indefinitely.
    pub read_timeout: Option<Duration>,
    /// Age after which cached search results are ignored. `None` keeps them
    /// for the lifetime of the process.
    pub cache_ttl: Option<Duration>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("discovery_url", &self.discovery_url)
            .field("log_level", &self.log_level)
            .field(
                "profile_id",
                &self.profile_id.as_ref().map(|_| "[redacted]"),
            )
            .field("user_agent", &self.user_agent)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("read_timeout", &self.read_timeout)
            .field("cache_ttl", &self.cache_ttl)
            .finish()
    }
}
