use std::time::Duration;

/// Defaults match the production gateway: five minutes of stream silence
/// before the watchdog fires, thirty seconds to establish the connection.
pub const DEFAULT_INACTIVITY_TIMEOUT: Duration = Duration::from_secs(300);
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_CHAT_PATH: &str = "/api/chat";

#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub base_url: String,
    pub chat_path: String,
    pub inactivity_timeout: Duration,
    pub connect_timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            chat_path: DEFAULT_CHAT_PATH.to_string(),
            inactivity_timeout: DEFAULT_INACTIVITY_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    pub fn with_chat_path(mut self, path: impl Into<String>) -> Self {
        self.chat_path = path.into();
        self
    }

    pub fn with_inactivity_timeout(mut self, timeout: Duration) -> Self {
        self.inactivity_timeout = timeout;
        self
    }

    pub fn chat_url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), self.chat_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_url_joins_without_doubled_slash() {
        let config = ClientConfig::new("http://localhost:8080/");
        assert_eq!(config.chat_url(), "http://localhost:8080/api/chat");

        let config = ClientConfig::new("http://localhost:8080");
        assert_eq!(config.chat_url(), "http://localhost:8080/api/chat");
    }
}
