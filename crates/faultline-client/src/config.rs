//! Configuration for the capture client.

/// Configuration for one [`crate::FaultlineClient`] instance.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the collection service.
    pub base_url: String,

    /// Request timeout for deliveries, in seconds.
    pub timeout_secs: u64,

    /// Location label attached to reports that don't supply their own.
    pub page_url: String,

    /// User agent sent with every report.
    pub user_agent: String,

    /// Session identifier to use instead of generating one.
    ///
    /// Generated identifiers are unique within practical bounds only; supply
    /// an identifier here when stronger guarantees are needed.
    pub session_id: Option<String>,
}

fn default_user_agent() -> String {
    format!("faultline-client/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8085".to_owned(),
            timeout_secs: 10,
            page_url: "unknown".to_owned(),
            user_agent: default_user_agent(),
            session_id: None,
        }
    }
}

impl ClientConfig {
    /// Configuration pointing at the given collection service.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Set the delivery timeout.
    #[must_use]
    pub const fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Set the default location label.
    #[must_use]
    pub fn with_page_url(mut self, page_url: impl Into<String>) -> Self {
        self.page_url = page_url.into();
        self
    }

    /// Set the reported user agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Supply a session identifier instead of generating one.
    #[must_use]
    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sensible() {
        let config = ClientConfig::default();
        assert_eq!(config.timeout_secs, 10);
        assert!(config.user_agent.starts_with("faultline-client/"));
        assert!(config.session_id.is_none());
    }

    #[test]
    fn builder_overrides() {
        let config = ClientConfig::new("http://collector:9000/")
            .with_timeout_secs(3)
            .with_page_url("app://checkout")
            .with_session_id("s-fixed");
        assert_eq!(config.base_url, "http://collector:9000/");
        assert_eq!(config.timeout_secs, 3);
        assert_eq!(config.page_url, "app://checkout");
        assert_eq!(config.session_id.as_deref(), Some("s-fixed"));
    }
}
