use std::time::Duration;

/// Editor session configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Rows per page when no stored preference applies
    pub page_size: usize,

    /// Deadline for each backend call; `None` waits forever
    pub request_timeout: Option<Duration>,

    /// Validate every row with a pending edit before staging, visible or
    /// not, and refuse to stage when it reports errors
    pub validate_before_stage: bool,

    /// Restore and remember page size / sort per dataset
    pub persist_preferences: bool,
}

impl SessionConfig {
    pub fn new() -> Self {
        Self {
            page_size: 50,
            request_timeout: Some(Duration::from_secs(30)),
            validate_before_stage: false,
            persist_preferences: true,
        }
    }

    /// Set the default page size
    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Set the per-request timeout
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Disable the per-request timeout
    pub fn no_timeout(mut self) -> Self {
        self.request_timeout = None;
        self
    }

    pub fn validate_before_stage(mut self, enabled: bool) -> Self {
        self.validate_before_stage = enabled;
        self
    }

    pub fn persist_preferences(mut self, enabled: bool) -> Self {
        self.persist_preferences = enabled;
        self
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.page_size, 50);
        assert_eq!(config.request_timeout, Some(Duration::from_secs(30)));
        assert!(!config.validate_before_stage);
    }

    #[test]
    fn test_builder() {
        let config = SessionConfig::new()
            .page_size(10)
            .no_timeout()
            .validate_before_stage(true)
            .persist_preferences(false);

        assert_eq!(config.page_size, 10);
        assert!(config.request_timeout.is_none());
        assert!(config.validate_before_stage);
        assert!(!config.persist_preferences);
    }
}
