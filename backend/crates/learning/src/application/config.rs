//! Application Configuration
//!
//! Configuration for the learning application layer.

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct LearningConfig {
    /// Session token lifetime (1 hour)
    pub token_ttl: Duration,
    /// Random bytes per session token before hex encoding
    pub token_bytes_len: usize,
    /// Password pepper (optional, application-wide secret)
    pub password_pepper: Option<Vec<u8>>,
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self {
            token_ttl: Duration::from_secs(3600),
            token_bytes_len: 16,
            password_pepper: None,
        }
    }
}

impl LearningConfig {
    pub fn with_pepper(pepper: impl Into<Vec<u8>>) -> Self {
        Self {
            password_pepper: Some(pepper.into()),
            ..Default::default()
        }
    }

    /// Get password pepper as slice
    pub fn pepper(&self) -> Option<&[u8]> {
        self.password_pepper.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LearningConfig::default();
        assert_eq!(config.token_ttl, Duration::from_secs(3600));
        assert_eq!(config.token_bytes_len, 16);
        assert!(config.pepper().is_none());
    }

    #[test]
    fn test_with_pepper() {
        let config = LearningConfig::with_pepper("spice");
        assert_eq!(config.pepper(), Some(b"spice".as_slice()));
        assert_eq!(config.token_bytes_len, 16);
    }
}
