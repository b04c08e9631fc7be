//! Configuration types for the form core

use serde::{Deserialize, Serialize};

/// Attachment rule set used to build a policy
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AttachmentSettings {
    /// Allowed file extensions (lower-cased, without the dot)
    pub allowed_extensions: Vec<String>,
    /// Denied file extensions; checked before the allow list
    pub denied_extensions: Vec<String>,
    /// Maximum number of attachments per form
    pub max_count: usize,
    /// Minimum number of attachments required to submit (0 or 1)
    pub required_minimum: usize,
}

impl Default for AttachmentSettings {
    fn default() -> Self {
        Self {
            allowed_extensions: ["jpg", "jpeg", "png", "doc", "docx", "ppt", "pptx", "pdf"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            denied_extensions: vec!["exe".to_string(), "zip".to_string()],
            max_count: 3,
            required_minimum: 1,
        }
    }
}

/// Configuration for the minutes form core
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FormsConfig {
    /// Attachment admission rules
    pub attachments: AttachmentSettings,
    /// Per-file upload timeout in seconds
    pub upload_timeout_seconds: u64,
    /// Cap on simultaneous uploads (None = unbounded)
    pub max_concurrent_uploads: Option<usize>,
    /// Maximum title length in characters
    pub title_max_length: usize,
}

impl Default for FormsConfig {
    fn default() -> Self {
        Self {
            attachments: AttachmentSettings::default(),
            upload_timeout_seconds: 30,
            max_concurrent_uploads: None,
            title_max_length: 100,
        }
    }
}

impl FormsConfig {
    /// Load configuration, applying environment variable overrides
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(v) = std::env::var("MINUTES_UPLOAD_TIMEOUT_SECONDS") {
            if let Ok(secs) = v.parse() {
                config.upload_timeout_seconds = secs;
            }
        }
        if let Ok(v) = std::env::var("MINUTES_MAX_CONCURRENT_UPLOADS") {
            config.max_concurrent_uploads = v.parse().ok();
        }
        if let Ok(v) = std::env::var("MINUTES_MAX_ATTACHMENTS") {
            if let Ok(count) = v.parse::<usize>() {
                if count >= 1 {
                    config.attachments.max_count = count;
                }
            }
        }
        if let Ok(v) = std::env::var("MINUTES_TITLE_MAX_LENGTH") {
            if let Ok(len) = v.parse() {
                config.title_max_length = len;
            }
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = FormsConfig::default();
        assert_eq!(config.attachments.max_count, 3);
        assert_eq!(config.attachments.required_minimum, 1);
        assert_eq!(config.upload_timeout_seconds, 30);
        assert_eq!(config.title_max_length, 100);
        assert!(config.max_concurrent_uploads.is_none());
    }

    #[test]
    fn test_default_extension_lists() {
        let settings = AttachmentSettings::default();
        assert!(settings.allowed_extensions.contains(&"pdf".to_string()));
        assert!(settings.denied_extensions.contains(&"exe".to_string()));
        assert!(!settings.allowed_extensions.contains(&"zip".to_string()));
    }
}
