use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{AnchorError, Result};

/// Top-level configuration for Anchor.
///
/// Loaded from `~/.anchor/config.toml` by default. Each section maps to one
/// collaborator of the chat pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnchorConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub chat: ChatConfig,
}

impl AnchorConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: AnchorConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, using defaults when the file
    /// does not exist.
    ///
    /// A file that exists but cannot be read or parsed is still an error;
    /// the caller decides whether to fall back.
    pub fn load_if_present(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.general.subject.trim().is_empty() {
            return Err(AnchorError::Config("general.subject must not be empty".into()));
        }
        if self.retrieval.base_url.trim().is_empty() {
            return Err(AnchorError::Config("retrieval.base_url must not be empty".into()));
        }
        if self.retrieval.n_results == 0 {
            return Err(AnchorError::Config("retrieval.n_results must be at least 1".into()));
        }
        if self.retrieval.timeout_secs == 0 {
            return Err(AnchorError::Config("retrieval.timeout_secs must be at least 1".into()));
        }
        if self.generation.endpoint.trim().is_empty() {
            return Err(AnchorError::Config("generation.endpoint must not be empty".into()));
        }
        if self.generation.max_tokens == 0 {
            return Err(AnchorError::Config("generation.max_tokens must be at least 1".into()));
        }
        if self.generation.timeout_secs == 0 {
            return Err(AnchorError::Config("generation.timeout_secs must be at least 1".into()));
        }
        if self.chat.max_message_length == 0 {
            return Err(AnchorError::Config("chat.max_message_length must be at least 1".into()));
        }
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// The single subject the knowledge base covers.
    pub subject: String,
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
    /// Address the HTTP surface binds to.
    pub bind: String,
    /// Port the HTTP surface listens on.
    pub port: u16,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            subject: "Kenny Robinson".to_string(),
            log_level: "info".to_string(),
            bind: "127.0.0.1".to_string(),
            port: 8042,
        }
    }
}

/// Retrieval service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Base URL of the retrieval service (`/query` and `/health` are appended).
    pub base_url: String,
    /// Number of passages requested per question.
    pub n_results: usize,
    /// Upper bound on a single retrieval call.
    pub timeout_secs: u64,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            n_results: 5,
            timeout_secs: 30,
        }
    }
}

/// Generation service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Chat-completion endpoint.
    pub endpoint: String,
    /// Model identifier sent with every request.
    pub model: String,
    /// Maximum output tokens.
    pub max_tokens: u32,
    /// Value of the `anthropic-version` header.
    pub api_version: String,
    /// Upper bound on a single generation call.
    pub timeout_secs: u64,
    /// API key. Usually supplied through `ANTHROPIC_API_KEY` instead.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Replaces the built-in grounding instruction. Read once at startup.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.anthropic.com/v1/messages".to_string(),
            model: "claude-sonnet-4-20250514".to_string(),
            max_tokens: 1024,
            api_version: "2023-06-01".to_string(),
            timeout_secs: 30,
            api_key: None,
            system_prompt: None,
        }
    }
}

/// Conversation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Maximum question length in characters, measured after trimming.
    pub max_message_length: usize,
    /// Questions offered to a user who does not know where to start.
    pub starter_questions: Vec<String>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            max_message_length: 2000,
            starter_questions: vec![
                "How did Kenny get started in comedy?".to_string(),
                "What is the Nubian Comedy Revue?".to_string(),
                "Who has Kenny Robinson worked with and mentored?".to_string(),
                "What awards has Kenny Robinson won?".to_string(),
                "What Kenny Robinson content should I watch first?".to_string(),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_config() {
        let config = AnchorConfig::default();
        assert_eq!(config.general.subject, "Kenny Robinson");
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.general.port, 8042);
        assert_eq!(config.retrieval.n_results, 5);
        assert_eq!(config.retrieval.timeout_secs, 30);
        assert_eq!(config.generation.model, "claude-sonnet-4-20250514");
        assert_eq!(config.generation.max_tokens, 1024);
        assert_eq!(config.generation.api_version, "2023-06-01");
        assert!(config.generation.api_key.is_none());
        assert!(config.generation.system_prompt.is_none());
        assert_eq!(config.chat.max_message_length, 2000);
        assert_eq!(config.chat.starter_questions.len(), 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_valid_config() {
        let content = r#"
[general]
subject = "Ada Lovelace"
log_level = "debug"
port = 9000

[retrieval]
base_url = "http://kb.internal:8000"
n_results = 8

[generation]
model = "claude-haiku"
max_tokens = 512
system_prompt = "Answer from context only."
"#;
        let file = create_temp_config(content);
        let config = AnchorConfig::load(file.path()).unwrap();
        assert_eq!(config.general.subject, "Ada Lovelace");
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.general.port, 9000);
        assert_eq!(config.retrieval.base_url, "http://kb.internal:8000");
        assert_eq!(config.retrieval.n_results, 8);
        assert_eq!(config.generation.model, "claude-haiku");
        assert_eq!(config.generation.max_tokens, 512);
        assert_eq!(
            config.generation.system_prompt.as_deref(),
            Some("Answer from context only.")
        );
    }

    #[test]
    fn test_load_partial_config_uses_defaults() {
        let content = r#"
[retrieval]
n_results = 3
"#;
        let file = create_temp_config(content);
        let config = AnchorConfig::load(file.path()).unwrap();
        assert_eq!(config.retrieval.n_results, 3);
        // Remaining fields use defaults
        assert_eq!(config.retrieval.timeout_secs, 30);
        assert_eq!(config.general.subject, "Kenny Robinson");
        assert_eq!(config.generation.max_tokens, 1024);
    }

    #[test]
    fn test_config_empty_toml_uses_all_defaults() {
        let file = create_temp_config("");
        let config = AnchorConfig::load(file.path()).unwrap();
        assert_eq!(config.general.port, 8042);
        assert_eq!(config.chat.max_message_length, 2000);
    }

    #[test]
    fn test_load_invalid_toml() {
        let file = create_temp_config("[general\nsubject = ");
        let result = AnchorConfig::load(file.path());
        assert!(matches!(result, Err(AnchorError::Config(_))));
    }

    #[test]
    fn test_load_if_present_missing_file_is_default() {
        let config = AnchorConfig::load_if_present(Path::new("/nonexistent/anchor.toml")).unwrap();
        assert_eq!(config.general.subject, "Kenny Robinson");
    }

    #[test]
    fn test_load_if_present_reports_malformed_file() {
        let file = create_temp_config("[retrieval\nbase_url = ");
        let result = AnchorConfig::load_if_present(file.path());
        assert!(matches!(result, Err(AnchorError::Config(_))));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = AnchorConfig::default();
        config.retrieval.n_results = 7;
        config.generation.api_key = Some("sk-test".to_string());
        config.save(&path).unwrap();

        let reloaded = AnchorConfig::load(&path).unwrap();
        assert_eq!(reloaded.retrieval.n_results, 7);
        assert_eq!(reloaded.generation.api_key.as_deref(), Some("sk-test"));
        assert!(reloaded.generation.system_prompt.is_none());
        assert_eq!(reloaded.chat.starter_questions, config.chat.starter_questions);
    }

    #[test]
    fn test_validate_rejects_zero_results() {
        let mut config = AnchorConfig::default();
        config.retrieval.n_results = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("n_results"));
    }

    #[test]
    fn test_validate_rejects_zero_timeouts() {
        let mut config = AnchorConfig::default();
        config.generation.timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = AnchorConfig::default();
        config.retrieval.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_blank_urls_and_subject() {
        let mut config = AnchorConfig::default();
        config.retrieval.base_url = "  ".to_string();
        assert!(config.validate().is_err());

        let mut config = AnchorConfig::default();
        config.generation.endpoint = String::new();
        assert!(config.validate().is_err());

        let mut config = AnchorConfig::default();
        config.general.subject = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_max_tokens_and_length() {
        let mut config = AnchorConfig::default();
        config.generation.max_tokens = 0;
        assert!(config.validate().is_err());

        let mut config = AnchorConfig::default();
        config.chat.max_message_length = 0;
        assert!(config.validate().is_err());
    }
}
