//! Configuration loading, validation, and management for Steward.
//!
//! Loads configuration from `~/.steward/config.toml`, then a `.env` file in
//! the working directory (or any parent), then environment variable
//! overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.steward/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key (can be overridden per-provider)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Default backend platform
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Default model
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Max tokens per model response
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Turn loop settings
    #[serde(default)]
    pub agent: AgentConfig,

    /// Workspace and tool limits
    #[serde(default)]
    pub workspace: WorkspaceConfig,

    /// HTTP transport settings
    #[serde(default)]
    pub transport: TransportConfig,

    /// Prompt identity settings
    #[serde(default)]
    pub identity: IdentityConfig,

    /// Provider-specific configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

fn default_provider() -> String {
    "siliconflow".into()
}
fn default_model() -> String {
    "moonshotai/Kimi-K2-Instruct-0905".into()
}
fn default_temperature() -> f32 {
    1.0
}
fn default_max_tokens() -> u32 {
    4000
}
fn default_true() -> bool {
    true
}

fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("default_provider", &self.default_provider)
            .field("default_model", &self.default_model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("agent", &self.agent)
            .field("workspace", &self.workspace)
            .field("transport", &self.transport)
            .field("identity", &self.identity)
            .field("providers", &self.providers)
            .finish()
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("default_model", &self.default_model)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Request incremental (SSE) responses instead of batch ones
    #[serde(default = "default_true")]
    pub stream: bool,

    /// Maximum backend calls per turn (0 = unlimited)
    #[serde(default = "default_max_rounds")]
    pub max_rounds: u32,

    /// Remind the model to update its todos after this many turns
    /// without `run_todo` (0 = never)
    #[serde(default = "default_todo_reminder_after")]
    pub todo_reminder_after: u32,
}

fn default_max_rounds() -> u32 {
    25
}
fn default_todo_reminder_after() -> u32 {
    10
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            stream: true,
            max_rounds: default_max_rounds(),
            todo_reminder_after: default_todo_reminder_after(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    /// Workspace root; defaults to the current directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,

    /// Substrings that get a shell command rejected outright
    #[serde(default = "default_blocked_commands")]
    pub blocked_commands: Vec<String>,

    /// If non-empty, only these base commands may run
    #[serde(default)]
    pub allowed_commands: Vec<String>,

    /// Shell command timeout
    #[serde(default = "default_command_timeout_secs")]
    pub command_timeout_secs: u64,

    /// Tool output truncation limit, in characters
    #[serde(default = "default_max_output_chars")]
    pub max_output_chars: usize,
}

fn default_blocked_commands() -> Vec<String> {
    vec![
        "rm -rf /".into(),
        "sudo".into(),
        "shutdown".into(),
        "reboot".into(),
        "> /dev/".into(),
    ]
}
fn default_command_timeout_secs() -> u64 {
    60
}
fn default_max_output_chars() -> usize {
    50_000
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            root: None,
            blocked_commands: default_blocked_commands(),
            allowed_commands: Vec::new(),
            command_timeout_secs: default_command_timeout_secs(),
            max_output_chars: default_max_output_chars(),
        }
    }
}

impl WorkspaceConfig {
    /// The configured root, or the current directory.
    pub fn resolved_root(&self) -> PathBuf {
        match &self.root {
            Some(root) => root.clone(),
            None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Attempts per request, including the first
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Fixed delay between attempts
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// HTTP request timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_max_retries() -> u32 {
    3
}
fn default_retry_delay_ms() -> u64 {
    1000
}
fn default_timeout_secs() -> u64 {
    120
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// Language the agent should answer in, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_language: Option<String>,

    /// Replace the built-in system prompt entirely
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt_override: Option<String>,
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
}

/// Environment variable holding the key for a built-in platform.
pub fn platform_key_var(platform: &str) -> Option<&'static str> {
    match platform {
        "openai" => Some("OPENAI_API_KEY"),
        "siliconflow" => Some("SILICONFLOW_API_KEY"),
        "deepseek" => Some("DEEPSEEK_API_KEY"),
        _ => None,
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.steward/config.toml).
    ///
    /// Also reads a `.env` file if present, then checks environment
    /// variables:
    /// - `STEWARD_API_KEY` (highest priority)
    /// - the platform key (`SILICONFLOW_API_KEY`, `DEEPSEEK_API_KEY`,
    ///   `OPENAI_API_KEY`)
    /// - `STEWARD_PROVIDER`, `STEWARD_MODEL`
    pub fn load() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!("Loaded environment from {}", path.display());
        }

        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides through a lookup function.
    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(provider) = lookup("STEWARD_PROVIDER") {
            self.default_provider = provider;
        }

        if let Some(model) = lookup("STEWARD_MODEL") {
            self.default_model = model;
        }

        if self.api_key.is_none() {
            self.api_key = lookup("STEWARD_API_KEY").or_else(|| {
                platform_key_var(&self.default_provider).and_then(|var| lookup(var))
            });
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".steward")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::ValidationError(
                "temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.workspace.max_output_chars == 0 {
            return Err(ConfigError::ValidationError(
                "workspace.max_output_chars must be > 0".into(),
            ));
        }

        if self.transport.max_retries == 0 {
            return Err(ConfigError::ValidationError(
                "transport.max_retries must be at least 1".into(),
            ));
        }

        Ok(())
    }

    /// Check if an API key is available for the default provider.
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
            || self
                .providers
                .get(&self.default_provider)
                .is_some_and(|p| p.api_key.is_some())
            || self.default_provider == "local"
    }

    /// Render the configuration as TOML, with secrets removed.
    pub fn to_redacted_toml(&self) -> String {
        let mut copy = self.clone();
        copy.api_key = copy.api_key.map(|_| "[REDACTED]".into());
        for provider in copy.providers.values_mut() {
            provider.api_key = provider.api_key.take().map(|_| "[REDACTED]".into());
        }
        toml::to_string_pretty(&copy).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_provider: default_provider(),
            default_model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            agent: AgentConfig::default(),
            workspace: WorkspaceConfig::default(),
            transport: TransportConfig::default(),
            identity: IdentityConfig::default(),
            providers: HashMap::new(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert_eq!(config.default_provider, "siliconflow");
        assert_eq!(config.max_tokens, 4000);
        assert!(config.agent.stream);
        assert_eq!(config.workspace.max_output_chars, 50_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.default_provider, config.default_provider);
        assert_eq!(parsed.agent.max_rounds, config.agent.max_rounds);
        assert_eq!(parsed.workspace.blocked_commands, config.workspace.blocked_commands);
    }

    #[test]
    fn invalid_temperature_rejected() {
        let config = AppConfig {
            temperature: 5.0,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_retries_rejected() {
        let mut config = AppConfig::default();
        config.transport.max_retries = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let config = AppConfig::load_from(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.default_provider, "siliconflow");
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
default_provider = "deepseek"
default_model = "deepseek-chat"

[agent]
stream = false

[providers.deepseek]
api_key = "sk-test"
"#,
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.default_provider, "deepseek");
        assert!(!config.agent.stream);
        assert_eq!(config.agent.max_rounds, 25);
        assert_eq!(config.workspace.command_timeout_secs, 60);
        assert!(config.has_api_key());
    }

    #[test]
    fn malformed_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "temperature = [").unwrap();
        let err = AppConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn generic_key_wins_over_platform_key() {
        let mut config = AppConfig::default();
        config.apply_env(env(&[
            ("STEWARD_API_KEY", "generic"),
            ("SILICONFLOW_API_KEY", "platform"),
        ]));
        assert_eq!(config.api_key.as_deref(), Some("generic"));
    }

    #[test]
    fn platform_key_follows_provider_override() {
        let mut config = AppConfig::default();
        config.apply_env(env(&[
            ("STEWARD_PROVIDER", "deepseek"),
            ("STEWARD_MODEL", "deepseek-chat"),
            ("SILICONFLOW_API_KEY", "wrong"),
            ("DEEPSEEK_API_KEY", "right"),
        ]));
        assert_eq!(config.default_provider, "deepseek");
        assert_eq!(config.default_model, "deepseek-chat");
        assert_eq!(config.api_key.as_deref(), Some("right"));
    }

    #[test]
    fn local_platform_needs_no_key() {
        let config = AppConfig {
            default_provider: "local".into(),
            ..AppConfig::default()
        };
        assert!(config.has_api_key());
    }

    #[test]
    fn debug_and_toml_output_redact_keys() {
        let mut config = AppConfig {
            api_key: Some("sk-secret".into()),
            ..AppConfig::default()
        };
        config.providers.insert(
            "openai".into(),
            ProviderConfig {
                api_key: Some("sk-other".into()),
                ..ProviderConfig::default()
            },
        );
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(!debug.contains("sk-other"));
        let rendered = config.to_redacted_toml();
        assert!(!rendered.contains("sk-secret"));
        assert!(!rendered.contains("sk-other"));
        assert!(rendered.contains("[REDACTED]"));
    }
}
