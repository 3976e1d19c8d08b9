//! Provider router: selects the LLM backend named by the configuration.
//!
//! Built-in platform presets cover `openai`, `siliconflow`, `deepseek` and
//! `local` (LM Studio). Any `[providers.<name>]` table with an `api_url`
//! adds another OpenAI-compatible backend.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use steward_config::AppConfig;
use steward_core::provider::Provider;
use tracing::warn;

use crate::openai_compat::{OpenAiCompatProvider, RetryPolicy};

/// Base URL and default model for a built-in platform.
pub struct Platform {
    pub base_url: &'static str,
    pub default_model: &'static str,
}

pub fn platform_preset(name: &str) -> Option<Platform> {
    let (base_url, default_model) = match name {
        "openai" => ("https://api.openai.com/v1", "gpt-4o"),
        "siliconflow" => (
            "https://api.siliconflow.cn/v1",
            "moonshotai/Kimi-K2-Instruct-0905",
        ),
        "deepseek" => ("https://api.deepseek.com", "deepseek-chat"),
        "local" => ("http://127.0.0.1:1234/v1", "local-model"),
        _ => return None,
    };
    Some(Platform {
        base_url,
        default_model,
    })
}

/// Routes LLM requests to the correct provider.
pub struct ProviderRouter {
    providers: HashMap<String, Arc<dyn Provider>>,
    default_provider: String,
}

impl ProviderRouter {
    /// Create a new router with a default provider.
    pub fn new(default_provider: impl Into<String>) -> Self {
        Self {
            providers: HashMap::new(),
            default_provider: default_provider.into(),
        }
    }

    /// Register a provider.
    pub fn register(&mut self, name: impl Into<String>, provider: Arc<dyn Provider>) {
        self.providers.insert(name.into(), provider);
    }

    /// Get the default provider.
    pub fn default(&self) -> Option<Arc<dyn Provider>> {
        self.providers.get(&self.default_provider).cloned()
    }

    pub fn default_name(&self) -> &str {
        &self.default_provider
    }

    /// Get a specific provider by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Provider>> {
        self.providers.get(name).cloned()
    }

    /// List all registered provider names, sorted.
    pub fn list(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.providers.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }
}

/// Build providers from configuration.
pub fn build_from_config(config: &AppConfig) -> ProviderRouter {
    let mut router = ProviderRouter::new(&config.default_provider);
    let retry = RetryPolicy {
        max_attempts: config.transport.max_retries,
        delay: Duration::from_millis(config.transport.retry_delay_ms),
    };
    let timeout = Duration::from_secs(config.transport.timeout_secs);

    let mut names: Vec<&str> = config.providers.keys().map(|s| s.as_str()).collect();
    if !config.providers.contains_key(&config.default_provider) {
        names.push(&config.default_provider);
    }

    for name in names {
        let provider_config = config.providers.get(name);

        let Some(base_url) = provider_config
            .and_then(|p| p.api_url.clone())
            .or_else(|| platform_preset(name).map(|p| p.base_url.to_string()))
        else {
            warn!(provider = %name, "Unknown provider without api_url, skipping");
            continue;
        };

        let api_key = provider_config
            .and_then(|p| p.api_key.clone())
            .or_else(|| config.api_key.clone())
            .unwrap_or_else(|| {
                if name == "local" {
                    "lm-studio".into()
                } else {
                    String::new()
                }
            });

        let provider = OpenAiCompatProvider::new(name, base_url, api_key)
            .with_retry(retry)
            .with_timeout(timeout);
        router.register(name, Arc::new(provider));
    }

    router
}

/// The model to request from the default provider.
///
/// A per-provider `default_model` wins over the global one.
pub fn resolve_model(config: &AppConfig) -> String {
    config
        .providers
        .get(&config.default_provider)
        .and_then(|p| p.default_model.clone())
        .unwrap_or_else(|| config.default_model.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use steward_config::ProviderConfig;

    #[test]
    fn router_register_and_lookup() {
        let mut router = ProviderRouter::new("deepseek");
        router.register("deepseek", Arc::new(OpenAiCompatProvider::deepseek("sk-test")));

        assert!(router.get("deepseek").is_some());
        assert!(router.get("nonexistent").is_none());
        assert!(router.default().is_some());
        assert_eq!(router.default_name(), "deepseek");
    }

    #[test]
    fn platform_presets() {
        assert!(platform_preset("siliconflow").unwrap().base_url.contains("siliconflow.cn"));
        assert_eq!(platform_preset("deepseek").unwrap().default_model, "deepseek-chat");
        assert!(platform_preset("local").unwrap().base_url.contains("127.0.0.1:1234"));
        assert!(platform_preset("mystery").is_none());
    }

    #[test]
    fn build_from_default_config() {
        let config = AppConfig::default();
        let router = build_from_config(&config);
        let provider = router.default().unwrap();
        assert_eq!(provider.name(), "siliconflow");
    }

    #[test]
    fn custom_provider_needs_url() {
        let mut config = AppConfig::default();
        config.default_provider = "inhouse".into();
        assert!(build_from_config(&config).default().is_none());

        config.providers.insert(
            "inhouse".into(),
            ProviderConfig {
                api_url: Some("http://llm.internal/v1".into()),
                ..ProviderConfig::default()
            },
        );
        let router = build_from_config(&config);
        assert!(router.default().is_some());
        assert_eq!(router.list(), vec!["inhouse"]);
    }

    #[test]
    fn provider_model_overrides_global() {
        let mut config = AppConfig::default();
        assert_eq!(resolve_model(&config), "moonshotai/Kimi-K2-Instruct-0905");

        config.providers.insert(
            "siliconflow".into(),
            ProviderConfig {
                default_model: Some("Qwen/Qwen3-8B".into()),
                ..ProviderConfig::default()
            },
        );
        assert_eq!(resolve_model(&config), "Qwen/Qwen3-8B");
    }
}
