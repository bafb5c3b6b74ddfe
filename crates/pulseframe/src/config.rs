//! Backend and pipeline configuration with sensible defaults.
//!
//! [`PulseConfig`] captures everything one generation run needs: a
//! primary backend, an optional fallback backend, sample counts,
//! temperature, worker count, and per-call timeout. Backends resolve
//! from `LLM_PRIMARY_*` / `LLM_FALLBACK_*` environment variables with
//! provider-specific default base URLs.

use std::time::Duration;

/// One OpenAI-compatible chat-completions backend.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Provider identifier, e.g. `"lmstudio"` or `"openrouter"`.
    pub provider: String,
    /// Base URL up to (not including) `/chat/completions`.
    pub base_url: String,
    /// Model identifier sent with every request.
    pub model: String,
    /// Bearer token. Local providers run without one.
    pub api_key: Option<String>,
}

impl BackendConfig {
    /// Default base URL for a known provider, empty for unknown ones.
    pub fn default_base_url(provider: &str) -> &'static str {
        match provider {
            "lmstudio" => "http://localhost:1234/v1",
            "openrouter" => "https://openrouter.ai/api/v1",
            "pollinations" => "https://text.pollinations.ai/openai",
            _ => "",
        }
    }

    fn api_key_for(provider: &str) -> Option<String> {
        let var = match provider {
            "openrouter" => "OPENROUTER_API_KEY",
            "lmstudio" => "LMSTUDIO_API_KEY",
            _ => "LLM_API_KEY",
        };
        std::env::var(var).ok().filter(|k| !k.is_empty())
    }

    /// Primary backend from `LLM_PRIMARY_*` environment variables.
    /// Defaults to a local LM Studio endpoint.
    pub fn primary_from_env() -> Self {
        let provider = std::env::var("LLM_PRIMARY_PROVIDER")
            .unwrap_or_else(|_| "lmstudio".to_string())
            .to_lowercase();
        let base_url = std::env::var("LLM_PRIMARY_BASE_URL")
            .ok()
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| Self::default_base_url(&provider).to_string());
        let model = std::env::var("LLM_PRIMARY_MODEL")
            .unwrap_or_else(|_| "gpt-oss-20b-heretic".to_string());
        let api_key = Self::api_key_for(&provider);
        Self {
            provider,
            base_url,
            model,
            api_key,
        }
    }

    /// Fallback backend from `LLM_FALLBACK_*` environment variables.
    /// Defaults to OpenRouter; returns `None` when that would be
    /// unusable (no API key and no explicit base URL).
    pub fn fallback_from_env() -> Option<Self> {
        let provider = std::env::var("LLM_FALLBACK_PROVIDER")
            .unwrap_or_else(|_| "openrouter".to_string())
            .to_lowercase();
        let explicit_url = std::env::var("LLM_FALLBACK_BASE_URL")
            .ok()
            .filter(|u| !u.is_empty());
        let api_key = Self::api_key_for(&provider);
        if explicit_url.is_none() && api_key.is_none() {
            return None;
        }
        let base_url =
            explicit_url.unwrap_or_else(|| Self::default_base_url(&provider).to_string());
        let model = std::env::var("LLM_FALLBACK_MODEL")
            .unwrap_or_else(|_| "deepseek/deepseek-v3.2".to_string());
        Some(Self {
            provider,
            base_url,
            model,
            api_key,
        })
    }
}

/// Configuration for one generation run.
#[derive(Debug, Clone)]
pub struct PulseConfig {
    /// Backend probed first.
    pub primary: BackendConfig,
    /// Backend probed when the primary is unreachable.
    pub fallback: Option<BackendConfig>,
    /// Seed examples drawn per field. Default: `3`.
    pub seed_count: usize,
    /// Feedback examples drawn per field. Default: `3`.
    pub cache_count: usize,
    /// Sampling temperature for all phase calls. High by design — the
    /// instruction preamble constrains structure while temperature
    /// maximizes lexical diversity. Default: `1.2`.
    pub temperature: f32,
    /// Concurrent in-flight phase calls. Default: `2`.
    pub workers: usize,
    /// Per-call timeout. A timeout aborts the whole run. Default: `60s`.
    pub timeout: Duration,
}

impl Default for PulseConfig {
    fn default() -> Self {
        Self {
            primary: BackendConfig {
                provider: "lmstudio".to_string(),
                base_url: BackendConfig::default_base_url("lmstudio").to_string(),
                model: "gpt-oss-20b-heretic".to_string(),
                api_key: None,
            },
            fallback: None,
            seed_count: 3,
            cache_count: 3,
            temperature: 1.2,
            workers: 2,
            timeout: Duration::from_secs(60),
        }
    }
}

impl PulseConfig {
    /// Build a config from the environment.
    pub fn from_env() -> Self {
        Self {
            primary: BackendConfig::primary_from_env(),
            fallback: BackendConfig::fallback_from_env(),
            ..Default::default()
        }
    }

    /// Override the primary backend.
    pub fn with_primary(mut self, backend: BackendConfig) -> Self {
        self.primary = backend;
        self
    }

    /// Override the sample counts.
    pub fn with_sample_counts(mut self, seed: usize, cache: usize) -> Self {
        self.seed_count = seed;
        self.cache_count = cache;
        self
    }

    /// Override the per-call timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_pipeline_tuned() {
        let config = PulseConfig::default();
        assert_eq!(config.seed_count, 3);
        assert_eq!(config.cache_count, 3);
        assert_eq!(config.workers, 2);
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert!((config.temperature - 1.2).abs() < f32::EPSILON);
        assert!(config.fallback.is_none());
    }

    #[test]
    fn known_providers_resolve_base_urls() {
        assert_eq!(
            BackendConfig::default_base_url("lmstudio"),
            "http://localhost:1234/v1"
        );
        assert_eq!(
            BackendConfig::default_base_url("openrouter"),
            "https://openrouter.ai/api/v1"
        );
        assert_eq!(BackendConfig::default_base_url("unknown"), "");
    }

    #[test]
    fn builder_overrides_apply() {
        let config = PulseConfig::default()
            .with_sample_counts(5, 2)
            .with_timeout(Duration::from_secs(10));
        assert_eq!(config.seed_count, 5);
        assert_eq!(config.cache_count, 2);
        assert_eq!(config.timeout, Duration::from_secs(10));
    }
}
