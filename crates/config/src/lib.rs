//! Configuration loading, validation, and management for AgentFlow.
//!
//! Loads configuration from `~/.agentflow/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use agentflow_core::{Credentials, ProviderKind};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.agentflow/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// LLM backend family
    #[serde(default = "default_provider")]
    pub provider: ProviderKind,

    /// Model override. When absent the provider's default model is used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// API key for the selected provider. Absent → offline simulator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Max tokens per LLM response
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Agent loop limits
    #[serde(default)]
    pub agent: AgentConfig,

    /// google_search settings
    #[serde(default)]
    pub search: SearchConfig,

    /// ai_pipe settings
    #[serde(default)]
    pub pipe: PipeConfig,

    /// execute_javascript sandbox
    #[serde(default)]
    pub sandbox: SandboxConfig,

    /// Provider-specific endpoint overrides, keyed by provider name
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

fn default_provider() -> ProviderKind {
    ProviderKind::OpenAi
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    1000
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
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("api_key", &redact(&self.api_key))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("agent", &self.agent)
            .field("search", &self.search)
            .field("pipe", &self.pipe)
            .field("sandbox", &self.sandbox)
            .field("providers", &self.providers)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Model calls that may request tools within one turn
    #[serde(default = "default_max_tool_rounds")]
    pub max_tool_rounds: usize,

    #[serde(default = "default_provider_timeout")]
    pub provider_timeout_secs: u64,

    #[serde(default = "default_tool_timeout")]
    pub tool_timeout_secs: u64,
}

fn default_max_tool_rounds() -> usize {
    8
}
fn default_provider_timeout() -> u64 {
    60
}
fn default_tool_timeout() -> u64 {
    30
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_tool_rounds: default_max_tool_rounds(),
            provider_timeout_secs: default_provider_timeout(),
            tool_timeout_secs: default_tool_timeout(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Google Custom Search API key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Google Programmable Search Engine id (`cx`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine_id: Option<String>,

    /// Per-request timeout for each live search stage
    #[serde(default = "default_search_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_custom_search_url")]
    pub custom_search_url: String,

    #[serde(default = "default_duckduckgo_url")]
    pub duckduckgo_url: String,

    #[serde(default = "default_wikipedia_url")]
    pub wikipedia_url: String,

    /// Skip DuckDuckGo and Wikipedia (knowledge base and mock only)
    #[serde(default)]
    pub offline: bool,
}

fn default_search_timeout() -> u64 {
    10
}
fn default_custom_search_url() -> String {
    "https://www.googleapis.com".into()
}
fn default_duckduckgo_url() -> String {
    "https://api.duckduckgo.com".into()
}
fn default_wikipedia_url() -> String {
    "https://en.wikipedia.org".into()
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            engine_id: None,
            timeout_secs: default_search_timeout(),
            custom_search_url: default_custom_search_url(),
            duckduckgo_url: default_duckduckgo_url(),
            wikipedia_url: default_wikipedia_url(),
            offline: false,
        }
    }
}

impl std::fmt::Debug for SearchConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchConfig")
            .field("api_key", &redact(&self.api_key))
            .field("engine_id", &self.engine_id)
            .field("timeout_secs", &self.timeout_secs)
            .field("custom_search_url", &self.custom_search_url)
            .field("duckduckgo_url", &self.duckduckgo_url)
            .field("wikipedia_url", &self.wikipedia_url)
            .field("offline", &self.offline)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipeConfig {
    /// Simulated processing delay per workflow run
    #[serde(default = "default_pipe_latency")]
    pub latency_ms: u64,
}

fn default_pipe_latency() -> u64 {
    1000
}

impl Default for PipeConfig {
    fn default() -> Self {
        Self {
            latency_ms: default_pipe_latency(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SandboxConfig {
    /// Off unless explicitly enabled
    #[serde(default)]
    pub enabled: bool,

    /// JavaScript interpreter binary
    #[serde(default = "default_interpreter")]
    pub interpreter: String,

    #[serde(default = "default_sandbox_timeout")]
    pub timeout_ms: u64,

    #[serde(default = "default_max_memory")]
    pub max_memory_mb: u32,

    #[serde(default = "default_max_output")]
    pub max_output_bytes: usize,
}

fn default_interpreter() -> String {
    "node".into()
}
fn default_sandbox_timeout() -> u64 {
    5000
}
fn default_max_memory() -> u32 {
    64
}
fn default_max_output() -> usize {
    64 * 1024
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interpreter: default_interpreter(),
            timeout_ms: default_sandbox_timeout(),
            max_memory_mb: default_max_memory(),
            max_output_bytes: default_max_output(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Base URL override (tests, proxies, compatible gateways)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
}

impl AppConfig {
    /// Load configuration from the default path (~/.agentflow/config.toml).
    ///
    /// Environment variables override the file:
    /// - `AGENTFLOW_PROVIDER`, `AGENTFLOW_MODEL`
    /// - `AGENTFLOW_API_KEY`, then the provider's own key variable
    /// - `GOOGLE_SEARCH_API_KEY`, `GOOGLE_SEARCH_ENGINE_ID`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();
        let mut config = Self::load_from(&config_path)?;
        config.apply_env(|key| std::env::var(key).ok())?;
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

    /// Apply environment overrides through `lookup` (injectable for tests).
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(provider) = var("AGENTFLOW_PROVIDER") {
            self.provider = provider.parse().map_err(ConfigError::ValidationError)?;
        }

        if let Some(model) = var("AGENTFLOW_MODEL") {
            self.model = Some(model);
        }

        if self.api_key.is_none() {
            self.api_key = var("AGENTFLOW_API_KEY").or_else(|| var(provider_key_var(self.provider)));
        }

        if self.search.api_key.is_none() {
            self.search.api_key = var("GOOGLE_SEARCH_API_KEY");
        }
        if self.search.engine_id.is_none() {
            self.search.engine_id = var("GOOGLE_SEARCH_ENGINE_ID");
        }

        Ok(())
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".agentflow")
    }

    /// Path of the config file.
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::ValidationError(
                "temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.max_tokens == 0 {
            return Err(ConfigError::ValidationError("max_tokens must be > 0".into()));
        }

        if self.agent.max_tool_rounds == 0 {
            return Err(ConfigError::ValidationError(
                "agent.max_tool_rounds must be > 0".into(),
            ));
        }

        if self.agent.provider_timeout_secs == 0 || self.agent.tool_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "agent timeouts must be > 0".into(),
            ));
        }

        if self.sandbox.enabled && self.sandbox.interpreter.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "sandbox.interpreter must be set when the sandbox is enabled".into(),
            ));
        }

        if self.sandbox.max_memory_mb == 0 || self.sandbox.max_output_bytes == 0 {
            return Err(ConfigError::ValidationError(
                "sandbox limits must be > 0".into(),
            ));
        }

        Ok(())
    }

    /// Check if a usable API key is configured.
    pub fn has_api_key(&self) -> bool {
        self.credentials().api_key().is_some()
    }

    /// The model to request: the override, else the provider default.
    pub fn effective_model(&self) -> String {
        self.model
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(self.provider.default_model())
            .to_string()
    }

    /// Base URL override for a provider, if configured.
    pub fn api_url(&self, kind: ProviderKind) -> Option<&str> {
        self.providers
            .get(kind.as_str())
            .and_then(|p| p.api_url.as_deref())
    }

    /// The credentials handed to the core.
    pub fn credentials(&self) -> Credentials {
        Credentials {
            provider: Some(self.provider),
            api_key: self.api_key.clone(),
            model: Some(self.effective_model()),
            search_api_key: self.search.api_key.clone(),
            search_engine_id: self.search.engine_id.clone(),
        }
    }

    /// Generate a default config TOML string (for `config --init`).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: None,
            api_key: None,
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            agent: AgentConfig::default(),
            search: SearchConfig::default(),
            pipe: PipeConfig::default(),
            sandbox: SandboxConfig::default(),
            providers: HashMap::new(),
        }
    }
}

/// The provider-specific API key variable.
fn provider_key_var(kind: ProviderKind) -> &'static str {
    match kind {
        ProviderKind::OpenAi => "OPENAI_API_KEY",
        ProviderKind::Anthropic => "ANTHROPIC_API_KEY",
        ProviderKind::Google => "GEMINI_API_KEY",
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

impl From<ConfigError> for agentflow_core::Error {
    fn from(e: ConfigError) -> Self {
        agentflow_core::Error::Config {
            message: e.to_string(),
        }
    }
}
