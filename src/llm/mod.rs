//! Generic LLM client infrastructure.
//!
//! This module provides the core traits and implementations for invoking LLMs.
//! Domain-specific prompting and parsing lives in the respective modules
//! (`analysis` for project analysis, `advisor` for the consultant chat).
//!
//! # Configuration
//!
//! LLM settings can be configured via:
//! - CLI arguments: `--llm-provider`, `--llm-model`, `--llm-timeout`
//! - Environment variables: `HRIA_LLM_PROVIDER`, `HRIA_LLM_MODELS`,
//!   `HRIA_LLM_TIMEOUT_SECS`, `HRIA_GEMINI_API_KEY`
//!
//! CLI arguments take precedence over environment variables.

mod gemini;

pub use gemini::GeminiClient;

use std::env;
use std::io::Write;
use std::process::{Command, Stdio};
use std::sync::Arc;
use std::time::Duration;

use log::debug;

/// Models tried, in order, when no list is configured for Gemini.
pub const DEFAULT_GEMINI_MODELS: &[&str] = &[
    "gemini-2.0-flash-exp",
    "gemini-1.5-flash",
    "gemini-1.5-flash-latest",
    "gemini-pro",
];

/// Per-attempt timeout when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Available LLM providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LlmProvider {
    /// Google Generative Language API (default)
    #[default]
    Gemini,
    /// Claude CLI
    Claude,
    /// OpenCode CLI
    OpenCode,
}

impl std::fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Gemini => write!(f, "gemini"),
            Self::Claude => write!(f, "claude"),
            Self::OpenCode => write!(f, "opencode"),
        }
    }
}

impl std::str::FromStr for LlmProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gemini" => Ok(Self::Gemini),
            "claude" => Ok(Self::Claude),
            "opencode" => Ok(Self::OpenCode),
            _ => Err(format!(
                "Unknown LLM provider: '{}'. Valid options: gemini, claude, opencode",
                s
            )),
        }
    }
}

/// Configuration for LLM clients.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// The LLM provider to use.
    pub provider: LlmProvider,
    /// Ordered model list; each model is one attempt.
    pub models: Vec<String>,
    /// API key for HTTP providers.
    pub api_key: Option<String>,
    /// Upper bound on a single attempt.
    pub timeout: Duration,
    /// Backend provider for opencode (e.g., "lmstudio", "ollama").
    pub opencode_backend: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::default(),
            models: Vec::new(),
            api_key: None,
            timeout: DEFAULT_TIMEOUT,
            opencode_backend: None,
        }
    }
}

impl LlmConfig {
    /// Create a new config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create config from environment variables.
    ///
    /// Reads:
    /// - `HRIA_LLM_PROVIDER` - provider name (gemini, claude, opencode)
    /// - `HRIA_LLM_MODELS` - comma-separated ordered model list
    /// - `HRIA_GEMINI_API_KEY` or `GEMINI_API_KEY` - API key for gemini
    /// - `HRIA_LLM_TIMEOUT_SECS` - per-attempt timeout in seconds
    /// - `HRIA_OPENCODE_BACKEND` - backend for opencode (e.g., lmstudio, ollama)
    pub fn from_env() -> Self {
        let provider = env::var("HRIA_LLM_PROVIDER")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or_default();

        let models = env::var("HRIA_LLM_MODELS")
            .map(|v| parse_model_list(&v))
            .unwrap_or_default();
        let api_key = env::var("HRIA_GEMINI_API_KEY")
            .or_else(|_| env::var("GEMINI_API_KEY"))
            .ok()
            .filter(|k| !k.trim().is_empty());
        let timeout = env::var("HRIA_LLM_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.trim().parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TIMEOUT);
        let opencode_backend = env::var("HRIA_OPENCODE_BACKEND").ok();

        Self {
            provider,
            models,
            api_key,
            timeout,
            opencode_backend,
        }
    }

    /// Set the provider.
    pub fn with_provider(mut self, provider: LlmProvider) -> Self {
        self.provider = provider;
        self
    }

    /// Replace the model list.
    pub fn with_models<I, S>(mut self, models: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.models = models.into_iter().map(Into::into).collect();
        self
    }

    /// Set the per-attempt timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Merge with CLI overrides. CLI values take precedence.
    pub fn with_overrides(
        mut self,
        provider: Option<LlmProvider>,
        models: Vec<String>,
        timeout_secs: Option<u64>,
        opencode_backend: Option<String>,
    ) -> Self {
        if let Some(p) = provider {
            self.provider = p;
        }
        if !models.is_empty() {
            self.models = models;
        }
        if let Some(secs) = timeout_secs {
            self.timeout = Duration::from_secs(secs);
        }
        if let Some(b) = opencode_backend {
            self.opencode_backend = Some(b);
        }
        self
    }

    /// Ordered model list, falling back to provider defaults.
    ///
    /// CLI providers with no configured model get a single `None` entry,
    /// which lets the tool pick its own default.
    pub fn effective_models(&self) -> Vec<Option<String>> {
        if !self.models.is_empty() {
            return self.models.iter().cloned().map(Some).collect();
        }
        match self.provider {
            LlmProvider::Gemini => DEFAULT_GEMINI_MODELS
                .iter()
                .map(|m| Some(m.to_string()))
                .collect(),
            LlmProvider::Claude | LlmProvider::OpenCode => vec![None],
        }
    }

    /// Create an LLM client for one model of this configuration.
    pub fn create_client(&self, model: Option<String>) -> Arc<dyn LlmClient> {
        match self.provider {
            LlmProvider::Gemini => Arc::new(GeminiClient::new(
                self.api_key.clone(),
                model.unwrap_or_else(|| DEFAULT_GEMINI_MODELS[0].to_string()),
            )),
            LlmProvider::Claude => Arc::new(ClaudeCliClient { model }),
            LlmProvider::OpenCode => Arc::new(OpenCodeClient {
                model,
                backend: self.opencode_backend.clone(),
            }),
        }
    }
}

/// Split a comma-separated model list, dropping blanks.
pub fn parse_model_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Trait for LLM completion clients.
pub trait LlmClient: Send + Sync {
    /// Send a prompt to the LLM and return the completion response.
    fn complete(&self, prompt: &str) -> Result<String, LlmError>;
}

/// Claude CLI client implementation.
pub struct ClaudeCliClient {
    pub model: Option<String>,
}

impl ClaudeCliClient {
    pub fn new() -> Self {
        Self { model: None }
    }

    pub fn with_model(model: impl Into<String>) -> Self {
        Self {
            model: Some(model.into()),
        }
    }
}

impl Default for ClaudeCliClient {
    fn default() -> Self {
        Self::new()
    }
}

impl LlmClient for ClaudeCliClient {
    fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        // Use stdin for prompt to avoid command line length limits
        let mut args = vec!["--print"];

        let model_str;
        if let Some(ref model) = self.model {
            model_str = model.clone();
            args.push("--model");
            args.push(&model_str);
        }

        let mut child = Command::new("claude")
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| LlmError::ClientError(format!("Failed to run claude CLI: {}", e)))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(prompt.as_bytes())
                .map_err(|e| LlmError::ClientError(format!("Failed to write to stdin: {}", e)))?;
        }

        let output = child
            .wait_with_output()
            .map_err(|e| LlmError::ClientError(format!("Failed to wait for claude CLI: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(LlmError::ClientError(format!(
                "claude CLI failed: {}",
                stderr.trim()
            )));
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.trim().is_empty() {
            debug!("Claude CLI stderr: {}", stderr.trim());
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

/// OpenCode CLI client implementation.
pub struct OpenCodeClient {
    pub model: Option<String>,
    /// Backend provider (e.g., "lmstudio", "ollama").
    pub backend: Option<String>,
}

impl OpenCodeClient {
    fn model_arg(&self) -> Option<String> {
        match (&self.backend, &self.model) {
            (Some(_), Some(model)) if model.contains('/') => Some(model.clone()),
            (Some(backend), Some(model)) => Some(format!("{}/{}", backend, model)),
            (None, Some(model)) => Some(model.clone()),
            // A bare backend is not a usable model path; let opencode pick.
            (_, None) => None,
        }
    }
}

impl LlmClient for OpenCodeClient {
    fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let mut args = vec!["run".to_string(), prompt.to_string()];
        args.push("--format".to_string());
        args.push("json".to_string());
        if let Some(model) = self.model_arg() {
            args.push("-m".to_string());
            args.push(model);
        }

        let output = Command::new("opencode")
            .args(&args)
            .output()
            .map_err(|e| LlmError::ClientError(format!("Failed to run opencode CLI: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(LlmError::ClientError(format!(
                "opencode CLI failed (exit {}): {}",
                output.status.code().unwrap_or(-1),
                stderr.trim()
            )));
        }

        // Each line is a JSON event; keep the text parts.
        let stdout = String::from_utf8_lossy(&output.stdout);
        let text_parts: Vec<String> = stdout
            .lines()
            .filter_map(|line| serde_json::from_str::<serde_json::Value>(line).ok())
            .filter(|json| json.get("type").and_then(|v| v.as_str()) == Some("text"))
            .filter_map(|json| {
                json.get("part")
                    .and_then(|p| p.get("text"))
                    .and_then(|t| t.as_str())
                    .map(str::to_string)
            })
            .collect();

        if text_parts.is_empty() {
            return Err(LlmError::InvalidResponse(format!(
                "No text output from opencode. Raw output: {}",
                stdout.chars().take(500).collect::<String>()
            )));
        }

        Ok(text_parts.join(""))
    }
}

/// Errors from LLM operations.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("LLM client error: {0}")]
    ClientError(String),

    #[error("API key is not set. Set HRIA_GEMINI_API_KEY (or GEMINI_API_KEY)")]
    MissingApiKey,

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),
}

impl LlmError {
    /// Whether the failure points at a bad or missing API key.
    pub fn is_api_key_problem(&self) -> bool {
        match self {
            Self::MissingApiKey => true,
            Self::Http { status, body } => {
                *status == 401 || *status == 403 || body.contains("API key")
            }
            Self::ClientError(msg) => msg.contains("API key"),
            _ => false,
        }
    }

    /// Whether the failure is a quota or rate-limit rejection.
    pub fn is_quota_problem(&self) -> bool {
        match self {
            Self::Http { status, body } => *status == 429 || body.to_lowercase().contains("quota"),
            Self::ClientError(msg) => msg.to_lowercase().contains("quota"),
            _ => false,
        }
    }
}
