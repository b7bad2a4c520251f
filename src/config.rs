//! TOML configuration parsing.
//!
//! The configuration is loaded once at process start and passed by reference
//! to every component. Secrets never live in the file: the file names the
//! environment variables that hold them, and [`Credentials::from_env`]
//! resolves them once.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub notion: NotionConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct NotionConfig {
    pub database_id: String,
    #[serde(default = "default_notion_api_base")]
    pub api_base: String,
    #[serde(default = "default_notion_version")]
    pub version: String,
    #[serde(default = "default_notion_token_env")]
    pub token_env: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Select property that receives the parsed sentiment label.
    #[serde(default)]
    pub sentiment_property: Option<String>,
    /// Select property that receives the parsed category label.
    #[serde(default)]
    pub category_property: Option<String>,
}

fn default_notion_api_base() -> String {
    "https://api.notion.com/v1".to_string()
}
fn default_notion_version() -> String {
    "2022-06-28".to_string()
}
fn default_notion_token_env() -> String {
    "NOTION_TOKEN".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct GenerationConfig {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_openai_api_base")]
    pub api_base: String,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_generation_timeout_secs")]
    pub timeout_secs: u64,
    /// Company the support persona speaks for.
    #[serde(default = "default_company")]
    pub company: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            max_tokens: default_max_tokens(),
            api_base: default_openai_api_base(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_generation_timeout_secs(),
            company: default_company(),
        }
    }
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_max_tokens() -> u32 {
    400
}
fn default_openai_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}
fn default_generation_timeout_secs() -> u64 {
    60
}
fn default_company() -> String {
    "Refurbed".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct PipelineConfig {
    /// Write a pending marker before generating so overlapping runs skip
    /// the document.
    #[serde(default)]
    pub claim: bool,
    /// How long a pending marker keeps other runs away. Older markers are
    /// ignored, so a run that died mid-draft cannot block its page.
    #[serde(default = "default_claim_ttl_secs")]
    pub claim_ttl_secs: u64,
    /// Upper bound on documents annotated per run. `0` means unlimited.
    #[serde(default)]
    pub max_documents: usize,
}

fn default_claim_ttl_secs() -> u64 {
    300
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            claim: false,
            claim_ttl_secs: default_claim_ttl_secs(),
            max_documents: 0,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:3000".to_string()
}

impl PipelineConfig {
    pub fn document_limit(&self) -> Option<usize> {
        (self.max_documents > 0).then_some(self.max_documents)
    }

    pub fn claim_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.claim_ttl_secs as i64)
    }
}

/// Bearer credentials for the two hosted services.
#[derive(Clone)]
pub struct Credentials {
    pub notion_token: String,
    pub openai_api_key: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("notion_token", &"<redacted>")
            .field("openai_api_key", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    /// Reads both secrets from the environment variables named in `config`.
    pub fn from_env(config: &Config) -> Result<Self> {
        Ok(Self {
            notion_token: read_secret(&config.notion.token_env)?,
            openai_api_key: read_secret(&config.generation.api_key_env)?,
        })
    }
}

fn read_secret(var: &str) -> Result<String> {
    match std::env::var(var) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => anyhow::bail!("{} environment variable not set", var),
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_config(&content)
}

pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;

    if config.notion.database_id.trim().is_empty() {
        anyhow::bail!("notion.database_id must not be empty");
    }

    if config.generation.max_tokens == 0 {
        anyhow::bail!("generation.max_tokens must be > 0");
    }

    if config.pipeline.claim_ttl_secs == 0 || config.pipeline.claim_ttl_secs > i32::MAX as u64 {
        anyhow::bail!("pipeline.claim_ttl_secs must be between 1 and {}", i32::MAX);
    }

    if config.server.bind.trim().is_empty() {
        anyhow::bail!("server.bind must not be empty");
    }

    Ok(config)
}
