use anyhow::{Context, Result};
use chrono_tz::Tz;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub corpus: CorpusConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    pub server: ServerConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub ingest: Option<IngestConfig>,
    #[serde(default)]
    pub assistant: AssistantConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CorpusConfig {
    pub path: PathBuf,
    #[serde(default = "default_max_content_chars")]
    pub max_content_chars: usize,
}

fn default_max_content_chars() -> usize {
    10_000
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub root: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
            base_url: default_base_url(),
            api_key_env: default_api_key_env(),
        }
    }
}

fn default_provider() -> String {
    "anthropic".to_string()
}
fn default_model() -> String {
    "claude-3-haiku-20240307".to_string()
}
fn default_max_tokens() -> u32 {
    1000
}
fn default_temperature() -> f64 {
    0.7
}
fn default_timeout_secs() -> u64 {
    60
}
fn default_base_url() -> String {
    "https://api.anthropic.com".to_string()
}
fn default_api_key_env() -> String {
    "ANTHROPIC_API_KEY".to_string()
}

impl LlmConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub bind: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct HistoryConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct IngestConfig {
    pub root: PathBuf,
    #[serde(default = "default_include_globs")]
    pub include_globs: Vec<String>,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
    #[serde(default)]
    pub follow_symlinks: bool,
}

fn default_include_globs() -> Vec<String> {
    vec![
        "**/*.docx".to_string(),
        "**/*.xlsx".to_string(),
        "**/*.pdf".to_string(),
    ]
}

#[derive(Debug, Deserialize, Clone)]
pub struct AssistantConfig {
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default = "default_letterhead")]
    pub letterhead: Vec<String>,
    #[serde(default)]
    pub blocked_terms: Vec<String>,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            letterhead: default_letterhead(),
            blocked_terms: Vec::new(),
        }
    }
}

fn default_timezone() -> String {
    "Europe/Istanbul".to_string()
}

fn default_letterhead() -> Vec<String> {
    vec![
        "T.C.".to_string(),
        "KIRŞEHİR AHİ EVRAN ÜNİVERSİTESİ".to_string(),
        "Çiçekdağı Meslek Yüksekokulu Müdürlüğü".to_string(),
    ]
}

impl AssistantConfig {
    /// Parsed timezone; `load_config` has already validated the name.
    pub fn tz(&self) -> Tz {
        self.timezone.parse().unwrap_or(chrono_tz::Europe::Istanbul)
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.corpus.max_content_chars == 0 {
        anyhow::bail!("corpus.max_content_chars must be > 0");
    }

    // Validate llm
    match config.llm.provider.as_str() {
        "disabled" | "anthropic" => {}
        other => anyhow::bail!(
            "Unknown llm provider: '{}'. Must be anthropic or disabled.",
            other
        ),
    }

    if !(0.0..=1.0).contains(&config.llm.temperature) {
        anyhow::bail!("llm.temperature must be in [0.0, 1.0]");
    }

    if config.llm.max_tokens == 0 {
        anyhow::bail!("llm.max_tokens must be > 0");
    }

    // Validate history
    if config.history.enabled && config.history.path.is_none() {
        anyhow::bail!("history.path must be set when history is enabled");
    }

    // Validate assistant
    if config.assistant.timezone.parse::<Tz>().is_err() {
        anyhow::bail!(
            "assistant.timezone '{}' is not a valid IANA timezone",
            config.assistant.timezone
        );
    }

    if config.assistant.letterhead.is_empty() {
        anyhow::bail!("assistant.letterhead must have at least one line");
    }

    Ok(config)
}
