use serde::{Deserialize, Serialize};
use std::path::PathBuf;

fn default_true() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_max_retries() -> u32 {
    1
}

// ── Narrative model ──────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NarrativeConfig {
    /// Anthropic API key (env: `ANTHROPIC_API_KEY`)
    #[serde(default)]
    pub api_key: Option<String>,
    /// Override for the API origin, e.g. a local proxy
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_narrative_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    /// Bounded wait per model call
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Retries on timeouts and transient provider errors
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_narrative_model() -> String {
    "claude-3-opus-20240229".into()
}

fn default_max_tokens() -> u32 {
    1000
}

fn default_temperature() -> f64 {
    0.7
}

impl Default for NarrativeConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            model: default_narrative_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

// ── Image model ──────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageConfig {
    /// OpenAI API key (env: `OPENAI_API_KEY`)
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_image_model")]
    pub model: String,
    #[serde(default = "default_image_size")]
    pub size: String,
    #[serde(default = "default_image_quality")]
    pub quality: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_image_model() -> String {
    "dall-e-3".into()
}

fn default_image_size() -> String {
    "1024x1024".into()
}

fn default_image_quality() -> String {
    "standard".into()
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            model: default_image_model(),
            size: default_image_size(),
            quality: default_image_quality(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

// ── Storage ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SessionBackend {
    Memory,
    #[default]
    Sqlite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    Memory,
    Sqlite,
    Directory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// "memory" or "sqlite" (default)
    #[serde(default)]
    pub session_backend: SessionBackend,
    /// Continuation cache: "memory", "sqlite" (default) or "directory"
    #[serde(default = "default_narrative_cache")]
    pub narrative_cache: CacheBackend,
    /// Image cache: "memory", "sqlite" or "directory" (default)
    #[serde(default = "default_image_cache")]
    pub image_cache: CacheBackend,
    /// SQLite file; defaults to `<data dir>/adventure.db`
    #[serde(default)]
    pub database: Option<PathBuf>,
    /// Image directory; defaults to `<data dir>/images`
    #[serde(default)]
    pub image_dir: Option<PathBuf>,
}

fn default_narrative_cache() -> CacheBackend {
    CacheBackend::Sqlite
}

fn default_image_cache() -> CacheBackend {
    CacheBackend::Directory
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            session_backend: SessionBackend::default(),
            narrative_cache: default_narrative_cache(),
            image_cache: default_image_cache(),
            database: None,
            image_dir: None,
        }
    }
}

impl StorageConfig {
    /// Whether any configured backend needs the SQLite pool.
    pub fn uses_sqlite(&self) -> bool {
        self.session_backend == SessionBackend::Sqlite
            || self.narrative_cache == CacheBackend::Sqlite
            || self.image_cache == CacheBackend::Sqlite
    }
}

// ── Gateway ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Gateway port (default: 8000)
    #[serde(default = "default_gateway_port")]
    pub port: u16,
    /// Gateway host (default: 127.0.0.1)
    #[serde(default = "default_gateway_host")]
    pub host: String,
    /// Allow binding to a non-loopback address (default: false)
    #[serde(default)]
    pub allow_public_bind: bool,
    /// Answer CORS preflights from any origin (default: true)
    #[serde(default = "default_true")]
    pub permissive_cors: bool,
}

fn default_gateway_port() -> u16 {
    8000
}

fn default_gateway_host() -> String {
    "127.0.0.1".into()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_gateway_port(),
            host: default_gateway_host(),
            allow_public_bind: false,
            permissive_cors: true,
        }
    }
}

// ── Game ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GameConfig {
    /// File holding the narrator's system prompt. Relative paths resolve
    /// against the data directory. Unset means the built-in prompt.
    #[serde(default)]
    pub system_prompt_path: Option<PathBuf>,
}
