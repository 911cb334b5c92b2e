pub mod schema;

pub use schema::{
    CacheBackend, GameConfig, GatewayConfig, ImageConfig, NarrativeConfig, SessionBackend,
    StorageConfig,
};
use crate::game::DEFAULT_SYSTEM_PROMPT;
use anyhow::{Context, Result};
use directories::UserDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const APP_DIR: &str = ".infinite-adventure";

// ── Top-level config ──────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Data directory (database, images) - computed from home, not serialized
    #[serde(skip)]
    pub data_dir: PathBuf,
    /// Path to config.toml - computed from home, not serialized
    #[serde(skip)]
    pub config_path: PathBuf,

    #[serde(default)]
    pub narrative: NarrativeConfig,

    #[serde(default)]
    pub image: ImageConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub gateway: GatewayConfig,

    #[serde(default)]
    pub game: GameConfig,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = UserDirs::new().map_or_else(
            || PathBuf::from(APP_DIR),
            |u| u.home_dir().join(APP_DIR),
        );
        Self {
            config_path: data_dir.join("config.toml"),
            data_dir,
            narrative: NarrativeConfig::default(),
            image: ImageConfig::default(),
            storage: StorageConfig::default(),
            gateway: GatewayConfig::default(),
            game: GameConfig::default(),
        }
    }
}

impl Config {
    /// Load `~/.infinite-adventure/config.toml`, writing a default one on
    /// first run. Environment overrides are applied and the result validated.
    pub fn load_or_init() -> Result<Self> {
        let home = UserDirs::new()
            .map(|u| u.home_dir().to_path_buf())
            .context("Could not find home directory")?;
        let mut config = Self::load_or_init_in(&home.join(APP_DIR))?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Same as [`Config::load_or_init`] rooted at `data_dir`, without
    /// environment overrides.
    pub fn load_or_init_in(data_dir: &Path) -> Result<Self> {
        let config_path = data_dir.join("config.toml");

        if !data_dir.exists() {
            fs::create_dir_all(data_dir).context("Failed to create data directory")?;
        }

        if config_path.exists() {
            let contents =
                fs::read_to_string(&config_path).context("Failed to read config file")?;
            let mut config: Config =
                toml::from_str(&contents).context("Failed to parse config file")?;
            config.config_path = config_path;
            config.data_dir = data_dir.to_path_buf();
            Ok(config)
        } else {
            let config = Self {
                config_path,
                data_dir: data_dir.to_path_buf(),
                ..Self::default()
            };
            config.save()?;
            tracing::info!(path = %config.config_path.display(), "wrote default config");
            Ok(config)
        }
    }

    /// Apply environment variable overrides to config
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_empty("ANTHROPIC_API_KEY") {
            self.narrative.api_key = Some(key);
        }
        if let Some(key) = non_empty("OPENAI_API_KEY") {
            self.image.api_key = Some(key);
        }
        if let Some(model) = non_empty("ADVENTURE_MODEL") {
            self.narrative.model = model;
        }
        if let Some(dir) = non_empty("ADVENTURE_DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(port) = non_empty("PORT").and_then(|p| p.trim().parse::<u16>().ok()) {
            self.gateway.port = port;
        }
        if let Some(host) = non_empty("HOST") {
            self.gateway.host = host;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.narrative.model.trim().is_empty() {
            anyhow::bail!("narrative.model must not be empty");
        }
        if self.image.model.trim().is_empty() {
            anyhow::bail!("image.model must not be empty");
        }
        if self.narrative.timeout_secs == 0 {
            anyhow::bail!("narrative.timeout_secs must be >= 1");
        }
        if self.image.timeout_secs == 0 {
            anyhow::bail!("image.timeout_secs must be >= 1");
        }
        if self.narrative.max_tokens == 0 {
            anyhow::bail!("narrative.max_tokens must be >= 1");
        }
        if !(0.0..=1.0).contains(&self.narrative.temperature) {
            anyhow::bail!("narrative.temperature must be in [0.0, 1.0]");
        }
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database
            .clone()
            .unwrap_or_else(|| self.data_dir.join("adventure.db"))
    }

    pub fn image_dir(&self) -> PathBuf {
        self.storage
            .image_dir
            .clone()
            .unwrap_or_else(|| self.data_dir.join("images"))
    }

    pub fn continuation_dir(&self) -> PathBuf {
        self.data_dir.join("continuations")
    }

    /// The narrator's system prompt: the configured file, or the built-in one.
    pub fn load_system_prompt(&self) -> Result<String> {
        let Some(path) = self.game.system_prompt_path.as_ref() else {
            return Ok(DEFAULT_SYSTEM_PROMPT.to_string());
        };
        let path = if path.is_relative() {
            self.data_dir.join(path)
        } else {
            path.clone()
        };
        let prompt = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read system prompt {}", path.display()))?;
        if prompt.trim().is_empty() {
            anyhow::bail!("system prompt {} is empty", path.display());
        }
        Ok(prompt)
    }

    pub fn save(&self) -> Result<()> {
        let toml_str = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(&self.config_path, toml_str).context("Failed to write config file")?;
        Ok(())
    }
}
