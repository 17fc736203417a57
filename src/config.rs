use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Default, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct LoreConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub embedding: EmbeddingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub transport: String,
    pub host: String,
    pub port: u16,
    pub log_level: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub db_path: String,
    pub default_book: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Full endpoint URL, e.g. `https://api.openai.com/v1/embeddings`.
    pub provider: String,
    pub model: String,
    pub api_key: String,
    pub timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            transport: "stdio".into(),
            host: "127.0.0.1".into(),
            port: 8765,
            log_level: "info".into(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        let db_path = default_loreseek_dir()
            .join("background.db")
            .to_string_lossy()
            .into_owned();
        Self {
            db_path,
            default_book: "default".into(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "https://api.siliconflow.cn/v1/embeddings".into(),
            model: "BAAI/bge-m3".into(),
            api_key: String::new(),
            timeout_secs: 30,
        }
    }
}

/// Returns `~/.loreseek/`, or `./.loreseek/` when no home directory is known.
pub fn default_loreseek_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".loreseek")
}

/// Returns the default config file path: `~/.loreseek/config.toml`
pub fn default_config_path() -> PathBuf {
    default_loreseek_dir().join("config.toml")
}

impl LoreConfig {
    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            LoreConfig::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Write this config as TOML, creating parent directories as needed.
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }
        let contents = toml::to_string_pretty(self).context("failed to serialize config")?;
        std::fs::write(path, contents)
            .with_context(|| format!("failed to write config to {}", path.display()))?;
        Ok(())
    }

    /// Apply environment variable overrides (`LORESEEK_*`).
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("LORESEEK_DB") {
            self.storage.db_path = val;
        }
        if let Ok(val) = std::env::var("LORESEEK_BOOK") {
            self.storage.default_book = val;
        }
        if let Ok(val) = std::env::var("LORESEEK_LOG_LEVEL") {
            self.server.log_level = val;
        }
        if let Ok(val) = std::env::var("LORESEEK_EMBEDDING_URL") {
            self.embedding.provider = val;
        }
        if let Ok(val) = std::env::var("LORESEEK_EMBEDDING_MODEL") {
            self.embedding.model = val;
        }
        if let Ok(val) = std::env::var("LORESEEK_API_KEY") {
            self.embedding.api_key = val;
        }
    }

    /// Resolve the database path, expanding `~` if needed.
    pub fn resolved_db_path(&self) -> PathBuf {
        expand_tilde(&self.storage.db_path)
    }

    /// The book to use when a command does not name one.
    pub fn book_or_default<'a>(&'a self, book: Option<&'a str>) -> &'a str {
        book.unwrap_or(&self.storage.default_book)
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}
