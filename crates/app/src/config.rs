use anyhow::{Context, Result};
use recondash_core::table::DEFAULT_ITEMS_PER_PAGE;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILE_NAME: &str = "recondash.toml";

pub const ENV_API_BASE: &str = "RECONDASH_API_BASE";
pub const ENV_OPENAI_KEY: &str = "RECONDASH_OPENAI_KEY";
pub const ENV_DEMO_MODE: &str = "RECONDASH_DEMO_MODE";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api_base_url: String,
    pub openai_key: Option<String>,
    pub request_timeout_secs: u64,
    /// Answer network failures with synthesized data instead of an error.
    pub demo_mode: bool,
    pub items_per_page: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:5000".to_string(),
            openai_key: None,
            request_timeout_secs: 300,
            demo_mode: false,
            items_per_page: DEFAULT_ITEMS_PER_PAGE,
        }
    }
}

impl AppConfig {
    /// Reads `path` if given, otherwise the file in the platform config
    /// directory. A missing file yields the defaults; environment overrides
    /// are applied last.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path.map(Path::to_path_buf).or_else(default_config_path);

        let mut config = match path {
            Some(p) if p.exists() => {
                let raw = std::fs::read_to_string(&p)
                    .with_context(|| format!("Failed to read config {}", p.display()))?;
                let config = Self::from_toml(&raw)
                    .with_context(|| format!("Invalid config {}", p.display()))?;
                tracing::debug!(path = %p.display(), "Loaded config");
                config
            }
            _ => Self::default(),
        };

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(base) = lookup(ENV_API_BASE).filter(|v| !v.trim().is_empty()) {
            self.api_base_url = base;
        }
        if let Some(key) = lookup(ENV_OPENAI_KEY).filter(|v| !v.trim().is_empty()) {
            self.openai_key = Some(key);
        }
        if let Some(flag) = lookup(ENV_DEMO_MODE) {
            self.demo_mode = matches!(flag.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on");
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("com", "recondash", "Recondash")
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}
