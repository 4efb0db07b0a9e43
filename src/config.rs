use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Context, Result, anyhow, bail};
use reqwest::Url;

use crate::conversation::DEFAULT_GREETING;

pub const DEFAULT_ENDPOINT: &str = "https://optibuy.vercel.app/api/chat";
pub const DEFAULT_TITLE: &str = "OptiBuy Assistant 💬";

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Config {
    pub endpoint_url: Option<String>,
    pub greeting: Option<String>,
    pub title: Option<String>,
}

impl Config {
    /// Load from an explicit path, or from the default location.
    ///
    /// An explicit path must exist and parse. The default location may be
    /// missing or broken, in which case defaults are used.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from(path)
                .with_context(|| format!("Failed to load config from {}", path.display()));
        }

        let path = match Self::default_path() {
            Ok(path) => path,
            Err(e) => {
                tracing::warn!("{}; using default config", e);
                return Ok(Self::default());
            }
        };

        if !path.exists() {
            return Ok(Self::default());
        }

        Ok(Self::load_from(&path).unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), "Ignoring unreadable config: {:#}", e);
            Self::default()
        }))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Endpoint URL with the CLI/env override taking precedence over the file.
    pub fn endpoint(&self, cli_override: Option<&str>) -> Result<Url> {
        let raw = cli_override
            .or(self.endpoint_url.as_deref())
            .unwrap_or(DEFAULT_ENDPOINT);

        let url = Url::parse(raw).with_context(|| format!("Invalid endpoint URL: {}", raw))?;
        if !matches!(url.scheme(), "http" | "https") {
            bail!("Endpoint URL must use http or https: {}", raw);
        }
        Ok(url)
    }

    pub fn greeting(&self) -> &str {
        self.greeting.as_deref().unwrap_or(DEFAULT_GREETING)
    }

    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or(DEFAULT_TITLE)
    }

    fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("optibuy").join("config.json"))
    }
}
