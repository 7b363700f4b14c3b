//! Layered configuration.
//!
//! Figment merges `lingua.toml`, then `lingua.<env>.toml` (env from
//! `LINGUA_ENV`, default `dev`), then `LINGUA_*` environment variables.
//! Search constants are fixed behavior and are not configurable.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Catalog database file
    pub database_path: PathBuf,
    /// Maximum pooled SQLite connections
    pub pool_size: u32,
    /// `EnvFilter` directive used when `RUST_LOG` is unset
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("lingua.sqlite"),
            pool_size: 8,
            log_filter: "lingua_search=info".to_string(),
        }
    }
}

pub struct Config {
    figment: Figment,
    env_name: String,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("LINGUA_ENV").unwrap_or_else(|_| "dev".to_string());
        let figment = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file("lingua.toml"))
            .merge(Toml::file(format!("lingua.{}.toml", env_name)))
            .merge(Env::prefixed("LINGUA_"));

        let config = Self { figment, env_name };
        config.settings()?;
        Ok(config)
    }

    pub fn env_name(&self) -> &str {
        &self.env_name
    }

    pub fn settings(&self) -> anyhow::Result<Settings> {
        let settings: Settings = self
            .figment
            .extract()
            .map_err(|e| anyhow::anyhow!("Failed to load settings: {}", e))?;
        if settings.pool_size == 0 {
            anyhow::bail!("pool_size must be at least 1");
        }
        if settings.database_path.as_os_str().is_empty() {
            anyhow::bail!("database_path must not be empty");
        }
        Ok(settings)
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }
}
