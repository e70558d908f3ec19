//! Lightweight configuration loader and typed settings.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + `APP_*` env vars
//! (`APP_QDRANT__URL` sets `qdrant.url`). Provides helpers to expand `~` and
//! `${VAR}` and to resolve relative paths against a known base directory.

use anyhow::Context;
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::Error;

pub struct Config {
    figment: Figment,
    env_name: String,
}

impl Config {
    /// Load from the current directory, picking the overlay from `RUST_ENV`.
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
        Self::load_from(Path::new("."), &env_name)
    }

    /// Load `config.toml` and the `env_name` overlay from `dir`, then apply
    /// `APP_*` environment overrides.
    pub fn load_from(dir: &Path, env_name: &str) -> anyhow::Result<Self> {
        let mut figment = Figment::new().merge(Toml::file(dir.join("config.toml")));
        match env_name {
            "dev" | "development" => figment = figment.merge(Toml::file(dir.join("config.dev.toml"))),
            "prod" | "production" => figment = figment.merge(Toml::file(dir.join("config.prod.toml"))),
            "test" | "testing" => figment = figment.merge(Toml::file(dir.join("config.test.toml"))),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));
        Ok(Self { figment, env_name: env_name.to_string() })
    }

    pub fn env_name(&self) -> &str {
        &self.env_name
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    /// A path-valued key, expanded and resolved against the current
    /// directory. `None` when the key is absent.
    pub fn get_path(&self, key: &str) -> anyhow::Result<Option<PathBuf>> {
        if !self.figment.contains(key) {
            return Ok(None);
        }
        let raw: String = self.get(key)?;
        let cwd = env::current_dir().context("reading current directory")?;
        Ok(Some(resolve_with_base(&cwd, raw)))
    }

    /// Like [`Config::get`] but falls back to `T::default()` when the key is
    /// absent. A present but malformed value is still an error.
    pub fn get_or_default<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned + Default,
    {
        if self.figment.contains(key) { self.get(key) } else { Ok(T::default()) }
    }
}

/// Connection settings for the Qdrant server (`[qdrant]`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QdrantSettings {
    pub url: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for QdrantSettings {
    fn default() -> Self {
        Self { url: "http://localhost:6334".to_string(), api_key: None, timeout_secs: 30 }
    }
}

/// Search and schema tuning (`[search]`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// RRF smoothing constant used when a hybrid search names no `k`.
    pub rrf_k: f32,
    /// Each hybrid leg retrieves `limit * candidate_multiplier` hits.
    pub candidate_multiplier: usize,
    /// Size of the sparse token bucket space.
    pub sparse_buckets: u32,
    pub dense_vector_name: String,
    pub sparse_vector_name: String,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            rrf_k: 60.0,
            candidate_multiplier: 2,
            sparse_buckets: 65_536,
            dense_vector_name: "dense".to_string(),
            sparse_vector_name: "sparse".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub qdrant: QdrantSettings,
    pub search: SearchSettings,
}

impl Settings {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let settings = Self {
            qdrant: config.get_or_default("qdrant").context("reading [qdrant]")?,
            search: config.get_or_default("search").context("reading [search]")?,
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> crate::Result<()> {
        if self.qdrant.url.trim().is_empty() {
            return Err(Error::InvalidConfig("qdrant.url must not be empty".to_string()));
        }
        if !(self.search.rrf_k > 0.0) {
            return Err(Error::InvalidConfig(format!("search.rrf_k must be positive, got {}", self.search.rrf_k)));
        }
        if self.search.candidate_multiplier == 0 {
            return Err(Error::InvalidConfig("search.candidate_multiplier must be at least 1".to_string()));
        }
        if self.search.sparse_buckets == 0 {
            return Err(Error::InvalidConfig("search.sparse_buckets must be at least 1".to_string()));
        }
        if self.search.dense_vector_name == self.search.sparse_vector_name {
            return Err(Error::InvalidConfig("dense and sparse vector names must differ".to_string()));
        }
        Ok(())
    }
}

/// Expand `${VAR}`/`$VAR` and a leading `~`. If any variable is unset the
/// variables are left as written. Nothing is canonicalized.
pub fn expand_path(input: impl AsRef<str>) -> PathBuf {
    let raw = input.as_ref();
    let with_env = shellexpand::env(raw).unwrap_or(std::borrow::Cow::Borrowed(raw));
    PathBuf::from(shellexpand::tilde(&with_env).into_owned())
}

/// [`expand_path`], then join onto `base` unless the result is absolute.
pub fn resolve_with_base(base: &Path, input: impl AsRef<str>) -> PathBuf {
    let path = expand_path(input);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}
