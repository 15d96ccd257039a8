//! Layered configuration loader and path helpers.
//!
//! Uses Figment to merge built-in defaults, `plagdet.toml`,
//! `plagdet.<env>.toml` and `PLAGDET_*` env vars (nested keys separated by
//! `__`, e.g. `PLAGDET_DETECTION__CHUNK_SIZE=800`).
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Error, Result};

pub const ENV_PREFIX: &str = "PLAGDET_";

/// Order of the capped match list in a detection result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchOrder {
    /// Candidate order, then chunk-pair order.
    #[default]
    Accumulation,
    /// Highest score first; ties keep accumulation order.
    Ranked,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionSettings {
    pub similarity_threshold: f64,
    pub chunk_size: usize,
    pub min_exact_match_chars: usize,
    pub max_matches: usize,
    pub preview_chars: usize,
    pub match_order: MatchOrder,
    pub timeout_secs: u64,
}

impl Default for DetectionSettings {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.8,
            chunk_size: 1000,
            min_exact_match_chars: 40,
            max_matches: 100,
            preview_chars: 200,
            match_order: MatchOrder::Accumulation,
            timeout_secs: 300,
        }
    }
}

impl DetectionSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub model_dir: Option<String>,
    pub max_len: usize,
    pub batch_size: usize,
    pub use_fake: bool,
    pub fake_dim: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self { model_dir: None, max_len: 256, batch_size: 32, use_fake: false, fake_dim: 384 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self { level: "info".to_string() }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub detection: DetectionSettings,
    pub embedding: EmbeddingSettings,
    pub logging: LoggingSettings,
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        let d = &self.detection;
        validate_threshold(d.similarity_threshold)?;
        if d.chunk_size == 0 {
            return Err(Error::InvalidConfig("detection.chunk_size must be > 0".into()));
        }
        if d.max_matches == 0 {
            return Err(Error::InvalidConfig("detection.max_matches must be > 0".into()));
        }
        if d.preview_chars == 0 {
            return Err(Error::InvalidConfig("detection.preview_chars must be > 0".into()));
        }
        if d.timeout_secs == 0 {
            return Err(Error::InvalidConfig("detection.timeout_secs must be > 0".into()));
        }
        let e = &self.embedding;
        if e.batch_size == 0 {
            return Err(Error::InvalidConfig("embedding.batch_size must be > 0".into()));
        }
        if e.max_len == 0 || e.fake_dim == 0 {
            return Err(Error::InvalidConfig("embedding.max_len and embedding.fake_dim must be > 0".into()));
        }
        Ok(())
    }
}

/// A similarity threshold must be a finite value in `[0, 1]`.
pub fn validate_threshold(threshold: f64) -> Result<()> {
    if threshold.is_finite() && (0.0..=1.0).contains(&threshold) {
        Ok(())
    } else {
        Err(Error::InvalidConfig(format!("similarity threshold {threshold} is outside [0, 1]")))
    }
}

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file("plagdet.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("plagdet.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("plagdet.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("plagdet.test.toml")),
            other => tracing::debug!(env = other, "no environment overlay for RUST_ENV"),
        }
        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

        let config = Self { figment };
        config.settings()?;
        Ok(config)
    }

    pub fn from_figment(figment: Figment) -> Self {
        Self { figment }
    }

    pub fn get<T>(&self, key: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| Error::InvalidConfig(format!("Failed to get '{}': {}", key, e)))
    }

    /// Extract and validate the typed settings tree.
    pub fn settings(&self) -> Result<Settings> {
        let settings: Settings = self
            .figment
            .extract()
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        Settings::default().validate().expect("defaults validate");
    }

    #[test]
    fn threshold_bounds() {
        assert!(validate_threshold(0.0).is_ok());
        assert!(validate_threshold(1.0).is_ok());
        assert!(validate_threshold(1.01).is_err());
        assert!(validate_threshold(-0.1).is_err());
        assert!(validate_threshold(f64::NAN).is_err());
    }

    #[test]
    fn zero_chunk_size_rejected() {
        let mut s = Settings::default();
        s.detection.chunk_size = 0;
        let err = s.validate().unwrap_err();
        assert!(err.to_string().contains("chunk_size"));
    }
}
