use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::Error;
use crate::types::DistanceMetric;

pub struct Config {
    figment: Figment,
}

impl Config {
    /// Load from the current directory, picking the env layer from `RUST_ENV`.
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
        Self::load_in(Path::new("."), &env_name)
    }

    /// Merge `config.toml`, then `config.<env>.toml`, then `APP_*` env vars.
    /// Nested keys use a double underscore: `APP_RETRIEVAL__K_RRF=30`.
    pub fn load_in(base: &Path, env_name: &str) -> anyhow::Result<Self> {
        let mut figment = Figment::new()
            .merge(Serialized::default("retrieval", RetrievalSettings::default()))
            .merge(Serialized::default("embedding", EmbeddingSettings::default()))
            .merge(Toml::file(base.join("config.toml")));
        match env_name {
            "dev" | "development" => figment = figment.merge(Toml::file(base.join("config.dev.toml"))),
            "prod" | "production" => figment = figment.merge(Toml::file(base.join("config.prod.toml"))),
            "test" | "testing" => figment = figment.merge(Toml::file(base.join("config.test.toml"))),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment };
        config.validate()?;
        Ok(config)
    }

    pub fn from_figment(figment: Figment) -> Self { Self { figment } }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    pub fn retrieval(&self) -> anyhow::Result<RetrievalSettings> { self.get("retrieval") }

    pub fn embedding(&self) -> anyhow::Result<EmbeddingSettings> { self.get("embedding") }

    fn validate(&self) -> anyhow::Result<()> {
        self.retrieval()?.validate()?;
        let embedding = self.embedding()?;
        if embedding.dimension == 0 {
            anyhow::bail!(Error::InvalidConfig("embedding.dimension must be positive".into()));
        }
        Ok(())
    }
}

/// Tunables for the standard dense + BM25 retriever.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RetrievalSettings {
    pub metric: DistanceMetric,
    pub k_rrf: f32,
    pub bm25: Bm25Settings,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self { metric: DistanceMetric::Cosine, k_rrf: 60.0, bm25: Bm25Settings::default() }
    }
}

impl RetrievalSettings {
    pub fn validate(&self) -> crate::error::Result<()> {
        if !(self.k_rrf >= 0.0) || !self.k_rrf.is_finite() { return Err(Error::InvalidRrfConstant(self.k_rrf)); }
        self.bm25.validate()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Bm25Settings {
    /// Term-frequency saturation.
    pub k1: f64,
    /// Length-normalization strength, in `[0, 1]`.
    pub b: f64,
    /// Scale of the `exp(-factor * raw)` mapping applied to returned scores.
    pub normalization_factor: f64,
}

impl Default for Bm25Settings {
    fn default() -> Self { Self { k1: 1.5, b: 0.75, normalization_factor: 0.1 } }
}

impl Bm25Settings {
    pub fn validate(&self) -> crate::error::Result<()> {
        if !self.k1.is_finite() || self.k1 < 0.0 {
            return Err(Error::InvalidConfig(format!("bm25.k1 must be a non-negative number, got {}", self.k1)));
        }
        if !(0.0..=1.0).contains(&self.b) {
            return Err(Error::InvalidConfig(format!("bm25.b must be within [0, 1], got {}", self.b)));
        }
        if !self.normalization_factor.is_finite() || self.normalization_factor <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "bm25.normalization_factor must be positive, got {}",
                self.normalization_factor
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Width of vectors produced by the hashing embedder.
    pub dimension: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self { Self { dimension: 256 } }
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
    fn bm25_settings_bounds() {
        assert!(Bm25Settings::default().validate().is_ok());
        assert!(Bm25Settings { k1: -1.0, ..Default::default() }.validate().is_err());
        assert!(Bm25Settings { b: 1.5, ..Default::default() }.validate().is_err());
        assert!(Bm25Settings { b: f64::NAN, ..Default::default() }.validate().is_err());
        assert!(Bm25Settings { normalization_factor: 0.0, ..Default::default() }.validate().is_err());
    }

    #[test]
    fn negative_rrf_constant_rejected() {
        let s = RetrievalSettings { k_rrf: -1.0, ..Default::default() };
        assert!(matches!(s.validate(), Err(Error::InvalidRrfConstant(_))));
        let s = RetrievalSettings { k_rrf: f32::NAN, ..Default::default() };
        assert!(s.validate().is_err());
    }

    #[test]
    fn plain_paths_pass_through_expansion() {
        assert_eq!(expand_path("docs/api"), PathBuf::from("docs/api"));
    }
}
