//! Configuration loader, typed settings and path helpers.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + `APP_*` env vars
//! (`__` separates nested keys, e.g. `APP_RETRIEVAL__TOP_K=8`). Every setting
//! has a default, so an empty configuration is valid.

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

use crate::chunker::ChunkingConfig;
use crate::error::Error;

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::new().merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment };
        config.validate_for_env(&env_name)?;
        Ok(config)
    }

    /// Build from an inline TOML document; used by tests and embedders.
    pub fn from_toml_str(toml: &str) -> anyhow::Result<Self> {
        let config = Self { figment: Figment::new().merge(Toml::string(toml)) };
        config.settings()?;
        Ok(config)
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    pub fn settings(&self) -> anyhow::Result<Settings> {
        let settings: Settings = self
            .figment
            .extract()
            .map_err(|e| anyhow::anyhow!("Failed to read settings: {}", e))?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate_for_env(&self, env: &str) -> anyhow::Result<()> {
        let settings = self.settings()?;
        if matches!(env, "prod" | "production") {
            for flag in ["APP_USE_FAKE_EMBEDDINGS", "APP_USE_FAKE_GENERATOR"] {
                if env::var(flag).is_ok_and(|v| v == "1" || v.eq_ignore_ascii_case("true")) {
                    return Err(Error::InvalidConfig(format!("{flag} is not allowed in production")).into());
                }
            }
            if settings.reranker.backend == RerankerBackend::Lexical {
                tracing::warn!("production config uses the lexical reranker");
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub chunking: ChunkingConfig,
    pub retrieval: RetrievalSettings,
    pub context: ContextSettings,
    pub embedding: EmbeddingSettings,
    pub reranker: RerankerSettings,
    pub generation: GenerationSettings,
}

impl Settings {
    pub fn validate(&self) -> crate::error::Result<()> {
        self.chunking.validate()?;
        if self.retrieval.embed_batch_size == 0 {
            return Err(Error::InvalidConfig("retrieval.embed_batch_size must be greater than 0".to_string()));
        }
        if self.context.snippet_chars == 0 {
            return Err(Error::InvalidConfig("context.snippet_chars must be greater than 0".to_string()));
        }
        Ok(())
    }
}

/// Distance used by the first-stage index. Smaller is always closer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    /// Squared Euclidean distance.
    #[default]
    L2,
    /// `1 - cosine_similarity`.
    Cosine,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    pub top_k: usize,
    pub rerank_top_n: usize,
    pub metric: Metric,
    pub embed_batch_size: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self { Self { top_k: 5, rerank_top_n: 3, metric: Metric::L2, embed_batch_size: 32 } }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextSettings {
    pub max_prompt_tokens: usize,
    pub snippet_chars: usize,
    pub separator: String,
}

impl Default for ContextSettings {
    fn default() -> Self { Self { max_prompt_tokens: 400, snippet_chars: 200, separator: "\n".to_string() } }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Local,
    Remote,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub backend: BackendKind,
    pub model_dir: Option<String>,
    pub max_len: usize,
    pub api_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub dim: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            backend: BackendKind::Local,
            model_dir: None,
            max_len: 256,
            api_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            api_key: None,
            model: "embedding-001".to_string(),
            dim: 768,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum RerankerBackend {
    #[default]
    CrossEncoder,
    Lexical,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RerankerSettings {
    pub backend: RerankerBackend,
    pub model_dir: Option<String>,
    pub max_len: usize,
}

impl Default for RerankerSettings {
    fn default() -> Self { Self { backend: RerankerBackend::CrossEncoder, model_dir: None, max_len: 512 } }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    pub backend: BackendKind,
    pub model_dir: Option<String>,
    pub max_new_tokens: usize,
    pub do_sample: bool,
    pub temperature: f64,
    pub top_p: Option<f64>,
    pub seed: u64,
    pub timeout_secs: u64,
    pub api_url: String,
    pub api_key: Option<String>,
    pub model: String,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            backend: BackendKind::Local,
            model_dir: None,
            max_new_tokens: 200,
            do_sample: false,
            temperature: 0.7,
            top_p: None,
            seed: 299_792_458,
            timeout_secs: 120,
            api_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            api_key: None,
            model: "gemini-1.5-pro-latest".to_string(),
        }
    }
}

impl GenerationSettings {
    pub fn params(&self) -> crate::traits::GenerationParams {
        crate::traits::GenerationParams {
            max_new_tokens: self.max_new_tokens,
            do_sample: self.do_sample,
            temperature: self.temperature,
            top_p: self.top_p,
            seed: self.seed,
        }
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
