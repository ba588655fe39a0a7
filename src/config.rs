//! Configuration for the ingestion and QA pipeline.
//!
//! Loaded from TOML the way `echovault-core` loads its own configuration
//! files; the host is expected to deserialize this once at startup and pass
//! it (or the pieces it needs) into the pipeline components.

use serde::{Deserialize, Serialize};

/// Top-level configuration for a `ragcore` deployment.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RagcoreConfig {
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub development: DevelopmentFlags,
}

impl Default for RagcoreConfig {
    fn default() -> Self {
        Self {
            chunking: ChunkingConfig::default(),
            store: StoreConfig::default(),
            embedding: EmbeddingConfig::default(),
            llm: LlmConfig::default(),
            development: DevelopmentFlags::default(),
        }
    }
}

impl RagcoreConfig {
    /// Parse configuration from a TOML document.
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }
}

/// Chunker tunables, per spec.md §4.C.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChunkingConfig {
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,
    #[serde(default = "default_overlap")]
    pub overlap_tokens: usize,
    #[serde(default = "default_min_fragment_chars")]
    pub min_fragment_chars: usize,
}

fn default_max_tokens() -> usize {
    400
}
fn default_overlap() -> usize {
    50
}
fn default_min_fragment_chars() -> usize {
    10
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_tokens: default_max_tokens(),
            overlap_tokens: default_overlap(),
            min_fragment_chars: default_min_fragment_chars(),
        }
    }
}

/// Store connection-pool sizing, per spec.md §5 "Shared resources".
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_database_path")]
    pub database_path: String,
    #[serde(default = "default_pool_open")]
    pub pool_open: usize,
    #[serde(default = "default_pool_idle")]
    pub pool_idle: usize,
    #[serde(default = "default_pool_lifetime_secs")]
    pub pool_max_lifetime_secs: u64,
}

fn default_database_path() -> String {
    "ragcore.sqlite3".to_string()
}
fn default_pool_open() -> usize {
    25
}
fn default_pool_idle() -> usize {
    10
}
fn default_pool_lifetime_secs() -> u64 {
    300
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_path: "ragcore.sqlite3".to_string(),
            pool_open: default_pool_open(),
            pool_idle: default_pool_idle(),
            pool_max_lifetime_secs: default_pool_lifetime_secs(),
        }
    }
}

/// Embedding provider selection and timeout, per spec.md §4.D and §5.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default = "default_embedding_model")]
    pub model: String,
    #[serde(default = "default_embedding_dim")]
    pub dim: u32,
    #[serde(default = "default_embedding_version")]
    pub version: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    pub endpoint: Option<String>,
    pub api_key_env: Option<String>,
}

fn default_embedding_model() -> String {
    "text-embedding-reference".to_string()
}
fn default_embedding_dim() -> u32 {
    1536
}
fn default_embedding_version() -> u32 {
    1
}
fn default_timeout_secs() -> u64 {
    30
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: default_embedding_model(),
            dim: default_embedding_dim(),
            version: default_embedding_version(),
            timeout_secs: default_timeout_secs(),
            endpoint: None,
            api_key_env: None,
        }
    }
}

/// Which LLM adaptor to use for answer extraction, per spec.md §4.G.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LlmProviderKind {
    ClaudeStyle,
    OpenAiStyle,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_llm_provider")]
    pub provider: LlmProviderKind,
    #[serde(default = "default_llm_model")]
    pub model: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    pub endpoint: Option<String>,
    pub api_key_env: Option<String>,
}

fn default_llm_provider() -> LlmProviderKind {
    LlmProviderKind::ClaudeStyle
}
fn default_llm_model() -> String {
    "reference-llm".to_string()
}
fn default_max_output_tokens() -> u32 {
    500
}
fn default_temperature() -> f32 {
    0.1
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_llm_provider(),
            model: default_llm_model(),
            timeout_secs: default_timeout_secs(),
            max_output_tokens: default_max_output_tokens(),
            temperature: default_temperature(),
            endpoint: None,
            api_key_env: None,
        }
    }
}

/// Development-only escape hatches. Never consulted in a production profile.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DevelopmentFlags {
    /// Allow the [`crate::embedder::MockEmbedder`] fallback when the
    /// provider is unreachable, per spec.md §9 "Mock embeddings in production".
    #[serde(default)]
    pub allow_mock_embeddings: bool,
}
