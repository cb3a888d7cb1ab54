use serde::{Deserialize, Serialize};
use std::path::Path;
use crate::error::{Result, HonyakuError};

// Serde defaults for fields added after the first config format
fn default_sample_length() -> usize {
    1000
}

fn default_probe_timeout_secs() -> u64 {
    3
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub engine: EngineConfig,
    pub recognize: RecognizeConfig,
    pub detect: DetectConfig,
    pub translate: TranslateConfig,
    pub summarize: SummarizeConfig,
    pub speech: SpeechConfig,
    pub network: NetworkConfig,
    pub storage: StorageConfig,
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Model server endpoint URL
    pub endpoint: String,
    /// Language identification implementation: Local (on-device) or Remote
    pub language_id: LanguageIdMode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum LanguageIdMode {
    /// Local: identify language on-device without network access
    Local,
    /// Remote: identify language via the model server
    Remote,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognizeConfig {
    /// Timeout for a single recognition call (seconds)
    pub timeout_secs: u64,
    /// Maximum accepted image width/height in pixels
    pub max_dimension: u32,
    /// Recognized text longer than this is truncated
    pub max_text_length: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectConfig {
    /// Timeout for a single identification call (seconds)
    pub timeout_secs: u64,
    /// Minimum trimmed input length in characters
    pub min_text_length: usize,
    /// Maximum trimmed input length in characters
    pub max_text_length: usize,
    /// Only the first N characters are sent to the engine
    #[serde(default = "default_sample_length")]
    pub sample_length: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslateConfig {
    /// Timeout for each translated chunk (seconds)
    pub timeout_secs: u64,
    /// Maximum accepted input length in characters
    pub max_text_length: usize,
    /// Inputs longer than this are split at natural boundaries
    pub chunk_threshold: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummarizeConfig {
    /// Overall budget for one summarization (seconds)
    pub timeout_secs: u64,
    /// Minimum trimmed input length in characters
    pub min_text_length: usize,
    /// Maximum trimmed input length in characters
    pub max_text_length: usize,
    /// Language the extractive heuristics operate in; summaries for other
    /// targets are translated once after extraction
    pub working_language: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechConfig {
    /// Maximum utterance length in characters
    pub max_text_length: usize,
    /// Locale used when the requested one is unsupported
    pub fallback_locale: String,
    /// Default speech rate (1.0 = normal)
    pub default_rate: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Address probed to decide whether the device is online
    pub probe_address: String,
    /// Probe timeout (seconds)
    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path to the sqlite database file
    pub database_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Source language assumed when auto-detection cannot decide
    pub fallback_source_language: String,
    /// Target language used when the caller does not specify one
    pub default_target_language: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            engine: EngineConfig {
                endpoint: "http://localhost:8750".to_string(),
                language_id: LanguageIdMode::Local,
            },
            recognize: RecognizeConfig {
                timeout_secs: 30,
                max_dimension: 8192,
                max_text_length: 10_000,
            },
            detect: DetectConfig {
                timeout_secs: 15,
                min_text_length: 10,
                max_text_length: 10_000,
                sample_length: 1000,
            },
            translate: TranslateConfig {
                timeout_secs: 45,
                max_text_length: 10_000,
                chunk_threshold: 4000,
            },
            summarize: SummarizeConfig {
                timeout_secs: 30,
                min_text_length: 100,
                max_text_length: 10_000,
                working_language: "en".to_string(),
            },
            speech: SpeechConfig {
                max_text_length: 4000,
                fallback_locale: "en-US".to_string(),
                default_rate: 1.0,
            },
            network: NetworkConfig {
                probe_address: "1.1.1.1:53".to_string(),
                probe_timeout_secs: 3,
            },
            storage: StorageConfig {
                database_path: ".honyaku/honyaku.db".to_string(),
            },
            pipeline: PipelineConfig {
                fallback_source_language: "en".to_string(),
                default_target_language: "vi".to_string(),
            },
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| HonyakuError::Config(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| HonyakuError::Config(format!("Failed to parse config file: {}", e)))
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| HonyakuError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| HonyakuError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }
}
