use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use uuid::{NoContext, Timestamp, Uuid};

pub mod entities;
pub mod services;

#[derive(Clone, Debug)]
pub struct NutriscanConfig {
    pub llm: LLMConfig,
    pub cache: CacheConfig,
    pub upload: UploadConfig,
    pub profiles: ProfileStoreConfig,
    pub food_stage: StageSettings,
    pub health_stage: StageSettings,
}

#[derive(Clone, Debug)]
pub struct LLMConfig {
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub gemini_base_url: String,
}

#[derive(Clone, Debug)]
pub struct CacheConfig {
    pub root_dir: PathBuf,
    pub ttl: Duration,
}

#[derive(Clone, Debug)]
pub struct UploadConfig {
    pub upload_dir: PathBuf,
    pub max_file_size: u64,
}

#[derive(Clone, Debug)]
pub struct ProfileStoreConfig {
    pub profile_dir: PathBuf,
}

/// Per-stage invocation and generation settings.
#[derive(Clone, Debug, PartialEq)]
pub struct StageSettings {
    pub timeout: Duration,
    pub max_retries: u32,
    pub base_delay: Duration,
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub max_output_tokens: u32,
    /// Sub-directory of the cache root, `None` stores at the root itself.
    pub cache_namespace: Option<String>,
    pub schema_version: String,
}

impl StageSettings {
    pub fn food_extraction() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_retries: 5,
            base_delay: Duration::from_millis(1000),
            temperature: 0.3,
            top_p: 0.8,
            top_k: 40,
            max_output_tokens: 4096,
            cache_namespace: None,
            schema_version: "1.0".to_string(),
        }
    }

    pub fn health_analysis() -> Self {
        Self {
            timeout: Duration::from_secs(90),
            max_retries: 3,
            base_delay: Duration::from_millis(1000),
            temperature: 0.1,
            top_p: 0.8,
            top_k: 40,
            max_output_tokens: 8192,
            cache_namespace: Some("health".to_string()),
            schema_version: "2.0".to_string(),
        }
    }

    pub fn cache_dir(&self, root: &std::path::Path) -> PathBuf {
        match &self.cache_namespace {
            Some(namespace) => root.join(namespace),
            None => root.to_path_buf(),
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("public/temp"),
            max_file_size: 10 * 1024 * 1024,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from(".cache"),
            ttl: Duration::from_secs(24 * 60 * 60),
        }
    }
}

pub fn generate_timestamp() -> (DateTime<Utc>, Timestamp) {
    let now = Utc::now();
    let seconds = now.timestamp().try_into().unwrap_or(0);
    let timestamp = Timestamp::from_unix(NoContext, seconds, now.timestamp_subsec_nanos());

    (now, timestamp)
}

pub fn generate_uuid_v7() -> Uuid {
    let (_, timestamp) = generate_timestamp();
    Uuid::new_v7(timestamp)
}
