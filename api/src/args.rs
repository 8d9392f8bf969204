use std::{path::PathBuf, time::Duration};

use clap::{Args as ClapArgs, Parser};
use nutriscan_core::{
    domain::common::{
        CacheConfig, LLMConfig, NutriscanConfig, ProfileStoreConfig, StageSettings, UploadConfig,
    },
    infrastructure::llm::gemini_client::DEFAULT_GEMINI_BASE_URL,
};

#[derive(Debug, Clone, Parser)]
#[command(name = "nutriscan", version, about = "Food label analysis API")]
pub struct Args {
    #[command(flatten)]
    pub server: ServerArgs,

    #[command(flatten)]
    pub llm: LlmArgs,

    #[command(flatten)]
    pub storage: StorageArgs,

    #[command(flatten)]
    pub log: LogArgs,
}

#[derive(Debug, Clone, ClapArgs)]
pub struct ServerArgs {
    #[arg(long = "server-host", env = "SERVER_HOST", default_value = "0.0.0.0")]
    pub host: String,

    #[arg(long = "server-port", env = "SERVER_PORT", default_value_t = 3333)]
    pub port: u16,

    #[arg(
        long = "allowed-origins",
        env = "ALLOWED_ORIGINS",
        value_delimiter = ',',
        default_value = "http://localhost:3000"
    )]
    pub allowed_origins: Vec<String>,

    #[arg(long = "server-root-path", env = "SERVER_ROOT_PATH", default_value = "")]
    pub root_path: String,
}

#[derive(Debug, Clone, ClapArgs)]
pub struct LlmArgs {
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub gemini_api_key: String,

    #[arg(long, env = "GEMINI_MODEL", default_value = "gemini-1.5-flash")]
    pub gemini_model: String,

    #[arg(long, env = "GEMINI_BASE_URL", default_value = DEFAULT_GEMINI_BASE_URL)]
    pub gemini_base_url: String,
}

#[derive(Debug, Clone, ClapArgs)]
pub struct StorageArgs {
    #[arg(long, env = "CACHE_DIR", default_value = ".cache")]
    pub cache_dir: PathBuf,

    #[arg(long, env = "CACHE_TTL_SECS", default_value_t = 24 * 60 * 60)]
    pub cache_ttl_secs: u64,

    #[arg(long, env = "UPLOAD_DIR", default_value = "public/temp")]
    pub upload_dir: PathBuf,

    #[arg(long, env = "MAX_UPLOAD_BYTES", default_value_t = 10 * 1024 * 1024)]
    pub max_upload_bytes: u64,

    #[arg(long, env = "PROFILE_DIR", default_value = "data/profiles")]
    pub profile_dir: PathBuf,
}

#[derive(Debug, Clone, ClapArgs)]
pub struct LogArgs {
    /// Emit logs as JSON lines.
    #[arg(long, env = "LOG_JSON", default_value_t = false)]
    pub log_json: bool,

    /// Filter used when `RUST_LOG` is not set.
    #[arg(long, default_value = "info")]
    pub log_filter: String,
}

impl From<Args> for NutriscanConfig {
    fn from(args: Args) -> Self {
        Self {
            llm: LLMConfig {
                gemini_api_key: args.llm.gemini_api_key,
                gemini_model: args.llm.gemini_model,
                gemini_base_url: args.llm.gemini_base_url,
            },
            cache: CacheConfig {
                root_dir: args.storage.cache_dir,
                ttl: Duration::from_secs(args.storage.cache_ttl_secs),
            },
            upload: UploadConfig {
                upload_dir: args.storage.upload_dir,
                max_file_size: args.storage.max_upload_bytes,
            },
            profiles: ProfileStoreConfig {
                profile_dir: args.storage.profile_dir,
            },
            food_stage: StageSettings::food_extraction(),
            health_stage: StageSettings::health_analysis(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_map_to_config() {
        let args = Args::parse_from(["nutriscan", "--gemini-api-key", "key"]);
        let config = NutriscanConfig::from(args);

        assert_eq!(config.llm.gemini_api_key, "key");
        assert_eq!(config.cache.ttl, Duration::from_secs(86400));
        assert_eq!(config.upload.max_file_size, 10 * 1024 * 1024);
        assert_eq!(config.health_stage.max_retries, 3);
        assert_eq!(config.food_stage.schema_version, "1.0");
    }

    #[test]
    fn test_allowed_origins_are_split() {
        let args = Args::parse_from([
            "nutriscan",
            "--gemini-api-key",
            "key",
            "--allowed-origins",
            "http://a.test,http://b.test",
        ]);
        assert_eq!(args.server.allowed_origins.len(), 2);
    }
}
