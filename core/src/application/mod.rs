use tracing::info;

use crate::{
    domain::common::{NutriscanConfig, entities::app_errors::CoreError, services::Service},
    infrastructure::{
        cache::FsResultStore, health_profile::FileHealthProfileRepository, llm::GeminiLLMClient,
    },
};

pub type NutriscanService =
    Service<GeminiLLMClient, FsResultStore, FileHealthProfileRepository>;

pub async fn create_service(config: NutriscanConfig) -> Result<NutriscanService, CoreError> {
    if config.llm.gemini_api_key.trim().is_empty() {
        return Err(CoreError::Processing {
            code: "MISSING_API_KEY",
            message: "GEMINI_API_KEY must be set".to_string(),
        });
    }

    tokio::fs::create_dir_all(&config.upload.upload_dir)
        .await
        .map_err(|e| CoreError::Processing {
            code: "UPLOAD_DIR_UNAVAILABLE",
            message: format!(
                "failed to create upload directory {}: {e}",
                config.upload.upload_dir.display()
            ),
        })?;

    let llm_client = GeminiLLMClient::new(&config.llm);
    let food_store = FsResultStore::for_stage(&config.cache, &config.food_stage);
    let health_store = FsResultStore::for_stage(&config.cache, &config.health_stage);
    let health_profile_repository = FileHealthProfileRepository::new(&config.profiles);

    info!(
        model = %config.llm.gemini_model,
        food_cache = %food_store.dir().display(),
        health_cache = %health_store.dir().display(),
        "Analysis service initialized"
    );

    Ok(Service::new(
        llm_client,
        food_store,
        health_store,
        health_profile_repository,
        config.upload,
        &config.food_stage,
        &config.health_stage,
    ))
}
