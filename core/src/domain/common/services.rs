use crate::domain::{
    analysis::{
        pipeline::AnalysisStage,
        ports::{LLMClient, ResultStore},
        schema::{food_data_schema, health_report_schema},
    },
    common::{StageSettings, UploadConfig},
    health_profile::ports::HealthProfileRepository,
};

/// Application service wiring the analysis stages to their collaborators.
///
/// Every collaborator is injected, so tests substitute mocks for the model
/// client, the result stores and the profile store.
pub struct Service<LLM, RS, HP>
where
    LLM: LLMClient,
    RS: ResultStore,
    HP: HealthProfileRepository,
{
    pub(crate) llm_client: LLM,
    pub(crate) food_stage: AnalysisStage<RS>,
    pub(crate) health_stage: AnalysisStage<RS>,
    pub(crate) health_profile_repository: HP,
    pub(crate) upload_config: UploadConfig,
}

impl<LLM, RS, HP> Service<LLM, RS, HP>
where
    LLM: LLMClient,
    RS: ResultStore,
    HP: HealthProfileRepository,
{
    pub fn new(
        llm_client: LLM,
        food_store: RS,
        health_store: RS,
        health_profile_repository: HP,
        upload_config: UploadConfig,
        food_settings: &StageSettings,
        health_settings: &StageSettings,
    ) -> Self {
        Self {
            llm_client,
            food_stage: AnalysisStage::new(
                "food extraction",
                food_store,
                food_settings,
                food_data_schema(),
            ),
            health_stage: AnalysisStage::new(
                "health analysis",
                health_store,
                health_settings,
                health_report_schema(),
            ),
            health_profile_repository,
            upload_config,
        }
    }
}
