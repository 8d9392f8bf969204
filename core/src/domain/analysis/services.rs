use serde_json::Value;
use tracing::{error, info, instrument, warn};

use crate::domain::{
    analysis::{
        entities::{AnalysisFailure, AnalysisMetadata, AnalysisOutcome, ImageAttachment},
        fingerprint::{fingerprint, fingerprint_bytes},
        pipeline::StageResult,
        ports::{AnalysisService, LLMClient, ResultStore},
        prompts::{FOOD_EXTRACTION_PROMPT, build_health_prompt},
        schema::{default_food_data, no_health_data_result},
        temp_file::TempFileGuard,
        validation::{file_extension, mime_for_extension, validate_upload},
        value_objects::{FoodFingerprint, HealthFingerprint, RequestContext, UploadedImage},
    },
    common::{entities::app_errors::CoreError, services::Service},
    health_profile::{entities::HealthCondition, ports::HealthProfileRepository},
};

impl<LLM, RS, HP> Service<LLM, RS, HP>
where
    LLM: LLMClient,
    RS: ResultStore,
    HP: HealthProfileRepository,
{
    fn metadata(
        &self,
        context: &RequestContext,
        from_cache: Option<bool>,
        cache_key: Option<String>,
    ) -> AnalysisMetadata {
        AnalysisMetadata {
            from_cache,
            cache_key,
            model: Some(self.llm_client.model_name()),
            ..AnalysisMetadata::for_request(context)
        }
    }

    fn failure(
        &self,
        context: &RequestContext,
        error: CoreError,
        cache_key: Option<String>,
    ) -> AnalysisFailure {
        error!(
            request_id = %context.request_id,
            code = error.code(),
            error = %error,
            processing_time_ms = context.elapsed_ms(),
            "Analysis failed"
        );
        AnalysisFailure {
            metadata: self.metadata(context, None, cache_key),
            error,
        }
    }

    /// Validates and fingerprints the upload, then runs the extraction stage.
    /// Model or parsing failures degrade to the null-filled default payload,
    /// which is returned but never cached.
    async fn extract_food_data(
        &self,
        context: &RequestContext,
        upload: Option<&UploadedImage>,
    ) -> Result<(StageResult, String), CoreError> {
        let upload = validate_upload(upload, &self.upload_config)?;
        info!(
            request_id = %context.request_id,
            file = %upload.original_name,
            "File validation passed"
        );

        let image = tokio::fs::read(&upload.path)
            .await
            .map_err(|e| CoreError::Processing {
                code: "FILE_READ_ERROR",
                message: format!("Failed to read uploaded file: {e}"),
            })?;
        let cache_key = fingerprint_bytes(&image);

        let mime_type = mime_for_extension(&file_extension(&upload.original_name))
            .unwrap_or("image/jpeg")
            .to_string();
        let attachment = ImageAttachment {
            mime_type,
            data: image,
        };

        let result = match self
            .food_stage
            .run(
                &self.llm_client,
                &cache_key,
                || FOOD_EXTRACTION_PROMPT.to_string(),
                Some(attachment),
            )
            .await
        {
            Ok(result) => result,
            Err(e) => {
                warn!(
                    request_id = %context.request_id,
                    code = e.code(),
                    error = %e,
                    "All food extraction attempts failed, returning default data"
                );
                StageResult {
                    payload: default_food_data(),
                    from_cache: false,
                }
            }
        };

        Ok((result, cache_key))
    }

    /// Runs the health stage for already extracted food data.
    #[instrument(skip(self, context, food_data, conditions), fields(request_id = %context.request_id))]
    pub async fn assess_food_data(
        &self,
        context: &RequestContext,
        food_data: &Value,
        conditions: &[HealthCondition],
    ) -> Result<AnalysisOutcome, AnalysisFailure> {
        if conditions.is_empty() {
            info!("No health conditions recorded, skipping health analysis");
            return Ok(AnalysisOutcome {
                data: no_health_data_result(food_data),
                metadata: self.metadata(context, Some(false), None),
            });
        }

        let cache_key = fingerprint(&HealthFingerprint {
            food_data: FoodFingerprint::from_food_data(food_data),
            conditions: conditions.iter().map(HealthCondition::key).collect(),
        })
        .map_err(|e| {
            self.failure(
                context,
                CoreError::Processing {
                    code: "FINGERPRINT_ERROR",
                    message: format!("Failed to fingerprint health request: {e}"),
                },
                None,
            )
        })?;

        let result = self
            .health_stage
            .run(
                &self.llm_client,
                &cache_key,
                || build_health_prompt(food_data, conditions),
                None,
            )
            .await
            .map_err(|e| self.failure(context, e, Some(cache_key.clone())))?;

        let mut data = result.payload;
        if let Some(report) = data.as_object_mut() {
            report.insert("foodData".to_string(), food_data.clone());
            report.insert(
                "userConditions".to_string(),
                serde_json::to_value(
                    conditions
                        .iter()
                        .map(HealthCondition::summary)
                        .collect::<Vec<_>>(),
                )
                .unwrap_or_default(),
            );
        }

        info!(
            from_cache = result.from_cache,
            processing_time_ms = context.elapsed_ms(),
            "Health analysis completed"
        );

        Ok(AnalysisOutcome {
            data,
            metadata: self.metadata(context, Some(result.from_cache), Some(cache_key)),
        })
    }
}

impl<LLM, RS, HP> AnalysisService for Service<LLM, RS, HP>
where
    LLM: LLMClient,
    RS: ResultStore,
    HP: HealthProfileRepository,
{
    #[instrument(skip(self, context, upload), fields(request_id = %context.request_id))]
    async fn analyze_food_image(
        &self,
        context: RequestContext,
        upload: Option<UploadedImage>,
    ) -> Result<AnalysisOutcome, AnalysisFailure> {
        let _cleanup = upload.as_ref().map(|u| TempFileGuard::new(&u.path));
        info!("Processing image data started");

        match self.extract_food_data(&context, upload.as_ref()).await {
            Ok((result, cache_key)) => {
                info!(
                    cache_key = %cache_key,
                    from_cache = result.from_cache,
                    processing_time_ms = context.elapsed_ms(),
                    "Food extraction completed"
                );
                Ok(AnalysisOutcome {
                    data: result.payload,
                    metadata: self.metadata(&context, Some(result.from_cache), Some(cache_key)),
                })
            }
            Err(e) => Err(self.failure(&context, e, None)),
        }
    }

    #[instrument(skip(self, context, upload), fields(request_id = %context.request_id))]
    async fn analyze_health_suitability(
        &self,
        context: RequestContext,
        user_id: String,
        upload: Option<UploadedImage>,
    ) -> Result<AnalysisOutcome, AnalysisFailure> {
        let food = self
            .analyze_food_image(context.clone(), upload)
            .await
            .map_err(|failure| failure.for_user(&user_id))?;

        let conditions = self
            .health_profile_repository
            .get_health_conditions(&user_id)
            .await
            .map_err(|e| self.failure(&context, e, None).for_user(&user_id))?;
        info!(count = conditions.len(), "Fetched health conditions");

        self.assess_food_data(&context, &food.data, &conditions)
            .await
            .map(|outcome| outcome.for_user(&user_id))
            .map_err(|failure| failure.for_user(&user_id))
    }
}
