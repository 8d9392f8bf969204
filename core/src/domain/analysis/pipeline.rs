use serde_json::Value;
use tracing::{debug, info, instrument};

use crate::domain::{
    analysis::{
        entities::{GenerationOptions, ImageAttachment, LLMRequest},
        extractor::extract_json,
        invoker::RetryingInvoker,
        merger::{ensure_required, merge},
        ports::{LLMClient, ResultStore},
        schema::PayloadSchema,
    },
    common::{StageSettings, entities::app_errors::CoreError},
};

#[derive(Debug, Clone, PartialEq)]
pub struct StageResult {
    pub payload: Value,
    pub from_cache: bool,
}

/// One analysis stage: cache lookup, model invocation, extraction, schema
/// merge and cache store, all keyed by a precomputed fingerprint.
pub struct AnalysisStage<RS> {
    name: &'static str,
    store: RS,
    invoker: RetryingInvoker,
    schema: PayloadSchema,
    generation: GenerationOptions,
}

impl<RS: ResultStore> AnalysisStage<RS> {
    pub fn new(
        name: &'static str,
        store: RS,
        settings: &StageSettings,
        schema: PayloadSchema,
    ) -> Self {
        Self {
            name,
            store,
            invoker: RetryingInvoker::from_settings(settings),
            schema,
            generation: GenerationOptions::from(settings),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn schema(&self) -> &PayloadSchema {
        &self.schema
    }

    /// Returns the cached payload for `fingerprint`, or computes, stores and
    /// returns a fresh one. `prompt` is only built on a cache miss.
    #[instrument(skip(self, llm, prompt, attachment), fields(stage = self.name))]
    pub async fn run<LLM, P>(
        &self,
        llm: &LLM,
        fingerprint: &str,
        prompt: P,
        attachment: Option<ImageAttachment>,
    ) -> Result<StageResult, CoreError>
    where
        LLM: LLMClient,
        P: FnOnce() -> String + Send,
    {
        if let Some(payload) = self.store.get(fingerprint).await {
            debug!(cache_key = %fingerprint, "Cache hit");
            return Ok(StageResult {
                payload,
                from_cache: true,
            });
        }

        info!(cache_key = %fingerprint, "Cache miss, invoking model");

        let request = LLMRequest {
            prompt: prompt(),
            attachment,
            generation: self.generation.clone(),
        };

        let raw = self
            .invoker
            .invoke(self.name, || llm.generate(request.clone()))
            .await?;

        let extracted = extract_json(&raw)?;
        ensure_required(&extracted, &self.schema)?;
        let payload = merge(&extracted, &self.schema);

        self.store.put(fingerprint, &payload).await;

        Ok(StageResult {
            payload,
            from_cache: false,
        })
    }
}
