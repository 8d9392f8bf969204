use std::future::Future;

use serde_json::Value;

use crate::domain::{
    analysis::{
        entities::{AnalysisFailure, AnalysisOutcome, LLMRequest},
        value_objects::{RequestContext, UploadedImage},
    },
    common::entities::app_errors::CoreError,
};

/// LLM Client trait for calling AI models
#[cfg_attr(test, mockall::automock)]
pub trait LLMClient: Send + Sync {
    /// Sends one prompt, with an optional image, and returns the raw text
    /// produced by the model.
    fn generate(&self, request: LLMRequest) -> impl Future<Output = Result<String, CoreError>> + Send;

    fn model_name(&self) -> String;
}

/// Fingerprint-keyed store of previously computed stage payloads.
///
/// Lookups never fail: missing, expired and unreadable entries all read as
/// absent. Writes are best effort and never surface an error.
#[cfg_attr(test, mockall::automock)]
pub trait ResultStore: Send + Sync {
    fn get(&self, fingerprint: &str) -> impl Future<Output = Option<Value>> + Send;

    fn put(&self, fingerprint: &str, payload: &Value) -> impl Future<Output = ()> + Send;
}

/// Service trait for the two chained analysis stages
pub trait AnalysisService: Send + Sync {
    /// Stage 1: extracts structured food data from a packaging photo.
    fn analyze_food_image(
        &self,
        context: RequestContext,
        upload: Option<UploadedImage>,
    ) -> impl Future<Output = Result<AnalysisOutcome, AnalysisFailure>> + Send;

    /// Stage 1 followed by stage 2 against the user's stored conditions.
    fn analyze_health_suitability(
        &self,
        context: RequestContext,
        user_id: String,
        upload: Option<UploadedImage>,
    ) -> impl Future<Output = Result<AnalysisOutcome, AnalysisFailure>> + Send;
}
