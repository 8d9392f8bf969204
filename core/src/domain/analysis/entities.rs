use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::domain::{
    analysis::value_objects::RequestContext,
    common::{
        StageSettings,
        entities::app_errors::{CoreError, ErrorKind},
    },
};

/// Binary attachment sent alongside a prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageAttachment {
    pub mime_type: String,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationOptions {
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub max_output_tokens: u32,
}

impl From<&StageSettings> for GenerationOptions {
    fn from(settings: &StageSettings) -> Self {
        Self {
            temperature: settings.temperature,
            top_p: settings.top_p,
            top_k: settings.top_k,
            max_output_tokens: settings.max_output_tokens,
        }
    }
}

/// One outbound call to the inference service.
#[derive(Debug, Clone, PartialEq)]
pub struct LLMRequest {
    pub prompt: String,
    pub attachment: Option<ImageAttachment>,
    pub generation: GenerationOptions,
}

/// On-disk envelope around a cached payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    #[serde(skip)]
    pub fingerprint: String,
    pub stored_at: DateTime<Utc>,
    pub result: Value,
    pub schema_version: String,
}

impl CacheEntry {
    pub fn new(fingerprint: &str, result: Value, schema_version: &str) -> Self {
        Self {
            fingerprint: fingerprint.to_string(),
            stored_at: Utc::now(),
            result,
            schema_version: schema_version.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_cache: Option<bool>,
    pub processing_time_ms: u64,
    pub request_id: String,
    pub cache_key: Option<String>,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl AnalysisMetadata {
    /// Metadata known before any stage has produced a result.
    pub fn for_request(context: &RequestContext) -> Self {
        Self {
            from_cache: None,
            processing_time_ms: context.elapsed_ms(),
            request_id: context.request_id.clone(),
            cache_key: None,
            timestamp: Utc::now(),
            model: None,
            user_id: None,
        }
    }
}

/// Successful result of one stage.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisOutcome {
    pub data: Value,
    pub metadata: AnalysisMetadata,
}

/// Failed stage, with the metadata gathered up to the failure.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisFailure {
    pub error: CoreError,
    pub metadata: AnalysisMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    #[serde(rename = "type")]
    pub error_type: String,
}

impl From<&CoreError> for ErrorBody {
    fn from(error: &CoreError) -> Self {
        Self {
            code: error.code().to_string(),
            message: error.to_string(),
            error_type: error.type_name().to_string(),
        }
    }
}

/// Envelope handed back to callers of the analysis stages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AnalysisResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
    pub metadata: AnalysisMetadata,
}

impl From<Result<AnalysisOutcome, AnalysisFailure>> for AnalysisResponse {
    fn from(result: Result<AnalysisOutcome, AnalysisFailure>) -> Self {
        match result {
            Ok(outcome) => Self {
                success: true,
                data: Some(outcome.data),
                error: None,
                metadata: outcome.metadata,
            },
            Err(failure) => Self {
                success: false,
                data: None,
                error: Some(ErrorBody::from(&failure.error)),
                metadata: failure.metadata,
            },
        }
    }
}

impl AnalysisOutcome {
    pub fn for_user(mut self, user_id: &str) -> Self {
        self.metadata.user_id = Some(user_id.to_string());
        self
    }
}

impl AnalysisFailure {
    pub fn kind(&self) -> ErrorKind {
        self.error.kind()
    }

    pub fn for_user(mut self, user_id: &str) -> Self {
        self.metadata.user_id = Some(user_id.to_string());
        self
    }
}
