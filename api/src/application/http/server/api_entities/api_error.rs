use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use nutriscan_core::domain::{
    analysis::{
        entities::{AnalysisFailure, AnalysisMetadata, AnalysisOutcome, AnalysisResponse, ErrorBody},
        value_objects::RequestContext,
    },
    common::entities::app_errors::ErrorKind,
};
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{1}")]
    BadRequest(RequestContext, String),

    #[error("{1}")]
    Unauthorized(RequestContext, String),

    #[error("{1}")]
    InternalServerError(RequestContext, String),

    /// A stage failed; the body carries the error code and request metadata.
    #[error("{}", .0.error)]
    Analysis(Box<AnalysisFailure>),
}

pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::UpstreamService => StatusCode::BAD_GATEWAY,
        ErrorKind::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<AnalysisFailure> for ApiError {
    fn from(failure: AnalysisFailure) -> Self {
        ApiError::Analysis(Box::new(failure))
    }
}

/// Failure envelope for errors raised before a stage runs.
fn request_failure(
    context: &RequestContext,
    code: &str,
    error_type: &str,
    message: String,
) -> AnalysisResponse {
    AnalysisResponse {
        success: false,
        data: None,
        error: Some(ErrorBody {
            code: code.to_string(),
            message,
            error_type: error_type.to_string(),
        }),
        metadata: AnalysisMetadata::for_request(context),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(context, message) => (
                StatusCode::BAD_REQUEST,
                Json(request_failure(
                    &context,
                    "BAD_REQUEST",
                    "ValidationError",
                    message,
                )),
            )
                .into_response(),
            ApiError::Unauthorized(context, message) => (
                StatusCode::UNAUTHORIZED,
                Json(request_failure(
                    &context,
                    "UNAUTHORIZED",
                    "AuthenticationError",
                    message,
                )),
            )
                .into_response(),
            ApiError::InternalServerError(context, message) => {
                error!(request_id = %context.request_id, "Internal server error: {}", message);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(request_failure(
                        &context,
                        "INTERNAL_ERROR",
                        "ProcessingError",
                        message,
                    )),
                )
                    .into_response()
            }
            ApiError::Analysis(failure) => {
                let status = status_for(failure.kind());
                let body = AnalysisResponse::from(Err::<AnalysisOutcome, _>(*failure));
                (status, Json(body)).into_response()
            }
        }
    }
}
