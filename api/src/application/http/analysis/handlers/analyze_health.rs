use axum::{
    Extension,
    extract::{Multipart, State},
    http::HeaderMap,
};
use nutriscan_core::domain::analysis::{
    entities::{AnalysisFailure, AnalysisResponse},
    ports::AnalysisService,
    value_objects::RequestContext,
};

use crate::application::{
    http::{
        analysis::upload::read_image_upload,
        server::{
            api_entities::{api_error::ApiError, response::Response},
            app_state::AppState,
        },
    },
    request_context::user_id,
};

#[utoipa::path(
    post,
    path = "/analyze",
    tag = "analysis",
    summary = "Assess a product against the user's health profile",
    description = "Extracts food data from the multipart field `image`, then rates its suitability for the conditions stored for the user named by `x-user-id`.",
    responses(
        (status = 200, body = AnalysisResponse),
        (status = 400, description = "Invalid or missing upload", body = AnalysisResponse),
        (status = 401, description = "Missing user id", body = AnalysisResponse),
        (status = 502, description = "Inference service failure", body = AnalysisResponse),
        (status = 503, description = "Profile store unavailable", body = AnalysisResponse),
    ),
    params(
        ("x-user-id" = String, Header, description = "User whose health profile is used"),
        ("x-request-id" = Option<String>, Header, description = "Correlation id"),
    ),
)]
pub async fn analyze_health(
    State(state): State<AppState>,
    Extension(context): Extension<RequestContext>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<Response<AnalysisResponse>, ApiError> {
    let user_id = user_id(&headers).ok_or_else(|| {
        ApiError::Unauthorized(context.clone(), "User authentication required".to_string())
    })?;

    let upload = read_image_upload(multipart, &state.args.storage.upload_dir, &context).await?;

    let outcome = state
        .service
        .analyze_health_suitability(context, user_id, upload)
        .await?;

    Ok(Response::OK(AnalysisResponse::from(Ok::<_, AnalysisFailure>(outcome))))
}
