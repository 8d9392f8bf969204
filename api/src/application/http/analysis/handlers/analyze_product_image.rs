use axum::{
    Extension,
    extract::{Multipart, State},
};
use nutriscan_core::domain::analysis::{
    entities::{AnalysisFailure, AnalysisResponse},
    ports::AnalysisService,
    value_objects::RequestContext,
};

use crate::application::http::{
    analysis::upload::read_image_upload,
    server::{
        api_entities::{api_error::ApiError, response::Response},
        app_state::AppState,
    },
};

#[utoipa::path(
    post,
    path = "/analyze",
    tag = "analysis",
    summary = "Extract food data from a product photo",
    description = "Reads nutrition facts, ingredients and allergens from a packaging photo sent as the multipart field `image`. Identical images are answered from cache.",
    responses(
        (status = 200, body = AnalysisResponse),
        (status = 400, description = "Invalid or missing upload", body = AnalysisResponse),
        (status = 502, description = "Inference service failure", body = AnalysisResponse),
    ),
    params(
        ("x-request-id" = Option<String>, Header, description = "Correlation id"),
    ),
)]
pub async fn analyze_product_image(
    State(state): State<AppState>,
    Extension(context): Extension<RequestContext>,
    multipart: Multipart,
) -> Result<Response<AnalysisResponse>, ApiError> {
    let upload = read_image_upload(multipart, &state.args.storage.upload_dir, &context).await?;

    let outcome = state.service.analyze_food_image(context, upload).await?;

    Ok(Response::OK(AnalysisResponse::from(Ok::<_, AnalysisFailure>(outcome))))
}
