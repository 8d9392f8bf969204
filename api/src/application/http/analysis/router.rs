use super::handlers::{
    analyze_health::{__path_analyze_health, analyze_health},
    analyze_product_image::{__path_analyze_product_image, analyze_product_image},
};
use crate::application::http::server::app_state::AppState;
use axum::{Router, routing::post};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(paths(analyze_product_image))]
pub struct ProductAnalysisApiDoc;

#[derive(OpenApi)]
#[openapi(paths(analyze_health))]
pub struct HealthAnalysisApiDoc;

pub fn analysis_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            &format!("{}/products/analyze", state.args.server.root_path),
            post(analyze_product_image),
        )
        .route(
            &format!("{}/health/analyze", state.args.server.root_path),
            post(analyze_health),
        )
}
