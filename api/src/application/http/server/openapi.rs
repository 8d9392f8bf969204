use crate::application::http::analysis::router::{HealthAnalysisApiDoc, ProductAnalysisApiDoc};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "NutriScan API"
    ),
    nest(
        (path = "/products", api = ProductAnalysisApiDoc),
        (path = "/health", api = HealthAnalysisApiDoc),
    )
)]
pub struct ApiDoc;
