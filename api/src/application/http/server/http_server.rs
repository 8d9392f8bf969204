use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderName, HeaderValue, Method, header::CONTENT_TYPE},
    middleware,
    routing::get,
};
use nutriscan_core::{application::create_service, domain::common::NutriscanConfig};
use tower_http::cors::CorsLayer;
use tracing::{debug, info_span, warn};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::{
    application::{
        http::{
            analysis::router::analysis_routes,
            server::{app_state::AppState, openapi::ApiDoc},
        },
        request_context::{REQUEST_ID_HEADER, USER_ID_HEADER, request_context},
    },
    args::Args,
};

/// Multipart framing allowance on top of the configured image size limit.
const MULTIPART_OVERHEAD_BYTES: usize = 1024 * 1024;

pub async fn state(args: Arc<Args>) -> Result<AppState, anyhow::Error> {
    let config = NutriscanConfig::from(args.as_ref().clone());
    let service = create_service(config).await?;

    Ok(AppState::new(args, service))
}

///  Returns the [`Router`] of this application.
pub fn router(state: AppState) -> Result<Router, anyhow::Error> {
    let trace_layer = tower_http::trace::TraceLayer::new_for_http().make_span_with(
        |request: &axum::extract::Request| {
            let uri: String = request.uri().to_string();
            info_span!("http_request", method = ?request.method(), uri)
        },
    );

    let allowed_origins = state
        .args
        .server
        .allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(origin, error = %e, "Ignoring invalid allowed origin");
                None
            }
        })
        .collect::<Vec<HeaderValue>>();

    debug!("Allowed origins: {:?}", allowed_origins);

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_origin(allowed_origins)
        .allow_headers([
            CONTENT_TYPE,
            REQUEST_ID_HEADER,
            USER_ID_HEADER,
        ])
        .expose_headers([HeaderName::from_static("x-request-id")]);

    let body_limit = usize::try_from(state.args.storage.max_upload_bytes)
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD_BYTES);

    let root_path = state.args.server.root_path.clone();

    let router = axum::Router::new()
        .merge(Scalar::with_url(format!("{}/scalar", root_path), ApiDoc::openapi()))
        .route(&format!("{}/health", root_path), get(|| async { "OK" }))
        .merge(analysis_routes(state.clone()))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(middleware::from_fn(request_context))
        .layer(trace_layer)
        .layer(cors)
        .with_state(state);
    Ok(router)
}
