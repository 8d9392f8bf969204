use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use nutriscan_core::domain::analysis::value_objects::RequestContext;

pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");
pub const USER_ID_HEADER: HeaderName = HeaderName::from_static("x-user-id");

/// Attaches a [`RequestContext`] to every request.
///
/// The correlation id is taken from `x-request-id` when present, otherwise a
/// fresh one is generated. It is echoed back on the response.
pub async fn request_context(mut req: Request, next: Next) -> Response {
    let request_id = req
        .headers()
        .get(&REQUEST_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(|s| s.to_string());

    let context = RequestContext::new(request_id);
    let header = HeaderValue::from_str(&context.request_id).ok();
    req.extensions_mut().insert(context);

    let mut response = next.run(req).await;
    if let Some(value) = header {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

/// User id from the `x-user-id` header, if non-empty.
pub fn user_id(headers: &axum::http::HeaderMap) -> Option<String> {
    headers
        .get(&USER_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}
