use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use uuid::Uuid;

/// Ensures every request and its response carry an `x-request-id` header,
/// generating one when the caller did not send any. Runs outside the trace
/// layer so the span always sees the final id.
pub async fn request_id_middleware(mut req: Request, next: Next) -> Response {
    let request_id = req
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let header_value = match HeaderValue::from_str(&request_id) {
        Ok(value) => value,
        Err(_) => HeaderValue::from_static("invalid"),
    };

    req.headers_mut()
        .insert("x-request-id", header_value.clone());

    let mut response = next.run(req).await;
    response.headers_mut().insert("x-request-id", header_value);

    response
}
