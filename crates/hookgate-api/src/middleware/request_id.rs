//! Request id injection.

use axum::{extract::Request, middleware::Next, response::Response};
use uuid::Uuid;

/// Response header carrying the request id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Identifier assigned to each request, stored in request extensions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestId(pub String);

impl RequestId {
    /// A fresh random id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Middleware to inject a request id into the request and its response.
///
/// Handlers read it from extensions so error bodies can echo it.
pub async fn inject_request_id(mut req: Request, next: Next) -> Response {
    let request_id = RequestId::generate();
    req.extensions_mut().insert(request_id.clone());

    let mut response = next.run(req).await;

    if let Ok(header_value) = request_id.as_str().parse() {
        response.headers_mut().insert(REQUEST_ID_HEADER, header_value);
    }

    response
}
