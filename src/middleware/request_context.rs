use axum::{body::Body, extract::Request, http::HeaderValue, middleware::Next, response::Response};
use uuid::Uuid;

use crate::models::{Session, UserId};

/// HTTP header carrying the request id (echoed on the response)
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// HTTP header the identity gateway sets to the verified user id
pub const USER_ID_HEADER: &str = "x-user-id";

/// Per-request data handlers read from the request extensions
#[derive(Clone, Debug)]
pub struct RequestContext {
    pub request_id: Uuid,
    pub session: Session,
}

impl RequestContext {
    fn from_request(request: &Request) -> Self {
        let headers = request.headers();

        let request_id = headers
            .get(REQUEST_ID_HEADER)
            .and_then(|h| h.to_str().ok())
            .and_then(|s| Uuid::parse_str(s).ok())
            .unwrap_or_else(Uuid::new_v4);

        let session = headers
            .get(USER_ID_HEADER)
            .and_then(|h| h.to_str().ok())
            .map(str::trim)
            .filter(|uid| !uid.is_empty())
            .map(|uid| Session::authenticated(UserId(uid.to_string())))
            .unwrap_or_else(Session::anonymous);

        Self {
            request_id,
            session,
        }
    }
}

/// Attaches a `RequestContext` to every request and echoes the request id.
///
/// An incoming `x-request-id` UUID is reused, otherwise one is generated.
pub async fn request_context_middleware(mut request: Request, next: Next) -> Response {
    let context = RequestContext::from_request(&request);
    let request_id = context.request_id;
    request.extensions_mut().insert(context);

    let mut response = next.run(request).await;

    if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}

/// Tracing span for `TraceLayer`, tagged with the request id
pub fn make_span_with_request_id(request: &Request<Body>) -> tracing::Span {
    let request_id = request
        .extensions()
        .get::<RequestContext>()
        .map(|ctx| ctx.request_id.to_string())
        .unwrap_or_else(|| "unknown".to_string());

    tracing::info_span!(
        "http_request",
        method = %request.method(),
        uri = %request.uri(),
        request_id = %request_id,
    )
}
