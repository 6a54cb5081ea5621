//! Authentication middleware, the admin extractor and the request span.

use crate::auth::{Authenticator, Identity};
use crate::error::{ApiError, ApiResult, IntoApiResult};
use crate::http::AppState;
use async_trait::async_trait;
use axum::body::Body;
use axum::extract::{FromRequestParts, Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use tracing::{info_span, trace, Span};

pub(crate) const X_REQUEST_ID: &str = "x-request-id";

/// Resolves the bearer token into an `Identity` and stores it in the request extensions. Requests
/// without a known token are answered with 401 before any handler or extractor runs.
pub(super) async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let identity = resolve(state.auth.as_ref(), request.headers()).await?;
    trace!("Authenticated as {}", identity.name);
    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

async fn resolve(auth: &dyn Authenticator, headers: &HeaderMap) -> ApiResult<Identity> {
    let token = bearer_token(headers).ok_or(ApiError::Unauthenticated)?;
    auth.authenticate(token)
        .await
        .api_result()?
        .ok_or(ApiError::Unauthenticated)
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Extracts the caller's identity and rejects it with 403 unless it is an admin.
///
/// Place it before any body extractor so that a forbidden caller never has its body parsed.
#[derive(Debug, Clone)]
pub(crate) struct Admin(pub(crate) Identity);

#[async_trait]
impl<S> FromRequestParts<S> for Admin
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let identity = parts
            .extensions
            .get::<Identity>()
            .cloned()
            .ok_or(ApiError::Unauthenticated)?;
        if !identity.is_admin {
            return Err(ApiError::Forbidden);
        }
        Ok(Admin(identity))
    }
}

/// The span that wraps every request.
pub(super) fn make_span(request: &axum::http::Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    info_span!(
        "request",
        method = %request.method(),
        path = %request.uri().path(),
        request_id
    )
}
