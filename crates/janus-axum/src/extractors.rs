//! Extractors for authenticated handlers

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;

use crate::context::AuthContext;

/// Extract the [`AuthContext`] placed by
/// [`RenewalLayer`](crate::RenewalLayer).
///
/// Rejects with 401 when the route is not behind the layer (or the
/// layer rejected the request before the handler ran).
#[async_trait]
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .ok_or((StatusCode::UNAUTHORIZED, "missing authentication context"))
    }
}
