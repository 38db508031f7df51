//! Tower middleware for session renewal
//!
//! Reads the `access-token` / `refresh-token` request headers (header
//! lookup is case-insensitive), runs the renewal guard, attaches the
//! resulting [`AuthContext`] to request extensions, and sets the rotated
//! pair on the response headers.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Request, Response, StatusCode};
use janus_auth_core::{AuthError, RenewalGuard};
use janus_db::UserRepository;
use tower::{Layer, Service};

use crate::context::AuthContext;

/// Request/response header carrying the access token
pub const ACCESS_TOKEN_HEADER: HeaderName = HeaderName::from_static("access-token");

/// Request/response header carrying the refresh token
pub const REFRESH_TOKEN_HEADER: HeaderName = HeaderName::from_static("refresh-token");

/// Tower layer that gates routes behind the renewal guard.
pub struct RenewalLayer<U> {
    guard: RenewalGuard<U>,
}

impl<U> RenewalLayer<U> {
    /// Create a layer over a guard handle
    pub fn new(guard: RenewalGuard<U>) -> Self {
        Self { guard }
    }
}

impl<U> Clone for RenewalLayer<U> {
    fn clone(&self) -> Self {
        Self {
            guard: self.guard.clone(),
        }
    }
}

impl<S, U> Layer<S> for RenewalLayer<U> {
    type Service = RenewalService<S, U>;

    fn layer(&self, inner: S) -> Self::Service {
        RenewalService {
            inner,
            guard: self.guard.clone(),
        }
    }
}

/// The renewal middleware service
pub struct RenewalService<S, U> {
    inner: S,
    guard: RenewalGuard<U>,
}

impl<S: Clone, U> Clone for RenewalService<S, U> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            guard: self.guard.clone(),
        }
    }
}

impl<S, U> Service<Request<Body>> for RenewalService<S, U>
where
    S: Service<Request<Body>, Response = Response<Body>> + Clone + Send + 'static,
    S::Future: Send,
    U: UserRepository + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<S::Response, S::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<Body>) -> Self::Future {
        let guard = self.guard.clone();
        // Swap in a fresh clone and keep the service that was driven to
        // readiness.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let access = header_value(req.headers(), &ACCESS_TOKEN_HEADER);
            let refresh = header_value(req.headers(), &REFRESH_TOKEN_HEADER);

            let (Some(access), Some(refresh)) = (access, refresh) else {
                return Ok(reject(&AuthError::Unauthenticated));
            };

            let renewed = match guard.renew(&access, &refresh).await {
                Ok(renewed) => renewed,
                Err(err) => return Ok(reject(&err)),
            };

            let (Ok(access_header), Ok(refresh_header)) = (
                HeaderValue::from_str(&renewed.tokens.access_token),
                HeaderValue::from_str(&renewed.tokens.refresh_token),
            ) else {
                // Tokens are base64url and always valid header values;
                // anything else is a signing fault, and the request must
                // not proceed unauthenticated.
                return Ok(reject(&AuthError::Internal(
                    "rotated tokens not header-safe".to_string(),
                )));
            };

            req.extensions_mut().insert(AuthContext {
                user: renewed.user,
                access_token: renewed.tokens.access_token,
                refresh_token: renewed.tokens.refresh_token,
            });

            let mut response = inner.call(req).await?;

            // Relay the rotated pair on every authenticated response.
            response
                .headers_mut()
                .insert(ACCESS_TOKEN_HEADER, access_header);
            response
                .headers_mut()
                .insert(REFRESH_TOKEN_HEADER, refresh_header);

            Ok(response)
        })
    }
}

fn header_value(headers: &HeaderMap, name: &HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
}

fn reject(err: &AuthError) -> Response<Body> {
    tracing::debug!("renewal rejected request: {err}");

    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    let body = serde_json::json!({
        "error": {
            "code": err.error_code(),
            "message": err.to_string(),
        }
    });

    let mut response = Response::new(Body::from(body.to_string()));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}
