//! Request base URL extractor for building absolute resource links.

use std::convert::Infallible;

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};

/// Extractor for the externally visible base URL of a request.
///
/// Combines the `X-Forwarded-Proto` header (falling back to `http`) with the
/// `Host` header (falling back to `localhost`) so handlers can return
/// absolute links that survive reverse proxies.
///
/// # Example
/// ```ignore
/// use axum_helpers::extractors::BaseUrl;
///
/// async fn show_link(BaseUrl(base): BaseUrl) -> String {
///     format!("{}/todos", base)
/// }
/// ```
pub struct BaseUrl(pub String);

impl<S> FromRequestParts<S> for BaseUrl
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let scheme = parts
            .headers
            .get("x-forwarded-proto")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("http");

        let authority = parts
            .headers
            .get(header::HOST)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("localhost");

        Ok(BaseUrl(format!("{}://{}", scheme, authority)))
    }
}
