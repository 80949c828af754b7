//! Per-endpoint-class rate limiting as an extractor.
//!
//! Add `_: RateLimit<FileUpload>` (or another class marker) to a handler's
//! arguments. Clients are identified by the first `X-Forwarded-For` hop, then
//! `X-Real-IP`, else `"unknown"`. A blocked request is rejected with 429 and a
//! `Retry-After` header.

use std::marker::PhantomData;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use chrono::Utc;
use sitesafe_core::error::CoreError;
use sitesafe_core::rate_limit::{EndpointClass, RateLimitDecision};

use crate::error::AppError;
use crate::state::AppState;

/// Marker for an endpoint class.
pub trait LimitClass: Send + Sync + 'static {
    const CLASS: EndpointClass;
}

pub struct FileUpload;
pub struct TokenValidation;
pub struct EmailSend;
pub struct PortalAccess;

impl LimitClass for FileUpload {
    const CLASS: EndpointClass = EndpointClass::FileUpload;
}

impl LimitClass for TokenValidation {
    const CLASS: EndpointClass = EndpointClass::TokenValidation;
}

impl LimitClass for EmailSend {
    const CLASS: EndpointClass = EndpointClass::EmailSend;
}

impl LimitClass for PortalAccess {
    const CLASS: EndpointClass = EndpointClass::PortalAccess;
}

/// Admitted request; carries the limiter decision.
pub struct RateLimit<C: LimitClass> {
    pub decision: RateLimitDecision,
    _class: PhantomData<C>,
}

impl<C: LimitClass> FromRequestParts<AppState> for RateLimit<C> {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let client = client_id(&parts.headers);
        let decision = state.rate_limiter.check_class(C::CLASS, &client);

        if decision.blocked {
            let retry_after_secs = decision.retry_after_secs(Utc::now());
            tracing::warn!(
                class = C::CLASS.as_str(),
                client = %client,
                retry_after_secs,
                "Rate limit exceeded"
            );
            return Err(AppError::Core(CoreError::RateLimited { retry_after_secs }));
        }

        Ok(RateLimit {
            decision,
            _class: PhantomData,
        })
    }
}

/// Client identifier used as the limiter key.
pub fn client_id(headers: &HeaderMap) -> String {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    if let Some(first) = header("x-forwarded-for")
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
    {
        return first.to_string();
    }
    header("x-real-ip").unwrap_or("unknown").to_string()
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn prefers_first_forwarded_hop() {
        let map = headers(&[
            ("x-forwarded-for", "203.0.113.9, 10.0.0.1"),
            ("x-real-ip", "10.0.0.2"),
        ]);
        assert_eq!(client_id(&map), "203.0.113.9");
    }

    #[test]
    fn falls_back_to_real_ip_then_unknown() {
        assert_eq!(client_id(&headers(&[("x-real-ip", "10.0.0.2")])), "10.0.0.2");
        assert_eq!(client_id(&headers(&[("x-forwarded-for", " ")])), "unknown");
        assert_eq!(client_id(&HeaderMap::new()), "unknown");
    }
}
