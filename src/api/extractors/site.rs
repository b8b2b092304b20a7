use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use std::convert::Infallible;

/// Explicit override header used by edge proxies in front of custom domains.
pub const TENANT_DOMAIN_HEADER: &str = "x-tenant-domain";
pub const FORWARDED_HOST_HEADER: &str = "x-forwarded-host";

/// Host the visitor typed, if any header carries it.
#[derive(Debug, Clone)]
pub struct SiteHost(pub Option<String>);

pub fn host_from_headers(headers: &HeaderMap) -> Option<String> {
    [TENANT_DOMAIN_HEADER, FORWARDED_HOST_HEADER, header::HOST.as_str()]
        .iter()
        .filter_map(|name| headers.get(*name))
        .filter_map(|v| v.to_str().ok())
        // X-Forwarded-Host may carry a proxy chain; the first entry is the client's.
        .map(|v| v.split(',').next().unwrap_or(v).trim().to_string())
        .find(|v| !v.is_empty())
}

impl<S: Send + Sync> FromRequestParts<S> for SiteHost {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(SiteHost(host_from_headers(&parts.headers)))
    }
}

#[derive(Debug, Clone, Default)]
pub struct UserAgent(pub String);

impl<S: Send + Sync> FromRequestParts<S> for UserAgent {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let ua = parts.headers.get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        Ok(UserAgent(ua))
    }
}
