use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
};
use time::Duration;
use tower_cookies::{cookie::SameSite, Cookie, Cookies};
use uuid::Uuid;

pub const VISITOR_COOKIE: &str = "visitor_id";

/// Anonymous visitor id. A fresh one is issued when the cookie is absent or malformed.
pub struct Visitor(pub String);

impl<S: Send + Sync> FromRequestParts<S> for Visitor {
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let cookies = parts.extensions.get::<Cookies>()
            .ok_or(StatusCode::INTERNAL_SERVER_ERROR)?;

        if let Some(existing) = cookies.get(VISITOR_COOKIE)
            && Uuid::parse_str(existing.value()).is_ok()
        {
            return Ok(Visitor(existing.value().to_string()));
        }

        let id = Uuid::new_v4().to_string();
        let mut cookie = Cookie::new(VISITOR_COOKIE, id.clone());
        cookie.set_http_only(true);
        cookie.set_secure(true);
        cookie.set_same_site(SameSite::Lax);
        cookie.set_path("/");
        cookie.set_max_age(Duration::days(365));
        cookies.add(cookie);

        Ok(Visitor(id))
    }
}
