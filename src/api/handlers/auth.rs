use axum::{extract::State, response::IntoResponse, Json, http::StatusCode};
use crate::state::AppState;
use crate::error::AppError;
use crate::api::dtos::requests::LoginRequest;
use crate::domain::models::auth::{AuthResponse, UserProfile};
use crate::domain::services::auth_service::{verify_password, ACCESS_TOKEN_MINUTES};
use std::sync::Arc;
use tower_cookies::{Cookies, Cookie};
use tower_cookies::cookie::SameSite;
use time::Duration;
use tracing::{info, warn};

pub async fn login(
    State(state): State<Arc<AppState>>,
    cookies: Cookies,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = state.user_repo.find_by_email(&payload.email).await?
        .ok_or(AppError::Unauthorized)?;

    if let Err(e) = verify_password(&payload.password, &user.password_hash) {
        warn!(user_id = %user.id, "Rejected login attempt");
        return Err(e);
    }

    let (access_jwt, csrf_token) = state.auth_service.issue(&user)?;
    set_access_cookie(&cookies, &access_jwt);

    info!("User logged in: {}", user.id);

    Ok(Json(AuthResponse {
        csrf_token,
        user: UserProfile {
            id: user.id,
            broker_id: user.broker_id,
            email: user.email,
            role: user.role,
        }
    }))
}

pub async fn logout(cookies: Cookies) -> Result<impl IntoResponse, AppError> {
    cookies.remove(Cookie::build(("access_token", "")).path("/").into());
    info!("User logged out");
    Ok(StatusCode::OK)
}

fn set_access_cookie(cookies: &Cookies, access: &str) {
    let mut access_c = Cookie::new("access_token", access.to_string());
    access_c.set_http_only(true);
    access_c.set_secure(true);
    access_c.set_same_site(SameSite::Strict);
    access_c.set_path("/");
    access_c.set_max_age(Duration::minutes(ACCESS_TOKEN_MINUTES));
    cookies.add(access_c);
}
