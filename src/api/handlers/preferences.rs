use axum::{extract::{Path, Query, State}, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use std::sync::Arc;
use tracing::info;

use crate::api::dtos::requests::DarkModeRequest;
use crate::api::extractors::visitor::Visitor;
use crate::domain::models::preferences::VisitorPreferences;
use crate::domain::services::preferences::{apply_filter, FavoriteFilter};
use crate::error::AppError;
use crate::state::AppState;

pub async fn get_preferences(
    State(state): State<Arc<AppState>>,
    Visitor(visitor_id): Visitor,
    Query(filter): Query<FavoriteFilter>,
) -> Result<impl IntoResponse, AppError> {
    let prefs = state.preferences.load(&visitor_id).await?;
    Ok(Json(VisitorPreferences {
        dark_mode: prefs.dark_mode,
        favorites: apply_filter(prefs.favorites, &filter),
    }))
}

pub async fn set_dark_mode(
    State(state): State<Arc<AppState>>,
    Visitor(visitor_id): Visitor,
    Json(payload): Json<DarkModeRequest>,
) -> Result<impl IntoResponse, AppError> {
    state.preferences.set_dark_mode(&visitor_id, payload.enabled).await?;
    info!(visitor_id, enabled = payload.enabled, "Dark mode preference saved");
    Ok(Json(json!({ "dark_mode": payload.enabled })))
}

pub async fn remove_favorite(
    State(state): State<Arc<AppState>>,
    Visitor(visitor_id): Visitor,
    Path(property_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    if state.preferences.remove(&visitor_id, &property_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound("Favorite not found".to_string()))
    }
}

pub async fn clear_favorites(
    State(state): State<Arc<AppState>>,
    Visitor(visitor_id): Visitor,
) -> Result<impl IntoResponse, AppError> {
    state.preferences.clear(&visitor_id).await?;
    info!(visitor_id, "Favorites cleared");
    Ok(StatusCode::NO_CONTENT)
}
