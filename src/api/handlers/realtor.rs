use axum::{extract::{Path, State}, http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;
use std::sync::Arc;
use tracing::info;

use crate::api::dtos::requests::RealtorRequest;
use crate::api::extractors::broker::BrokerScope;
use crate::domain::models::realtor::{Realtor, DEFAULT_WHATSAPP_BUTTON_TEXT};
use crate::error::AppError;
use crate::state::AppState;

fn apply_fields(r: &mut Realtor, p: RealtorRequest) -> Result<(), AppError> {
    if let Some(v) = p.name { r.name = v.trim().to_string(); }
    if let Some(v) = p.email { r.email = v.trim().to_lowercase(); }
    if let Some(v) = p.phone { r.phone = Some(v); }
    if let Some(v) = p.creci { r.creci = Some(v); }
    if let Some(v) = p.avatar_url { r.avatar_url = Some(v); }
    if let Some(v) = p.bio { r.bio = Some(v); }
    if let Some(v) = p.whatsapp_button_text {
        let v = v.trim();
        r.whatsapp_button_text = if v.is_empty() { DEFAULT_WHATSAPP_BUTTON_TEXT.to_string() } else { v.to_string() };
    }
    if let Some(v) = p.commission_percentage {
        if !(0.0..=100.0).contains(&v) {
            return Err(AppError::Validation("commission_percentage must be between 0 and 100".to_string()));
        }
        r.commission_percentage = Some(v);
    }
    if let Some(v) = p.is_active { r.is_active = v; }

    if r.name.is_empty() || r.email.is_empty() {
        return Err(AppError::Validation("name and email are required".to_string()));
    }
    Ok(())
}

pub async fn list_realtors(
    State(state): State<Arc<AppState>>,
    scope: BrokerScope,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.realtor_repo.list(&scope.broker_id).await?))
}

pub async fn create_realtor(
    State(state): State<Arc<AppState>>,
    scope: BrokerScope,
    Json(payload): Json<RealtorRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut realtor = Realtor::new(scope.broker_id.clone(), String::new(), String::new());
    apply_fields(&mut realtor, payload)?;

    let created = state.realtor_repo.create(&realtor).await?;
    info!(broker_id = %scope.broker_id, "Realtor created: {}", created.id);
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_realtor(
    State(state): State<Arc<AppState>>,
    scope: BrokerScope,
    Path((_, realtor_id)): Path<(String, String)>,
    Json(payload): Json<RealtorRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut realtor = state.realtor_repo.find_by_id(&scope.broker_id, &realtor_id).await?
        .ok_or(AppError::NotFound("Realtor not found".into()))?;
    apply_fields(&mut realtor, payload)?;
    realtor.updated_at = Utc::now();

    let updated = state.realtor_repo.update(&realtor).await?;
    info!(broker_id = %scope.broker_id, "Realtor updated: {}", updated.id);
    Ok(Json(updated))
}

pub async fn delete_realtor(
    State(state): State<Arc<AppState>>,
    scope: BrokerScope,
    Path((_, realtor_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    state.realtor_repo.delete(&scope.broker_id, &realtor_id).await?;
    info!(broker_id = %scope.broker_id, "Realtor deleted: {}", realtor_id);
    Ok(StatusCode::NO_CONTENT)
}
