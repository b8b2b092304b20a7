use axum::{extract::{Path, Query, State}, http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use crate::api::dtos::{
    requests::{page_window, AssignRealtorRequest, UpdateLeadDealRequest, UpdateLeadStatusRequest},
    responses::Paginated,
};
use crate::api::extractors::broker::BrokerScope;
use crate::domain::models::lead::{Lead, LeadFilter, LeadStatus, LeadSummary};
use crate::error::AppError;
use crate::state::AppState;

#[derive(Deserialize, Default)]
pub struct LeadListQuery {
    pub status: Option<String>,
    pub source: Option<String>,
    pub property_id: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

async fn load(state: &AppState, broker_id: &str, lead_id: &str) -> Result<Lead, AppError> {
    state.lead_repo.find_by_id(broker_id, lead_id).await?
        .ok_or(AppError::NotFound("Lead not found".into()))
}

pub async fn list_leads(
    State(state): State<Arc<AppState>>,
    scope: BrokerScope,
    Query(query): Query<LeadListQuery>,
) -> Result<impl IntoResponse, AppError> {
    if let Some(status) = &query.status {
        status.parse::<LeadStatus>().map_err(AppError::Validation)?;
    }

    let (page, limit) = page_window(query.page, query.limit, 20);
    let filter = LeadFilter {
        status: query.status.map(|s| s.trim().to_lowercase()),
        source: query.source,
        property_id: query.property_id,
    };

    let (rows, total) = state.lead_repo.list(&scope.broker_id, &filter, page, limit).await?;
    Ok(Json(Paginated::new(rows, page, limit, total)))
}

pub async fn lead_summary(
    State(state): State<Arc<AppState>>,
    scope: BrokerScope,
) -> Result<impl IntoResponse, AppError> {
    let leads = state.lead_repo.list_all(&scope.broker_id).await?;
    Ok(Json(LeadSummary::from_leads(&leads)))
}

pub async fn update_lead_status(
    State(state): State<Arc<AppState>>,
    scope: BrokerScope,
    Path((_, lead_id)): Path<(String, String)>,
    Json(payload): Json<UpdateLeadStatusRequest>,
) -> Result<impl IntoResponse, AppError> {
    let next: LeadStatus = payload.status.parse().map_err(AppError::Validation)?;
    let mut lead = load(&state, &scope.broker_id, &lead_id).await?;

    let current = lead.status()
        .ok_or_else(|| AppError::InternalWithMsg(format!("Lead {} has unknown status {}", lead.id, lead.status)))?;
    if !current.can_transition_to(next) {
        return Err(AppError::Validation(format!("Cannot move lead from {} to {}", current, next)));
    }

    lead.status = next.to_string();
    if next == LeadStatus::Converted && lead.deal_closed_at.is_none() {
        lead.deal_closed_at = Some(Utc::now());
    }
    lead.updated_at = Utc::now();

    let updated = state.lead_repo.update(&lead).await?;
    info!(broker_id = %scope.broker_id, lead_id = %updated.id, "Lead moved from {} to {}", current, next);
    Ok(Json(updated))
}

pub async fn update_lead_deal(
    State(state): State<Arc<AppState>>,
    scope: BrokerScope,
    Path((_, lead_id)): Path<(String, String)>,
    Json(payload): Json<UpdateLeadDealRequest>,
) -> Result<impl IntoResponse, AppError> {
    if payload.deal_value.is_some_and(|v| v < 0.0) || payload.commission_value.is_some_and(|v| v < 0.0) {
        return Err(AppError::Validation("Deal amounts cannot be negative".to_string()));
    }

    let mut lead = load(&state, &scope.broker_id, &lead_id).await?;
    lead.deal_value = payload.deal_value;
    lead.commission_value = payload.commission_value;

    // Commission defaults to the assigned realtor's percentage of the deal.
    if lead.commission_value.is_none()
        && let (Some(deal), Some(realtor_id)) = (lead.deal_value, lead.realtor_id.as_deref())
        && let Some(realtor) = state.realtor_repo.find_by_id(&scope.broker_id, realtor_id).await?
        && let Some(pct) = realtor.commission_percentage
    {
        lead.commission_value = Some(deal * pct / 100.0);
    }

    if lead.status() == Some(LeadStatus::Converted) && lead.deal_closed_at.is_none() {
        lead.deal_closed_at = Some(Utc::now());
    }
    lead.updated_at = Utc::now();

    let updated = state.lead_repo.update(&lead).await?;
    info!(broker_id = %scope.broker_id, lead_id = %updated.id, "Lead deal updated");
    Ok(Json(updated))
}

pub async fn assign_realtor(
    State(state): State<Arc<AppState>>,
    scope: BrokerScope,
    Path((_, lead_id)): Path<(String, String)>,
    Json(payload): Json<AssignRealtorRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut lead = load(&state, &scope.broker_id, &lead_id).await?;

    lead.realtor_id = match payload.realtor_id.filter(|r| !r.is_empty()) {
        None => None,
        Some(id) => {
            let realtor = state.realtor_repo.find_by_id(&scope.broker_id, &id).await?
                .ok_or_else(|| AppError::Validation("Unknown realtor".to_string()))?;
            if !realtor.is_active {
                return Err(AppError::Validation("Realtor is inactive".to_string()));
            }
            Some(realtor.id)
        }
    };
    lead.updated_at = Utc::now();

    let updated = state.lead_repo.update(&lead).await?;
    info!(broker_id = %scope.broker_id, lead_id = %updated.id, "Lead realtor assigned");
    Ok(Json(updated))
}

pub async fn delete_lead(
    State(state): State<Arc<AppState>>,
    scope: BrokerScope,
    Path((_, lead_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    state.lead_repo.delete(&scope.broker_id, &lead_id).await?;
    info!(broker_id = %scope.broker_id, "Lead deleted: {}", lead_id);
    Ok(StatusCode::NO_CONTENT)
}
