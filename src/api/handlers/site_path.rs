//! Microsite served under the shared platform origin at `/{broker_slug}`.

use axum::{extract::{Path, Query, State}, response::IntoResponse, Json};
use std::sync::Arc;

use crate::api::dtos::requests::CreateLeadRequest;
use crate::api::extractors::{site::UserAgent, visitor::Visitor};
use crate::api::handlers::site::{self, ListingQuery, SiteTarget};
use crate::error::{AppError, LoadError};
use crate::state::AppState;

pub async fn get_site(
    State(state): State<Arc<AppState>>,
    Path(broker_slug): Path<String>,
) -> Result<impl IntoResponse, LoadError> {
    site::site_info(&state, &SiteTarget::by_slug(broker_slug)).await
}

pub async fn list_properties(
    State(state): State<Arc<AppState>>,
    Path(broker_slug): Path<String>,
    Query(query): Query<ListingQuery>,
) -> Result<impl IntoResponse, LoadError> {
    site::list_properties(&state, &SiteTarget::by_slug(broker_slug), query).await
}

pub async fn get_property(
    State(state): State<Arc<AppState>>,
    UserAgent(user_agent): UserAgent,
    Path((broker_slug, property_slug)): Path<(String, String)>,
) -> Result<impl IntoResponse, LoadError> {
    site::property_page(&state, &SiteTarget::by_slug(broker_slug), property_slug, &user_agent).await
}

pub async fn create_lead(
    State(state): State<Arc<AppState>>,
    Path(broker_slug): Path<String>,
    Json(payload): Json<CreateLeadRequest>,
) -> Result<impl IntoResponse, AppError> {
    site::capture_lead(&state, &SiteTarget::by_slug(broker_slug), payload).await
}

pub async fn add_favorite(
    State(state): State<Arc<AppState>>,
    Visitor(visitor_id): Visitor,
    Path((broker_slug, property_slug)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    site::add_favorite(&state, &SiteTarget::by_slug(broker_slug), property_slug, &visitor_id).await
}
