//! Microsite served on a broker subdomain or custom domain.

use axum::{extract::{Path, Query, State}, response::IntoResponse, Json};
use std::sync::Arc;

use crate::api::dtos::requests::CreateLeadRequest;
use crate::api::extractors::{site::{SiteHost, UserAgent}, visitor::Visitor};
use crate::api::handlers::site::{self, ListingQuery, SiteTarget};
use crate::error::{AppError, LoadError};
use crate::state::AppState;

pub async fn get_site(
    State(state): State<Arc<AppState>>,
    SiteHost(host): SiteHost,
) -> Result<impl IntoResponse, LoadError> {
    site::site_info(&state, &SiteTarget::by_host(host)).await
}

pub async fn list_properties(
    State(state): State<Arc<AppState>>,
    SiteHost(host): SiteHost,
    Query(query): Query<ListingQuery>,
) -> Result<impl IntoResponse, LoadError> {
    site::list_properties(&state, &SiteTarget::by_host(host), query).await
}

pub async fn get_property(
    State(state): State<Arc<AppState>>,
    SiteHost(host): SiteHost,
    UserAgent(user_agent): UserAgent,
    Path(property_slug): Path<String>,
) -> Result<impl IntoResponse, LoadError> {
    site::property_page(&state, &SiteTarget::by_host(host), property_slug, &user_agent).await
}

pub async fn create_lead(
    State(state): State<Arc<AppState>>,
    SiteHost(host): SiteHost,
    Json(payload): Json<CreateLeadRequest>,
) -> Result<impl IntoResponse, AppError> {
    site::capture_lead(&state, &SiteTarget::by_host(host), payload).await
}

pub async fn add_favorite(
    State(state): State<Arc<AppState>>,
    SiteHost(host): SiteHost,
    Visitor(visitor_id): Visitor,
    Path(property_slug): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    site::add_favorite(&state, &SiteTarget::by_host(host), property_slug, &visitor_id).await
}
