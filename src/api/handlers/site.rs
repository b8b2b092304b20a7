//! Public microsite operations shared by the host and path adapters.

use axum::{http::StatusCode, Json};
use chrono::{Duration, Utc};
use serde::Deserialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::api::dtos::{
    requests::{page_window, CreateLeadRequest},
    responses::{FavoriteAddedResponse, Paginated, PropertyPageResponse, SiteResponse},
};
use crate::domain::models::{
    broker::BrokerBranding,
    lead::{Lead, NewLeadParams},
    preferences::FavoriteProperty,
    property::{Property, PropertyFilter},
};
use crate::domain::services::{
    preferences::AddOutcome,
    prefetch_cache::PrefetchedDetail,
    property_loader::{LoadRequest, TracingObserver},
    seo,
    share::{is_mobile_user_agent, share_info},
};
use crate::error::{AppError, LoadError};
use crate::state::AppState;

/// One lead per email per broker inside this window.
pub const LEAD_WINDOW_MINUTES: i64 = 60;

/// How a public request names its broker.
#[derive(Debug, Clone, Default)]
pub struct SiteTarget {
    pub host: Option<String>,
    pub broker_slug: Option<String>,
}

impl SiteTarget {
    pub fn by_host(host: Option<String>) -> Self {
        Self { host, broker_slug: None }
    }

    pub fn by_slug(broker_slug: String) -> Self {
        Self { host: None, broker_slug: Some(broker_slug) }
    }
}

#[derive(Deserialize, Default, Debug)]
pub struct ListingQuery {
    pub property_type: Option<String>,
    pub transaction_type: Option<String>,
    pub city: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub bedrooms: Option<i32>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

pub async fn resolve_broker(state: &AppState, target: &SiteTarget) -> Result<BrokerBranding, LoadError> {
    let site = state.loader.resolver()
        .resolve(target.host.as_deref(), target.broker_slug.as_deref())
        .await?;

    if let Some(broker) = site.broker {
        return Ok(broker);
    }

    state.listing_source.broker_branding(&site.broker_slug).await
        .map_err(|e| {
            if e.is_network() { LoadError::Connectivity(e.to_string()) } else { LoadError::BrokerLoad(e.to_string()) }
        })?
        .into_iter()
        .next()
        .ok_or(LoadError::TenantNotFound)
}

pub async fn site_info(state: &AppState, target: &SiteTarget) -> Result<Json<SiteResponse>, LoadError> {
    let broker = resolve_broker(state, target).await?;

    let (contact, social_links) = tokio::join!(
        state.listing_source.broker_contact(&broker.website_slug),
        state.listing_source.social_links(&broker.id),
    );
    let contact = contact.unwrap_or_else(|e| {
        warn!("Broker contact error: {}", e);
        None
    });
    let social_links = social_links.unwrap_or_else(|e| {
        warn!("Social links error: {}", e);
        Vec::new()
    });

    Ok(Json(SiteResponse { broker, contact, social_links }))
}

/// Active listing grid. Rows seed the prefetch cache for a fast detail open.
pub async fn list_properties(
    state: &AppState,
    target: &SiteTarget,
    query: ListingQuery,
) -> Result<Json<Paginated<Property>>, LoadError> {
    let broker = resolve_broker(state, target).await?;

    let (page, limit) = page_window(query.page, query.limit, 12);
    let filter = PropertyFilter {
        status: None,
        property_type: query.property_type,
        transaction_type: query.transaction_type,
        city: query.city,
        min_price: query.min_price,
        max_price: query.max_price,
        bedrooms: query.bedrooms,
        active_only: true,
    };

    let (rows, total) = state.property_repo.list(&broker.id, &filter, page, limit).await?;

    let cache = state.loader.cache();
    for row in &rows {
        if cache.get(&broker.website_slug, &row.slug).is_none() {
            cache.set(
                &broker.website_slug,
                &row.slug,
                PrefetchedDetail { property: row.clone().into(), broker: broker.clone() },
            );
        }
    }

    Ok(Json(Paginated::new(rows, page, limit, total)))
}

pub async fn property_page(
    state: &AppState,
    target: &SiteTarget,
    property_slug: String,
    user_agent: &str,
) -> Result<Json<PropertyPageResponse>, LoadError> {
    let cancel = CancellationToken::new();
    // Dropping the handler future (client went away) cancels the load.
    let _guard = cancel.clone().drop_guard();

    let request = LoadRequest {
        host: target.host.clone(),
        broker_slug: target.broker_slug.clone(),
        property_slug: Some(property_slug),
        skip_view_count: false,
    };
    let page = state.loader.load(&request, &TracingObserver, &cancel).await?;

    let contact = state.listing_source.broker_contact(&page.broker.website_slug).await
        .unwrap_or_else(|e| {
            warn!("Broker contact error: {}", e);
            None
        });

    let property = &page.property.property;
    let seo = seo::build(property, &page.broker, &state.config.public_site_url);
    let share = share_info(
        property,
        page.broker.name(),
        &seo.canonical_url,
        contact.as_ref().and_then(|c| c.whatsapp_number.as_deref()),
        is_mobile_user_agent(user_agent),
    );

    Ok(Json(PropertyPageResponse {
        views_count: page.views_count,
        attempts: page.attempts,
        hydrated_from_cache: page.hydrated_from_cache,
        property: page.property,
        broker: page.broker,
        similar: page.similar,
        social_links: page.social_links,
        seo,
        share,
    }))
}

fn required(value: &str, field: &str) -> Result<String, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::Validation(format!("{} is required", field)));
    }
    Ok(value.to_string())
}

fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.'),
        None => false,
    }
}

pub async fn capture_lead(
    state: &AppState,
    target: &SiteTarget,
    payload: CreateLeadRequest,
) -> Result<(StatusCode, Json<Lead>), AppError> {
    let broker = resolve_broker(state, target).await?;

    let name = required(&payload.name, "name")?;
    let email = required(&payload.email, "email")?.to_lowercase();
    let phone = required(payload.phone.as_deref().unwrap_or_default(), "phone")?;
    if !looks_like_email(&email) {
        return Err(AppError::Validation("email is invalid".to_string()));
    }

    let since = Utc::now() - Duration::minutes(LEAD_WINDOW_MINUTES);
    if state.lead_repo.find_recent_by_email(&broker.id, &email, since).await?.is_some() {
        warn!(broker_id = %broker.id, "Lead rate limit hit");
        return Err(AppError::TooManyRequests(
            "A message from this email was received recently. Please try again later.".to_string(),
        ));
    }

    let mut realtor_id = None;
    if let Some(property_id) = payload.property_id.as_deref().filter(|p| !p.is_empty()) {
        let property = state.property_repo.find_by_id(&broker.id, property_id).await?
            .ok_or_else(|| AppError::Validation("Unknown property".to_string()))?;
        realtor_id = property.realtor_id;
    }

    let lead = Lead::new(NewLeadParams {
        broker_id: broker.id.clone(),
        property_id: payload.property_id.filter(|p| !p.is_empty()),
        realtor_id,
        name,
        email,
        phone: Some(phone),
        message: payload.message.map(|m| m.trim().to_string()).filter(|m| !m.is_empty()),
        source: payload.source,
    });

    let created = state.lead_repo.create(&lead).await?;
    info!(broker_id = %broker.id, lead_id = %created.id, "Lead captured");
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn add_favorite(
    state: &Arc<AppState>,
    target: &SiteTarget,
    property_slug: String,
    visitor_id: &str,
) -> Result<(StatusCode, Json<FavoriteAddedResponse>), AppError> {
    let broker = resolve_broker(state, target).await?;

    let property = match state.loader.cache().get(&broker.website_slug, &property_slug) {
        Some(cached) => cached.property.property,
        None => state.listing_source.property_detail(&broker.website_slug, &property_slug).await?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::NotFound("Property not found".to_string()))?
            .property,
    };

    let favorite = FavoriteProperty::snapshot(&property, &broker);
    let outcome = state.preferences.add(visitor_id, favorite).await?;
    let total = state.preferences.favorites(visitor_id).await?.len();

    match outcome {
        AddOutcome::Added => Ok((StatusCode::CREATED, Json(FavoriteAddedResponse { status: "added", total }))),
        AddOutcome::AlreadyPresent => Ok((StatusCode::OK, Json(FavoriteAddedResponse { status: "already_present", total }))),
        AddOutcome::LimitReached => Err(AppError::Conflict(format!(
            "Favorites limit reached ({})",
            crate::domain::services::preferences::MAX_FAVORITES
        ))),
    }
}
