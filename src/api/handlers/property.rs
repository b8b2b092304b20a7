use axum::{extract::{Path, Query, State}, http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;
use serde::Deserialize;
use sqlx::types::Json as SqlJson;
use std::sync::Arc;
use tracing::info;

use crate::api::dtos::{requests::{page_window, PropertyRequest}, responses::Paginated};
use crate::api::extractors::broker::BrokerScope;
use crate::domain::models::property::{NewPropertyParams, Property, PropertyFilter};
use crate::domain::services::slug::slugify;
use crate::error::AppError;
use crate::state::AppState;

#[derive(Deserialize, Default)]
pub struct PropertyListQuery {
    pub status: Option<String>,
    pub property_type: Option<String>,
    pub transaction_type: Option<String>,
    pub city: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub bedrooms: Option<i32>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

fn required<T>(value: Option<T>, field: &str) -> Result<T, AppError> {
    value.ok_or_else(|| AppError::Validation(format!("{} is required", field)))
}

fn apply_fields(p: &mut Property, r: PropertyRequest) {
    if let Some(v) = r.title { p.title = v.trim().to_string(); }
    if let Some(v) = r.description { p.description = Some(v); }
    if let Some(v) = r.price { p.price = v; }
    if let Some(v) = r.property_type { p.property_type = v; }
    if let Some(v) = r.transaction_type { p.transaction_type = v; }
    if let Some(v) = r.status { p.status = v; }
    if let Some(v) = r.address { p.address = Some(v); }
    if let Some(v) = r.neighborhood { p.neighborhood = Some(v); }
    if let Some(v) = r.city { p.city = Some(v); }
    if let Some(v) = r.uf { p.uf = Some(v.to_uppercase()); }
    if r.bedrooms.is_some() { p.bedrooms = r.bedrooms; }
    if r.bathrooms.is_some() { p.bathrooms = r.bathrooms; }
    if r.parking_spaces.is_some() { p.parking_spaces = r.parking_spaces; }
    if r.area_m2.is_some() { p.area_m2 = r.area_m2; }
    if r.hoa_fee.is_some() { p.hoa_fee = r.hoa_fee; }
    if let Some(v) = r.hoa_periodicity { p.hoa_periodicity = Some(v); }
    if r.iptu_value.is_some() { p.iptu_value = r.iptu_value; }
    if let Some(v) = r.iptu_periodicity { p.iptu_periodicity = Some(v); }
    if let Some(v) = r.property_code { p.property_code = Some(v).filter(|c| !c.trim().is_empty()); }
    if let Some(v) = r.main_image_url { p.main_image_url = Some(v); }
    if let Some(v) = r.images { p.images = SqlJson(v); }
    if let Some(v) = r.features { p.features = SqlJson(v); }
    if let Some(v) = r.is_active { p.is_active = v; }
    if let Some(v) = r.is_featured { p.is_featured = v; }
}

fn validate(p: &Property) -> Result<(), AppError> {
    if p.title.is_empty() {
        return Err(AppError::Validation("title is required".to_string()));
    }
    if p.slug.is_empty() {
        return Err(AppError::Validation("slug cannot be empty".to_string()));
    }
    if p.price < 0.0 {
        return Err(AppError::Validation("price cannot be negative".to_string()));
    }
    Ok(())
}

async fn check_realtor(state: &AppState, broker_id: &str, realtor_id: Option<String>) -> Result<Option<String>, AppError> {
    match realtor_id.filter(|r| !r.is_empty()) {
        None => Ok(None),
        Some(id) => {
            state.realtor_repo.find_by_id(broker_id, &id).await?
                .ok_or_else(|| AppError::Validation("Unknown realtor".to_string()))?;
            Ok(Some(id))
        }
    }
}

async fn invalidate(state: &AppState, broker_id: &str, slugs: &[&str]) -> Result<(), AppError> {
    if let Some(broker) = state.broker_repo.find_by_id(broker_id).await? {
        for slug in slugs {
            state.loader.cache().invalidate(&broker.website_slug, slug);
        }
    }
    Ok(())
}

pub async fn list_properties(
    State(state): State<Arc<AppState>>,
    scope: BrokerScope,
    Query(query): Query<PropertyListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let (page, limit) = page_window(query.page, query.limit, 20);
    let filter = PropertyFilter {
        status: query.status,
        property_type: query.property_type,
        transaction_type: query.transaction_type,
        city: query.city,
        min_price: query.min_price,
        max_price: query.max_price,
        bedrooms: query.bedrooms,
        active_only: false,
    };

    let (rows, total) = state.property_repo.list(&scope.broker_id, &filter, page, limit).await?;
    Ok(Json(Paginated::new(rows, page, limit, total)))
}

pub async fn create_property(
    State(state): State<Arc<AppState>>,
    scope: BrokerScope,
    Json(mut payload): Json<PropertyRequest>,
) -> Result<impl IntoResponse, AppError> {
    let title = required(payload.title.take(), "title")?.trim().to_string();
    let slug = match payload.slug.take().map(|s| slugify(&s)) {
        Some(s) if !s.is_empty() => s,
        _ => slugify(&title),
    };

    let mut property = Property::new(NewPropertyParams {
        broker_id: scope.broker_id.clone(),
        title,
        slug,
        price: required(payload.price.take(), "price")?,
        property_type: required(payload.property_type.take(), "property_type")?,
        transaction_type: required(payload.transaction_type.take(), "transaction_type")?,
    });
    property.realtor_id = check_realtor(&state, &scope.broker_id, payload.realtor_id.take()).await?;
    apply_fields(&mut property, payload);
    validate(&property)?;

    if state.property_repo.find_by_slug(&scope.broker_id, &property.slug).await?.is_some() {
        return Err(AppError::Conflict(format!("A property with slug '{}' already exists", property.slug)));
    }

    let created = state.property_repo.create(&property).await?;
    info!(broker_id = %scope.broker_id, "Property created: {}", created.slug);
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn get_property(
    State(state): State<Arc<AppState>>,
    scope: BrokerScope,
    Path((_, property_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let property = state.property_repo.find_by_id(&scope.broker_id, &property_id).await?
        .ok_or(AppError::NotFound("Property not found".into()))?;
    Ok(Json(property))
}

pub async fn update_property(
    State(state): State<Arc<AppState>>,
    scope: BrokerScope,
    Path((_, property_id)): Path<(String, String)>,
    Json(mut payload): Json<PropertyRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut property = state.property_repo.find_by_id(&scope.broker_id, &property_id).await?
        .ok_or(AppError::NotFound("Property not found".into()))?;
    let old_slug = property.slug.clone();

    if let Some(slug) = payload.slug.take() {
        let slug = slugify(&slug);
        if slug != old_slug
            && state.property_repo.find_by_slug(&scope.broker_id, &slug).await?.is_some()
        {
            return Err(AppError::Conflict(format!("A property with slug '{}' already exists", slug)));
        }
        property.slug = slug;
    }
    if payload.realtor_id.is_some() {
        property.realtor_id = check_realtor(&state, &scope.broker_id, payload.realtor_id.take()).await?;
    }
    apply_fields(&mut property, payload);
    validate(&property)?;
    property.updated_at = Utc::now();

    let updated = state.property_repo.update(&property).await?;
    invalidate(&state, &scope.broker_id, &[&old_slug, &updated.slug]).await?;

    info!(broker_id = %scope.broker_id, "Property updated: {}", updated.id);
    Ok(Json(updated))
}

pub async fn delete_property(
    State(state): State<Arc<AppState>>,
    scope: BrokerScope,
    Path((_, property_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let property = state.property_repo.find_by_id(&scope.broker_id, &property_id).await?
        .ok_or(AppError::NotFound("Property not found".into()))?;

    state.property_repo.delete(&scope.broker_id, &property_id).await?;
    invalidate(&state, &scope.broker_id, &[&property.slug]).await?;

    info!(broker_id = %scope.broker_id, "Property deleted: {}", property_id);
    Ok(StatusCode::NO_CONTENT)
}
