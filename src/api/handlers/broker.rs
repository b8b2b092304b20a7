use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;
use std::sync::Arc;
use tracing::info;

use crate::api::dtos::{
    requests::{CreateBrokerRequest, UpdateBrokerRequest},
    responses::BrokerCreatedResponse,
};
use crate::api::extractors::auth::AuthUser;
use crate::domain::models::{broker::Broker, user::User};
use crate::domain::services::{
    auth_service::{hash_password, random_string},
    domain_resolver::{clean_domain, dns_instructions, is_valid_domain, normalize_host},
    slug::{is_valid_broker_slug, slugify, MAX_BROKER_SLUG_LEN},
};
use crate::error::AppError;
use crate::state::AppState;

const MIN_PASSWORD_LEN: usize = 8;

/// Empty input clears the field.
fn apply(target: &mut Option<String>, value: Option<String>) {
    if let Some(v) = value {
        let v = v.trim();
        *target = if v.is_empty() { None } else { Some(v.to_string()) };
    }
}

async fn ensure_slug_available(state: &AppState, slug: &str, own_id: Option<&str>) -> Result<(), AppError> {
    if !is_valid_broker_slug(slug) {
        return Err(AppError::Validation(
            "website_slug may only contain lowercase letters, digits and hyphens (max 50)".to_string(),
        ));
    }
    if let Some(existing) = state.broker_repo.find_by_slug(slug).await?
        && Some(existing.id.as_str()) != own_id
    {
        return Err(AppError::Conflict("website_slug is already taken".to_string()));
    }
    Ok(())
}

pub async fn create_broker(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateBrokerRequest>,
) -> Result<impl IntoResponse, AppError> {
    let business_name = payload.business_name.trim().to_string();
    if business_name.is_empty() {
        return Err(AppError::Validation("business_name is required".to_string()));
    }
    let email = payload.email.trim().to_lowercase();
    if !email.contains('@') {
        return Err(AppError::Validation("email is invalid".to_string()));
    }

    let slug = match payload.website_slug {
        Some(s) => s.trim().to_string(),
        None => slugify(&business_name).chars().take(MAX_BROKER_SLUG_LEN).collect::<String>().trim_end_matches('-').to_string(),
    };
    ensure_slug_available(&state, &slug, None).await?;

    if state.user_repo.find_by_email(&email).await?.is_some() {
        return Err(AppError::Conflict("email is already registered".to_string()));
    }

    let (password, admin_secret) = match payload.password {
        Some(p) if p.len() < MIN_PASSWORD_LEN => {
            return Err(AppError::Validation(format!("password must have at least {} characters", MIN_PASSWORD_LEN)));
        }
        Some(p) => (p, None),
        None => {
            let generated = random_string(16);
            (generated.clone(), Some(generated))
        }
    };

    let broker = state.broker_repo.create(&Broker::new(business_name, slug, email.clone())).await?;
    let user = User::new(broker.id.clone(), email.clone(), hash_password(&password)?);
    state.user_repo.create(&user).await?;

    info!(broker_id = %broker.id, "Broker created: {}", broker.website_slug);

    Ok((StatusCode::CREATED, Json(BrokerCreatedResponse { broker, admin_email: email, admin_secret })))
}

pub async fn get_my_broker(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let broker = state.broker_repo.find_by_id(&user.broker_id).await?
        .ok_or(AppError::NotFound("Broker not found".into()))?;
    Ok(Json(broker))
}

pub async fn update_my_broker(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(payload): Json<UpdateBrokerRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut broker = state.broker_repo.find_by_id(&user.broker_id).await?
        .ok_or(AppError::NotFound("Broker not found".into()))?;

    if let Some(name) = payload.business_name {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::Validation("business_name cannot be empty".to_string()));
        }
        broker.business_name = name.to_string();
    }

    if let Some(slug) = payload.website_slug {
        let slug = slug.trim().to_string();
        ensure_slug_available(&state, &slug, Some(&broker.id)).await?;
        broker.website_slug = slug;
    }

    if let Some(domain) = payload.custom_domain {
        let domain = clean_domain(&domain);
        if domain.is_empty() {
            broker.custom_domain = None;
        } else {
            if !is_valid_domain(&domain) {
                return Err(AppError::Validation(format!("Invalid domain: {}", domain)));
            }
            let base = normalize_host(&state.config.base_domain);
            if domain == base || domain.ends_with(&format!(".{}", base)) {
                return Err(AppError::Validation("Platform subdomains cannot be used as a custom domain".to_string()));
            }
            if let Some(owner) = state.broker_repo.find_by_custom_domain(&domain).await?
                && owner.id != broker.id
            {
                return Err(AppError::Conflict("Domain is already in use".to_string()));
            }
            broker.custom_domain = Some(domain);
        }
    }

    apply(&mut broker.display_name, payload.display_name);
    apply(&mut broker.contact_email, payload.contact_email);
    apply(&mut broker.whatsapp_number, payload.whatsapp_number);
    apply(&mut broker.creci, payload.creci);
    apply(&mut broker.primary_color, payload.primary_color);
    apply(&mut broker.secondary_color, payload.secondary_color);
    apply(&mut broker.logo_url, payload.logo_url);
    apply(&mut broker.site_title, payload.site_title);
    apply(&mut broker.site_description, payload.site_description);
    apply(&mut broker.property_title_template, payload.property_title_template);
    apply(&mut broker.property_description_template, payload.property_description_template);
    if let Some(prefer) = payload.canonical_prefer_custom_domain {
        broker.canonical_prefer_custom_domain = prefer;
    }

    broker.updated_at = Utc::now();
    let updated = state.broker_repo.update(&broker).await?;
    info!(broker_id = %updated.id, "Broker settings updated");
    Ok(Json(updated))
}

pub async fn domain_instructions(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let broker = state.broker_repo.find_by_id(&user.broker_id).await?
        .ok_or(AppError::NotFound("Broker not found".into()))?;

    let domain = broker.custom_domain
        .ok_or_else(|| AppError::Validation("No custom domain configured".to_string()))?;

    Ok(Json(dns_instructions(&domain, &state.config.base_domain, &state.config.dns_a_record)))
}
