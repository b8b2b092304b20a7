use axum::{extract::{Path, State}, http::StatusCode, response::IntoResponse, Json};
use std::sync::Arc;
use tracing::info;

use crate::api::dtos::requests::CreateSocialLinkRequest;
use crate::api::extractors::broker::BrokerScope;
use crate::domain::models::social_link::SocialLink;
use crate::error::AppError;
use crate::state::AppState;

pub async fn list_social_links(
    State(state): State<Arc<AppState>>,
    scope: BrokerScope,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.social_link_repo.list(&scope.broker_id).await?))
}

pub async fn create_social_link(
    State(state): State<Arc<AppState>>,
    scope: BrokerScope,
    Json(payload): Json<CreateSocialLinkRequest>,
) -> Result<impl IntoResponse, AppError> {
    let platform = payload.platform.trim().to_lowercase();
    let url = payload.url.trim().to_string();
    if platform.is_empty() {
        return Err(AppError::Validation("platform is required".to_string()));
    }
    if !(url.starts_with("https://") || url.starts_with("http://")) {
        return Err(AppError::Validation("url must start with http:// or https://".to_string()));
    }

    let display_order = match payload.display_order {
        Some(order) => order,
        None => state.social_link_repo.list(&scope.broker_id).await?.len() as i32,
    };

    let link = SocialLink::new(scope.broker_id.clone(), platform, url, display_order);
    let created = state.social_link_repo.create(&link).await?;
    info!(broker_id = %scope.broker_id, "Social link created: {}", created.platform);
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn delete_social_link(
    State(state): State<Arc<AppState>>,
    scope: BrokerScope,
    Path((_, link_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    state.social_link_repo.delete(&scope.broker_id, &link_id).await?;
    info!(broker_id = %scope.broker_id, "Social link deleted: {}", link_id);
    Ok(StatusCode::NO_CONTENT)
}
