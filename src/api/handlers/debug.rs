use axum::{extract::{Query, State}, response::IntoResponse, Json};
use serde_json::json;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::api::extractors::site::SiteHost;
use crate::domain::services::property_loader::{LoadRequest, RecordingObserver};
use crate::error::AppError;
use crate::state::AppState;

/// Runs one page load with a recording observer and reports every phase it went through.
/// Mounted only when debug routes are enabled. `host` falls back to the request's own host when omitted.
/// The load seeds the prefetch cache like a visit but never counts a view.
pub async fn site_load(
    State(state): State<Arc<AppState>>,
    SiteHost(request_host): SiteHost,
    Query(mut request): Query<LoadRequest>,
) -> Result<impl IntoResponse, AppError> {
    if request.host.is_none() && request.broker_slug.is_none() {
        request.host = request_host;
    }
    request.skip_view_count = true;

    let observer = RecordingObserver::default();
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();

    let outcome = state.loader.load(&request, &observer, &cancel).await;
    let resolved = state.loader.resolver().classify(
        request.host.as_deref().unwrap_or_default(),
        request.broker_slug.as_deref(),
    );

    let body = match outcome {
        Ok(page) => json!({
            "ok": true,
            "address": resolved,
            "events": observer.events(),
            "property_id": page.property.property.id,
            "broker_slug": page.broker.website_slug,
            "views_count": page.views_count,
            "attempts": page.attempts,
            "hydrated_from_cache": page.hydrated_from_cache,
        }),
        Err(e) => json!({
            "ok": false,
            "address": resolved,
            "events": observer.events(),
            "error": e.to_string(),
            "kind": e.kind(),
            "retryable": e.is_network(),
        }),
    };

    Ok(Json(body))
}
