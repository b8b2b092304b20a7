use axum::{
    body::Body,
    extract::Request,
    routing::{get, post, put, delete},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use crate::state::AppState;
use crate::api::handlers::{
    auth, broker, debug, health, lead, preferences, property, realtor, site_host, site_path, social_link,
};
use tower_http::{
    trace::TraceLayer,
    classify::ServerErrorsFailureClass,
};
use tower_cookies::CookieManagerLayer;
use tracing::{info_span, Span, error, info};
use uuid::Uuid;

pub fn create_router(state: Arc<AppState>) -> Router {
    let mut router = Router::new()
        .route("/health", get(health::health_check))

        // Auth
        .route("/api/v1/auth/login", post(auth::login))
        .route("/api/v1/auth/logout", post(auth::logout))

        // Public site by host
        .route("/api/v1/site", get(site_host::get_site))
        .route("/api/v1/site/properties", get(site_host::list_properties))
        .route("/api/v1/site/properties/{property_slug}", get(site_host::get_property))
        .route("/api/v1/site/leads", post(site_host::create_lead))
        .route("/api/v1/site/favorites/{property_slug}", post(site_host::add_favorite))

        // Public site by path
        .route("/api/v1/public/{broker_slug}", get(site_path::get_site))
        .route("/api/v1/public/{broker_slug}/properties", get(site_path::list_properties))
        .route("/api/v1/public/{broker_slug}/properties/{property_slug}", get(site_path::get_property))
        .route("/api/v1/public/{broker_slug}/leads", post(site_path::create_lead))
        .route("/api/v1/public/{broker_slug}/favorites/{property_slug}", post(site_path::add_favorite))

        // Visitor preferences
        .route("/api/v1/preferences", get(preferences::get_preferences))
        .route("/api/v1/preferences/dark-mode", put(preferences::set_dark_mode))
        .route("/api/v1/preferences/favorites", delete(preferences::clear_favorites))
        .route("/api/v1/preferences/favorites/{property_id}", delete(preferences::remove_favorite))

        // Broker account
        .route("/api/v1/brokers", post(broker::create_broker))
        .route("/api/v1/brokers/me", get(broker::get_my_broker).put(broker::update_my_broker))
        .route("/api/v1/brokers/me/domain-instructions", get(broker::domain_instructions))

        // Properties
        .route("/api/v1/{broker_id}/properties", get(property::list_properties).post(property::create_property))
        .route("/api/v1/{broker_id}/properties/{property_id}", get(property::get_property).put(property::update_property).delete(property::delete_property))

        // Leads
        .route("/api/v1/{broker_id}/leads", get(lead::list_leads))
        .route("/api/v1/{broker_id}/leads/summary", get(lead::lead_summary))
        .route("/api/v1/{broker_id}/leads/{lead_id}", delete(lead::delete_lead))
        .route("/api/v1/{broker_id}/leads/{lead_id}/status", put(lead::update_lead_status))
        .route("/api/v1/{broker_id}/leads/{lead_id}/deal", put(lead::update_lead_deal))
        .route("/api/v1/{broker_id}/leads/{lead_id}/realtor", put(lead::assign_realtor))

        // Realtors & social links
        .route("/api/v1/{broker_id}/realtors", get(realtor::list_realtors).post(realtor::create_realtor))
        .route("/api/v1/{broker_id}/realtors/{realtor_id}", put(realtor::update_realtor).delete(realtor::delete_realtor))
        .route("/api/v1/{broker_id}/social-links", get(social_link::list_social_links).post(social_link::create_social_link))
        .route("/api/v1/{broker_id}/social-links/{link_id}", delete(social_link::delete_social_link));

    if state.config.enable_debug_routes {
        router = router.route("/api/v1/debug/site-load", get(debug::site_load));
    }

    router
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    let request_id = Uuid::new_v4().to_string();
                    info_span!(
                        "http_request",
                        request_id = %request_id,
                        method = ?request.method(),
                        uri = ?request.uri(),
                        version = ?request.version(),
                        broker_id = tracing::field::Empty,
                        user_id = tracing::field::Empty,
                    )
                })
                .on_request(|request: &Request<Body>, _span: &Span| {
                    info!("started processing request: {} {}", request.method(), request.uri().path());
                })
                .on_response(|response: &axum::http::Response<Body>, latency: Duration, _span: &Span| {
                    info!(
                        status = response.status().as_u16(),
                        latency_ms = latency.as_millis(),
                        "finished processing request"
                    );
                })
                .on_failure(|error: ServerErrorsFailureClass, _latency: Duration, _span: &Span| {
                    error!("request failed: {:?}", error);
                })
        )
        .layer(CookieManagerLayer::new())
        .with_state(state)
}