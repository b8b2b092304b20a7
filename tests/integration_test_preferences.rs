mod common;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use common::{cookie_value, house, parse_body, TestApp};
use listing_backend::domain::models::{
    broker::{Broker, BrokerBranding},
    preferences::FavoriteProperty,
    property::{NewPropertyParams, Property},
};
use listing_backend::domain::services::preferences::MAX_FAVORITES;
use serde_json::json;

fn visitor_request(method: &str, uri: &str, visitor: &str) -> Request<Body> {
    Request::builder().method(method).uri(uri)
        .header(header::COOKIE, format!("visitor_id={}", visitor))
        .body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_visitor_cookie_is_issued_once() {
    let app = TestApp::new().await;

    let res = app.get("/api/v1/preferences").await;
    assert_eq!(res.status(), StatusCode::OK);
    let visitor = cookie_value(&res, "visitor_id").expect("visitor cookie issued");
    assert!(uuid::Uuid::parse_str(&visitor).is_ok());
    let body = parse_body(res).await;
    assert_eq!(body["dark_mode"], false);
    assert_eq!(body["favorites"].as_array().unwrap().len(), 0);

    let res = app.send(visitor_request("GET", "/api/v1/preferences", &visitor)).await;
    assert!(cookie_value(&res, "visitor_id").is_none(), "known visitors keep their id");

    let res = app.send(visitor_request("GET", "/api/v1/preferences", "not-a-uuid")).await;
    let replaced = cookie_value(&res, "visitor_id").expect("malformed id is replaced");
    assert_ne!(replaced, "not-a-uuid");
}

#[tokio::test]
async fn test_dark_mode_is_persisted_per_visitor() {
    let app = TestApp::new().await;
    let visitor = uuid::Uuid::new_v4().to_string();
    let other = uuid::Uuid::new_v4().to_string();

    let res = app.send(
        Request::builder().method("PUT").uri("/api/v1/preferences/dark-mode")
            .header(header::COOKIE, format!("visitor_id={}", visitor))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json!({"enabled": true}).to_string())).unwrap()
    ).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(parse_body(res).await["dark_mode"], true);

    let mine = parse_body(app.send(visitor_request("GET", "/api/v1/preferences", &visitor)).await).await;
    assert_eq!(mine["dark_mode"], true);

    let theirs = parse_body(app.send(visitor_request("GET", "/api/v1/preferences", &other)).await).await;
    assert_eq!(theirs["dark_mode"], false);
}

#[tokio::test]
async fn test_favorites_add_filter_remove_and_clear() {
    let app = TestApp::new().await;
    let acme = app.signup("Acme Imóveis", "acme").await;
    let batel = app.create_property(&acme, house("Casa Batel", "casa-batel", 450000.0)).await;
    let mut rent = house("Apartamento Centro", "apartamento-centro", 2500.0);
    rent["transaction_type"] = json!("rent");
    rent["property_type"] = json!("apartment");
    app.create_property(&acme, rent).await;

    let visitor = uuid::Uuid::new_v4().to_string();

    let res = app.send(visitor_request("POST", "/api/v1/public/acme/favorites/casa-batel", &visitor)).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body = parse_body(res).await;
    assert_eq!(body["status"], "added");
    assert_eq!(body["total"], 1);

    let res = app.send(visitor_request("POST", "/api/v1/public/acme/favorites/casa-batel", &visitor)).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(parse_body(res).await["status"], "already_present");

    // Host adapter, warmed through the grid cache.
    app.get("/api/v1/public/acme/properties").await;
    let res = app.send(
        Request::builder().method("POST").uri("/api/v1/site/favorites/apartamento-centro")
            .header("host", "acme.example.com")
            .header(header::COOKIE, format!("visitor_id={}", visitor))
            .body(Body::empty()).unwrap()
    ).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    assert_eq!(parse_body(res).await["total"], 2);

    let res = app.send(visitor_request("POST", "/api/v1/public/acme/favorites/nao-existe", &visitor)).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let prefs = parse_body(app.send(visitor_request("GET", "/api/v1/preferences", &visitor)).await).await;
    let favorites = prefs["favorites"].as_array().unwrap();
    assert_eq!(favorites.len(), 2);
    assert_eq!(favorites[0]["slug"], "apartamento-centro", "most recent first");
    assert_eq!(favorites[1]["broker_slug"], "acme");

    let sorted = parse_body(app.send(visitor_request("GET", "/api/v1/preferences?sort=price_desc", &visitor)).await).await;
    assert_eq!(sorted["favorites"][0]["slug"], "casa-batel");

    let rentals = parse_body(app.send(visitor_request("GET", "/api/v1/preferences?transaction_type=rent", &visitor)).await).await;
    assert_eq!(rentals["favorites"].as_array().unwrap().len(), 1);

    let search = parse_body(app.send(visitor_request("GET", "/api/v1/preferences?q=batel", &visitor)).await).await;
    assert_eq!(search["favorites"].as_array().unwrap().len(), 2, "both listings sit in Batel");

    let uri = format!("/api/v1/preferences/favorites/{}", batel["id"].as_str().unwrap());
    let res = app.send(visitor_request("DELETE", &uri, &visitor)).await;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    let res = app.send(visitor_request("DELETE", &uri, &visitor)).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = app.send(visitor_request("DELETE", "/api/v1/preferences/favorites", &visitor)).await;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    let prefs = parse_body(app.send(visitor_request("GET", "/api/v1/preferences", &visitor)).await).await;
    assert_eq!(prefs["favorites"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_favorites_limit() {
    let app = TestApp::new().await;
    let acme = app.signup("Acme Imóveis", "acme").await;
    app.create_property(&acme, house("Casa Batel", "casa-batel", 450000.0)).await;

    let visitor = uuid::Uuid::new_v4().to_string();
    let branding = BrokerBranding::from(&Broker::new("Acme".into(), "acme".into(), "a@acme.test".into()));
    for i in 0..MAX_FAVORITES {
        let property = Property::new(NewPropertyParams {
            broker_id: acme.broker_id.clone(),
            title: format!("Imóvel {}", i),
            slug: format!("imovel-{}", i),
            price: 1000.0 + i as f64,
            property_type: "house".into(),
            transaction_type: "sale".into(),
        });
        app.state.preferences.add(&visitor, FavoriteProperty::snapshot(&property, &branding)).await.unwrap();
    }

    let res = app.send(visitor_request("POST", "/api/v1/public/acme/favorites/casa-batel", &visitor)).await;
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let prefs = parse_body(app.send(visitor_request("GET", "/api/v1/preferences", &visitor)).await).await;
    assert_eq!(prefs["favorites"].as_array().unwrap().len(), MAX_FAVORITES);
}
