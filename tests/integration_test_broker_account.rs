mod common;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use common::{cookie_value, parse_body, TestApp};
use serde_json::{json, Value};

async fn signup_raw(app: &TestApp, payload: Value) -> axum::response::Response {
    app.send(
        Request::builder().method("POST").uri("/api/v1/brokers")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(payload.to_string())).unwrap()
    ).await
}

#[tokio::test]
async fn test_signup_generates_slug_and_secret() {
    let app = TestApp::new().await;

    let res = signup_raw(&app, json!({
        "business_name": "Imobiliária São José",
        "email": "Contato@SaoJose.test",
    })).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body = parse_body(res).await;
    assert_eq!(body["broker"]["website_slug"], "imobiliaria-sao-jose");
    assert_eq!(body["admin_email"], "contato@saojose.test");
    let secret = body["admin_secret"].as_str().expect("generated password is returned once");
    assert_eq!(secret.len(), 16);

    let auth = app.login("contato@saojose.test", secret).await;
    let me = app.admin(&auth, "GET", "/api/v1/brokers/me", None).await;
    assert_eq!(me.status(), StatusCode::OK);
    assert_eq!(parse_body(me).await["business_name"], "Imobiliária São José");
}

#[tokio::test]
async fn test_signup_validation_and_conflicts() {
    let app = TestApp::new().await;
    app.signup("Acme Imóveis", "acme").await;

    let res = signup_raw(&app, json!({"business_name": "Outra", "website_slug": "acme", "email": "x@outra.test"})).await;
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let res = signup_raw(&app, json!({"business_name": "Outra", "website_slug": "outra", "email": "admin@acme.test"})).await;
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let res = signup_raw(&app, json!({"business_name": "Outra", "website_slug": "Outra Slug!", "email": "x@outra.test"})).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = signup_raw(&app, json!({"business_name": "Outra", "email": "x@outra.test", "password": "short"})).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = signup_raw(&app, json!({"business_name": "   ", "email": "x@outra.test"})).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = signup_raw(&app, json!({"business_name": "Outra", "email": "not-an-email"})).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_logout_and_session_checks() {
    let app = TestApp::new().await;
    let acme = app.signup("Acme Imóveis", "acme").await;

    let res = app.send(
        Request::builder().method("POST").uri("/api/v1/auth/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json!({"email": acme.email, "password": "wrong-password"}).to_string())).unwrap()
    ).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = app.send(
        Request::builder().method("POST").uri("/api/v1/auth/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json!({"email": "ghost@nowhere.test", "password": "whatever123"}).to_string())).unwrap()
    ).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = app.get("/api/v1/brokers/me").await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = app.send(
        Request::builder().method("GET").uri("/api/v1/brokers/me")
            .header(header::COOKIE, "access_token=not.a.jwt")
            .body(Body::empty()).unwrap()
    ).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    // Writes need the CSRF header that came with the login response.
    let res = app.send(
        Request::builder().method("PUT").uri("/api/v1/brokers/me")
            .header(header::COOKIE, format!("access_token={}", acme.auth.access_token))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json!({"display_name": "Acme"}).to_string())).unwrap()
    ).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = app.admin(&acme.auth, "POST", "/api/v1/auth/logout", None).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(cookie_value(&res, "access_token").as_deref(), Some(""));
}

#[tokio::test]
async fn test_update_settings_and_clear_fields() {
    let app = TestApp::new().await;
    let acme = app.signup("Acme Imóveis", "acme").await;

    let res = app.admin(&acme.auth, "PUT", "/api/v1/brokers/me", Some(json!({
        "display_name": "Acme",
        "primary_color": "#112233",
        "property_title_template": "{title} | {business_name}",
        "website_slug": "acme-imoveis",
    }))).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = parse_body(res).await;
    assert_eq!(body["display_name"], "Acme");
    assert_eq!(body["primary_color"], "#112233");
    assert_eq!(body["website_slug"], "acme-imoveis");

    assert_eq!(app.get("/api/v1/public/acme").await.status(), StatusCode::NOT_FOUND);
    assert_eq!(app.get("/api/v1/public/acme-imoveis").await.status(), StatusCode::OK);

    let res = app.admin(&acme.auth, "PUT", "/api/v1/brokers/me", Some(json!({"display_name": ""}))).await;
    let body = parse_body(res).await;
    assert!(body["display_name"].is_null());
    assert_eq!(body["primary_color"], "#112233", "absent fields are untouched");

    let res = app.admin(&acme.auth, "PUT", "/api/v1/brokers/me", Some(json!({"business_name": " "}))).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = app.admin(&acme.auth, "PUT", "/api/v1/brokers/me", Some(json!({"website_slug": "Bad Slug"}))).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_custom_domain_rules_and_dns_instructions() {
    let app = TestApp::new().await;
    let acme = app.signup("Acme Imóveis", "acme").await;
    let beta = app.signup("Beta Imóveis", "beta").await;

    let res = app.admin(&acme.auth, "GET", "/api/v1/brokers/me/domain-instructions", None).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST, "no domain configured yet");

    let res = app.admin(&acme.auth, "PUT", "/api/v1/brokers/me", Some(json!({"custom_domain": "acme.example.com"}))).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST, "platform subdomains are not custom domains");

    let res = app.admin(&acme.auth, "PUT", "/api/v1/brokers/me", Some(json!({"custom_domain": "not a domain"}))).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = app.admin(&acme.auth, "PUT", "/api/v1/brokers/me", Some(json!({"custom_domain": "acme.com.br"}))).await;
    assert_eq!(res.status(), StatusCode::OK);

    let res = app.admin(&beta.auth, "PUT", "/api/v1/brokers/me", Some(json!({"custom_domain": "www.acme.com.br"}))).await;
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let res = app.admin(&acme.auth, "GET", "/api/v1/brokers/me/domain-instructions", None).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = parse_body(res).await;
    assert_eq!(body["domain"], "acme.com.br");
    let records = body["dns_records"].as_array().unwrap();
    assert_eq!(records[0]["type"], "CNAME");
    assert_eq!(records[0]["value"], "example.com");
    assert_eq!(records[1]["type"], "A");
    assert_eq!(records[1]["value"], "203.0.113.10");

    let res = app.admin(&acme.auth, "PUT", "/api/v1/brokers/me", Some(json!({"custom_domain": ""}))).await;
    assert!(parse_body(res).await["custom_domain"].is_null());
    let site = app.get_with_header("/api/v1/site", "host", "acme.com.br").await;
    assert_eq!(site.status(), StatusCode::NOT_FOUND);
}
