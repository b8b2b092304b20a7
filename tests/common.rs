use listing_backend::{
    api::router::create_router,
    state::AppState,
    config::Config,
    infra::factory::{assemble_state, listing_source_for, run_sqlite_migrations, Repositories},
};
use sqlx::{sqlite::{SqliteConnectOptions, SqlitePoolOptions}, Pool, Sqlite};
use std::sync::Arc;
use uuid::Uuid;
use axum::{
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
    Router,
};
use std::str::FromStr;
use tower::ServiceExt;
use serde_json::{json, Value};

pub const BASE_DOMAIN: &str = "example.com";
pub const PUBLIC_SITE_URL: &str = "https://sites.example.com";

pub struct AuthHeaders {
    pub access_token: String,
    pub csrf_token: String,
}

/// A broker account created through the signup endpoint and logged in.
pub struct BrokerFixture {
    pub broker_id: String,
    pub slug: String,
    pub email: String,
    pub auth: AuthHeaders,
}

#[allow(dead_code)]
pub struct TestApp {
    pub router: Router,
    pub pool: Pool<Sqlite>,
    pub db_filename: String,
    pub state: Arc<AppState>,
}

#[allow(dead_code)]
pub fn test_config(db_url: &str) -> Config {
    let priv_key_pem = include_str!("../tests/keys/test_private.pem");
    let pub_key_pem = include_str!("../tests/keys/test_public.pem");

    Config {
        database_url: db_url.to_string(),
        port: 0,
        base_domain: BASE_DOMAIN.to_string(),
        public_site_url: PUBLIC_SITE_URL.to_string(),
        reserved_subdomains: vec!["admin".into(), "www".into(), "api".into(), "app".into(), "mail".into()],
        listing_backend_url: None,
        listing_backend_key: None,
        prefetch_ttl_secs: 60,
        prefetch_capacity: 100,
        probe_attempts: 2,
        probe_backoff_ms: 10,
        auto_retries: 1,
        auto_retry_delay_ms: 10,
        enable_debug_routes: true,
        jwt_secret_key: priv_key_pem.to_string(),
        jwt_public_key: pub_key_pem.to_string(),
        auth_issuer: "test-issuer".to_string(),
        dns_a_record: "203.0.113.10".to_string(),
    }
}

#[allow(dead_code)]
impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    pub async fn with_config(adjust: impl FnOnce(&mut Config)) -> Self {
        let db_filename = format!("test_{}.db", Uuid::new_v4());
        let db_url = format!("sqlite://{}?mode=rwc", db_filename);

        let connection_options = SqliteConnectOptions::from_str(&db_url)
            .unwrap()
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .connect_with(connection_options)
            .await
            .expect("Failed to connect to test db");

        run_sqlite_migrations(&pool).await;

        let mut config = test_config(&db_url);
        adjust(&mut config);

        let repos = Repositories::sqlite(pool.clone());
        let listing_source = listing_source_for(&config, &repos);
        let state = Arc::new(assemble_state(&config, repos, listing_source));

        let router = create_router(state.clone());

        Self {
            router,
            pool,
            db_filename,
            state,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn login(&self, email: &str, password: &str) -> AuthHeaders {
        let payload = json!({
            "email": email,
            "password": password
        });

        let response = self.send(
            Request::builder()
                .method("POST")
                .uri("/api/v1/auth/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap()
        ).await;

        if !response.status().is_success() {
            panic!("Login failed in test helper: status {}", response.status());
        }

        let access_token = cookie_value(&response, "access_token")
            .expect("No access_token cookie returned");

        let body_json = parse_body(response).await;
        let csrf_token = body_json["csrf_token"].as_str().expect("No csrf_token in body").to_string();

        AuthHeaders {
            access_token,
            csrf_token
        }
    }

    /// Signs up a broker with a known password and logs its admin in.
    pub async fn signup(&self, business_name: &str, slug: &str) -> BrokerFixture {
        let email = format!("admin@{}.test", slug);
        let password = "correct-horse-battery";

        let response = self.send(
            Request::builder().method("POST").uri("/api/v1/brokers")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json!({
                    "business_name": business_name,
                    "website_slug": slug,
                    "email": email,
                    "password": password,
                }).to_string())).unwrap()
        ).await;

        let status = response.status();
        let body = parse_body(response).await;
        assert_eq!(status, StatusCode::CREATED, "signup failed: {:?}", body);

        let broker_id = body["broker"]["id"].as_str().unwrap().to_string();
        let auth = self.login(&email, password).await;

        BrokerFixture { broker_id, slug: slug.to_string(), email, auth }
    }

    /// Authenticated JSON call on behalf of a broker admin.
    pub async fn admin(&self, auth: &AuthHeaders, method: &str, uri: &str, body: Option<Value>) -> Response {
        let builder = Request::builder().method(method).uri(uri)
            .header(header::COOKIE, format!("access_token={}", auth.access_token))
            .header("X-CSRF-Token", &auth.csrf_token);

        let request = match body {
            Some(b) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(b.to_string())).unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(request).await
    }

    pub async fn create_property(&self, broker: &BrokerFixture, body: Value) -> Value {
        let response = self.admin(
            &broker.auth,
            "POST",
            &format!("/api/v1/{}/properties", broker.broker_id),
            Some(body),
        ).await;
        let status = response.status();
        let data = parse_body(response).await;
        assert_eq!(status, StatusCode::CREATED, "property create failed: {:?}", data);
        data
    }

    pub async fn get(&self, uri: &str) -> Response {
        self.send(Request::builder().method("GET").uri(uri).body(Body::empty()).unwrap()).await
    }

    pub async fn get_with_header(&self, uri: &str, name: &str, value: &str) -> Response {
        self.send(
            Request::builder().method("GET").uri(uri)
                .header(name, value)
                .body(Body::empty()).unwrap()
        ).await
    }
}

#[allow(dead_code)]
pub fn cookie_value(response: &Response, name: &str) -> Option<String> {
    let prefix = format!("{}=", name);
    response.headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .find(|c| c.starts_with(&prefix))
        .map(|c| {
            let rest = &c[prefix.len()..];
            rest.split(';').next().unwrap_or(rest).to_string()
        })
}

#[allow(dead_code)]
pub async fn parse_body(response: Response) -> Value {
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    if bytes.is_empty() {
        panic!("Response body is empty. Status: {}", status);
    }
    match serde_json::from_slice(&bytes) {
        Ok(v) => v,
        Err(e) => panic!("Failed to parse JSON: {:?}. Status: {}. Body: {:?}", e, status, String::from_utf8_lossy(&bytes))
    }
}

#[allow(dead_code)]
pub fn house(title: &str, slug: &str, price: f64) -> Value {
    json!({
        "title": title,
        "slug": slug,
        "price": price,
        "property_type": "house",
        "transaction_type": "sale",
        "bedrooms": 3,
        "bathrooms": 2,
        "area_m2": 120.0,
        "city": "Curitiba",
        "neighborhood": "Batel",
        "uf": "pr",
        "description": "Casa ampla com quintal",
    })
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.db_filename);
    }
}
