use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, error, instrument};

use crate::domain::models::{
    broker::{BrokerBranding, BrokerContact},
    property::{Property, PropertyDetail},
    social_link::SocialLink,
};
use crate::domain::ports::ListingSource;
use crate::error::AppError;

/// Talks to a hosted PostgREST endpoint exposing the public listing RPCs.
pub struct PostgrestListingSource {
    client: Client,
    base_url: String,
    api_key: String,
}

impl PostgrestListingSource {
    pub fn new(base_url: String, api_key: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(15))
                .build()
                .unwrap_or_else(|_| Client::new()),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}/rest/v1/{}", self.base_url, path))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder, what: &str) -> Result<T, AppError> {
        let response = req.send().await.map_err(|e| {
            error!("Listing backend unreachable during {}: {}", what, e);
            AppError::Connectivity(format!("Failed to fetch: {}", e))
        })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            error!("Listing backend rejected {}: {} - {}", what, status, text);
            return Err(AppError::Upstream(format!("{} failed: {} - {}", what, status, text)));
        }

        response.json::<T>().await.map_err(|e| {
            error!("Unreadable listing backend response for {}: {:?}", what, e);
            AppError::Upstream(format!("{} returned an unreadable body", what))
        })
    }

    async fn rpc<T: DeserializeOwned>(&self, function: &str, args: Value) -> Result<T, AppError> {
        debug!(function, "Calling listing RPC");
        let req = self.request(Method::POST, &format!("rpc/{}", function)).json(&args);
        self.send(req, function).await
    }
}

fn eq(value: &str) -> String {
    format!("eq.{}", value)
}

#[async_trait]
impl ListingSource for PostgrestListingSource {
    async fn probe(&self) -> Result<(), AppError> {
        let req = self.request(Method::GET, "properties").query(&[("select", "id"), ("limit", "1")]);
        self.send::<Vec<Value>>(req, "probe").await.map(|_| ())
    }

    #[instrument(skip(self))]
    async fn property_detail(&self, broker_slug: &str, property_slug: &str) -> Result<Vec<PropertyDetail>, AppError> {
        self.rpc(
            "get_public_property_detail_with_realtor",
            json!({ "broker_slug": broker_slug, "property_slug": property_slug }),
        )
        .await
    }

    async fn broker_branding(&self, broker_slug: &str) -> Result<Vec<BrokerBranding>, AppError> {
        self.rpc("get_public_broker_branding", json!({ "broker_website_slug": broker_slug })).await
    }

    async fn broker_contact(&self, broker_slug: &str) -> Result<Option<BrokerContact>, AppError> {
        let rows: Vec<BrokerContact> = self
            .rpc("get_public_broker_contact", json!({ "broker_website_slug": broker_slug }))
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn resolve_broker(&self, domain: Option<&str>, slug: Option<&str>) -> Result<Option<BrokerBranding>, AppError> {
        let rows: Vec<BrokerBranding> = self
            .rpc("get_broker_by_domain_or_slug", json!({ "domain_name": domain, "slug_name": slug }))
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn property_by_slug_direct(&self, broker_slug: &str, property_slug: &str) -> Result<Vec<PropertyDetail>, AppError> {
        let req = self.request(Method::GET, "properties").query(&[
            ("select", "*,brokers!inner(website_slug)".to_string()),
            ("slug", eq(property_slug)),
            ("brokers.website_slug", eq(broker_slug)),
            ("is_active", "eq.true".to_string()),
            ("limit", "1".to_string()),
        ]);
        let rows: Vec<Property> = self.send(req, "property fallback").await?;
        Ok(rows.into_iter().map(PropertyDetail::from).collect())
    }

    async fn similar_properties(
        &self,
        broker_id: &str,
        property_type: &str,
        transaction_type: &str,
        exclude_id: &str,
        limit: i64,
    ) -> Result<Vec<Property>, AppError> {
        let req = self.request(Method::GET, "properties").query(&[
            ("select", "*".to_string()),
            ("is_active", "eq.true".to_string()),
            ("property_type", eq(property_type)),
            ("transaction_type", eq(transaction_type)),
            ("broker_id", eq(broker_id)),
            ("id", format!("neq.{}", exclude_id)),
            ("limit", limit.to_string()),
        ]);
        self.send(req, "similar properties").await
    }

    async fn social_links(&self, broker_id: &str) -> Result<Vec<SocialLink>, AppError> {
        let req = self.request(Method::GET, "social_links").query(&[
            ("select", "*".to_string()),
            ("broker_id", eq(broker_id)),
            ("is_active", "eq.true".to_string()),
            ("order", "display_order.asc".to_string()),
        ]);
        self.send(req, "social links").await
    }

    async fn update_views_count(&self, property_id: &str, views: i64) -> Result<(), AppError> {
        let req = self
            .request(Method::PATCH, "properties")
            .query(&[("id", eq(property_id))])
            .header("Prefer", "return=minimal")
            .json(&json!({ "views_count": views }));

        let response = req.send().await.map_err(|e| AppError::Connectivity(format!("Failed to fetch: {}", e)))?;
        if !response.status().is_success() {
            return Err(AppError::Upstream(format!("views update failed: {}", response.status())));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::broker::Broker;
    use crate::domain::models::property::NewPropertyParams;
    use crate::domain::services::{
        domain_resolver::DomainResolver,
        prefetch_cache::PrefetchCache,
        property_loader::{LoadRequest, NoopObserver, PropertyLoader},
        retry_policy::RetryPolicy,
    };
    use axum::{
        body::Bytes,
        extract::{Query, State},
        http::{HeaderMap, Method as HttpMethod, StatusCode, Uri},
        Json, Router,
    };
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use tokio_util::sync::CancellationToken;

    #[derive(Debug, Clone)]
    struct Seen {
        method: String,
        path: String,
        query: Vec<(String, String)>,
        apikey: Option<String>,
        authorization: Option<String>,
        prefer: Option<String>,
        body: Value,
    }

    /// In-process PostgREST stand-in. Replies are keyed by `"METHOD path"`; unknown keys answer `[]`.
    #[derive(Default)]
    struct Backend {
        seen: Mutex<Vec<Seen>>,
        replies: Mutex<HashMap<String, (StatusCode, Value)>>,
    }

    impl Backend {
        fn reply(&self, key: &str, status: StatusCode, body: Value) {
            self.replies.lock().unwrap().insert(key.to_string(), (status, body));
        }

        fn seen(&self) -> Vec<Seen> {
            self.seen.lock().unwrap().clone()
        }
    }

    async fn record(
        State(backend): State<Arc<Backend>>,
        method: HttpMethod,
        uri: Uri,
        Query(query): Query<Vec<(String, String)>>,
        headers: HeaderMap,
        body: Bytes,
    ) -> (StatusCode, Json<Value>) {
        let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok()).map(str::to_string);
        backend.seen.lock().unwrap().push(Seen {
            method: method.to_string(),
            path: uri.path().to_string(),
            query,
            apikey: header("apikey"),
            authorization: header("authorization"),
            prefer: header("prefer"),
            body: serde_json::from_slice(&body).unwrap_or(Value::Null),
        });

        let key = format!("{} {}", method, uri.path());
        let (status, body) = backend
            .replies
            .lock()
            .unwrap()
            .get(&key)
            .cloned()
            .unwrap_or((StatusCode::OK, json!([])));
        (status, Json(body))
    }

    async fn spawn_backend(backend: Arc<Backend>) -> String {
        let app = Router::new().fallback(record).with_state(backend);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        format!("http://{}/", addr)
    }

    async fn closed_port_url() -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        format!("http://{}", addr)
    }

    fn broker() -> BrokerBranding {
        let mut b = Broker::new("Acme Imóveis".into(), "acme".into(), "admin@acme.test".into());
        b.id = "broker-1".into();
        BrokerBranding::from(&b)
    }

    /// A hosted row as PostgREST returns it: nullable counters and an embedded broker.
    fn hosted_row() -> Value {
        let mut p = Property::new(NewPropertyParams {
            broker_id: "broker-1".into(),
            title: "Casa Batel".into(),
            slug: "casa-batel".into(),
            price: 450000.0,
            property_type: "house".into(),
            transaction_type: "sale".into(),
        });
        p.id = "prop-1".into();
        let mut row = serde_json::to_value(p).unwrap();
        row["views_count"] = Value::Null;
        row["images"] = Value::Null;
        row["brokers"] = json!({ "website_slug": "acme" });
        row
    }

    fn has(query: &[(String, String)], key: &str, value: &str) -> bool {
        query.iter().any(|(k, v)| k == key && v == value)
    }

    #[tokio::test]
    async fn test_rpc_calls_carry_keys_arguments_and_credentials() {
        let backend = Arc::new(Backend::default());
        backend.reply("POST /rest/v1/rpc/get_broker_by_domain_or_slug", StatusCode::OK, json!([broker()]));
        let source = PostgrestListingSource::new(spawn_backend(backend.clone()).await, "anon-key".into());

        assert!(source.property_detail("acme", "casa-batel").await.unwrap().is_empty());
        assert!(source.broker_branding("acme").await.unwrap().is_empty());
        assert_eq!(source.broker_contact("acme").await.unwrap(), None);
        let resolved = source.resolve_broker(Some("acme.com.br"), None).await.unwrap();
        assert_eq!(resolved.unwrap().website_slug, "acme");

        let seen = backend.seen();
        assert_eq!(seen.len(), 4);
        assert!(seen.iter().all(|s| s.method == "POST"));
        assert!(seen.iter().all(|s| s.apikey.as_deref() == Some("anon-key")));
        assert!(seen.iter().all(|s| s.authorization.as_deref() == Some("Bearer anon-key")));

        assert_eq!(seen[0].path, "/rest/v1/rpc/get_public_property_detail_with_realtor");
        assert_eq!(seen[0].body, json!({ "broker_slug": "acme", "property_slug": "casa-batel" }));
        assert_eq!(seen[1].path, "/rest/v1/rpc/get_public_broker_branding");
        assert_eq!(seen[1].body, json!({ "broker_website_slug": "acme" }));
        assert_eq!(seen[2].path, "/rest/v1/rpc/get_public_broker_contact");
        assert_eq!(seen[3].body, json!({ "domain_name": "acme.com.br", "slug_name": null }));
    }

    #[tokio::test]
    async fn test_table_reads_and_view_write_use_filters() {
        let backend = Arc::new(Backend::default());
        backend.reply("GET /rest/v1/properties", StatusCode::OK, json!([hosted_row()]));
        let source = PostgrestListingSource::new(spawn_backend(backend.clone()).await, "anon-key".into());

        source.probe().await.unwrap();
        let rows = source.property_by_slug_direct("acme", "casa-batel").await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].property.views_count, 0);
        assert!(rows[0].realtor_name.is_none());

        source.similar_properties("broker-1", "house", "sale", "prop-9", 6).await.unwrap();
        source.social_links("broker-1").await.unwrap();
        source.update_views_count("prop-1", 5).await.unwrap();

        let seen = backend.seen();
        assert!(has(&seen[0].query, "limit", "1"));

        let fallback = &seen[1].query;
        assert!(has(fallback, "select", "*,brokers!inner(website_slug)"));
        assert!(has(fallback, "slug", "eq.casa-batel"));
        assert!(has(fallback, "brokers.website_slug", "eq.acme"));
        assert!(has(fallback, "is_active", "eq.true"));

        let similar = &seen[2].query;
        assert!(has(similar, "broker_id", "eq.broker-1"));
        assert!(has(similar, "id", "neq.prop-9"));
        assert!(has(similar, "limit", "6"));

        assert_eq!(seen[3].path, "/rest/v1/social_links");
        assert!(has(&seen[3].query, "order", "display_order.asc"));

        assert_eq!(seen[4].method, "PATCH");
        assert!(has(&seen[4].query, "id", "eq.prop-1"));
        assert_eq!(seen[4].prefer.as_deref(), Some("return=minimal"));
        assert_eq!(seen[4].body, json!({ "views_count": 5 }));
    }

    #[tokio::test]
    async fn test_rejections_are_upstream_and_transport_failures_are_network() {
        let backend = Arc::new(Backend::default());
        backend.reply("GET /rest/v1/properties", StatusCode::INTERNAL_SERVER_ERROR, json!({ "message": "boom" }));
        let source = PostgrestListingSource::new(spawn_backend(backend).await, "anon-key".into());

        let err = source.probe().await.unwrap_err();
        assert!(matches!(err, AppError::Upstream(_)));
        assert!(!err.is_network());

        let unreachable = PostgrestListingSource::new(closed_port_url().await, "anon-key".into());
        let err = unreachable.property_detail("acme", "casa-batel").await.unwrap_err();
        assert!(matches!(err, AppError::Connectivity(ref m) if m.starts_with("Failed to fetch")));
        assert!(err.is_network());
        assert!(unreachable.update_views_count("prop-1", 1).await.unwrap_err().is_network());
    }

    #[tokio::test]
    async fn test_page_load_over_hosted_backend_uses_fallback() {
        let backend = Arc::new(Backend::default());
        backend.reply(
            "POST /rest/v1/rpc/get_public_property_detail_with_realtor",
            StatusCode::NOT_FOUND,
            json!({ "message": "function not found" }),
        );
        backend.reply("POST /rest/v1/rpc/get_public_broker_branding", StatusCode::OK, json!([broker()]));
        backend.reply("GET /rest/v1/properties", StatusCode::OK, json!([hosted_row()]));

        let source: Arc<dyn ListingSource> =
            Arc::new(PostgrestListingSource::new(spawn_backend(backend.clone()).await, "anon-key".into()));
        let resolver = DomainResolver::new(source.clone(), "example.com".into(), vec!["www".into()]);
        let cache = Arc::new(PrefetchCache::new(Duration::from_secs(60), 10));
        let loader = PropertyLoader::new(source, resolver, cache.clone(), RetryPolicy::default());

        let request = LoadRequest {
            host: Some("acme.example.com".into()),
            property_slug: Some("casa-batel".into()),
            ..Default::default()
        };
        let page = loader.load(&request, &NoopObserver, &CancellationToken::new()).await.unwrap();
        assert_eq!(page.property.property.id, "prop-1");
        assert_eq!(page.views_count, 1, "a null count starts from zero");
        assert_eq!(page.broker.website_slug, "acme");
        assert!(cache.get("acme", "casa-batel").is_some());

        let mut patched = None;
        for _ in 0..50 {
            patched = backend.seen().into_iter().find(|s| s.method == "PATCH");
            if patched.is_some() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(patched.expect("view write reaches the backend").body, json!({ "views_count": 1 }));
    }
}
