use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::domain::models::{
    broker::BrokerBranding,
    property::{Property, PropertyDetail},
    social_link::SocialLink,
};
use crate::domain::ports::ListingSource;
use crate::domain::services::{
    domain_resolver::DomainResolver,
    prefetch_cache::{PrefetchCache, PrefetchedDetail},
    retry_policy::RetryPolicy,
    view_counter::ViewCounter,
};
use crate::error::LoadError;

pub const SIMILAR_LIMIT: i64 = 6;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoadRequest {
    pub host: Option<String>,
    pub broker_slug: Option<String>,
    pub property_slug: Option<String>,
    /// Diagnostic loads leave the stored view count alone.
    #[serde(skip)]
    pub skip_view_count: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadPhase {
    Idle,
    Probing,
    Fetching,
    Succeeded,
    Failed,
}

pub trait LoadObserver: Send + Sync {
    fn phase_changed(&self, _attempt: u32, _phase: LoadPhase) {}
    /// A cached pair is available before the network answers.
    fn hydrated(&self, _detail: &PrefetchedDetail) {}
    fn retry_scheduled(&self, _next_attempt: u32, _delay: Duration, _error: &LoadError) {}
}

pub struct NoopObserver;

impl LoadObserver for NoopObserver {}

pub struct TracingObserver;

impl LoadObserver for TracingObserver {
    fn phase_changed(&self, attempt: u32, phase: LoadPhase) {
        debug!(attempt, ?phase, "Load phase changed");
    }

    fn hydrated(&self, detail: &PrefetchedDetail) {
        debug!(property_slug = %detail.property.property.slug, "Hydrated from prefetch cache");
    }

    fn retry_scheduled(&self, next_attempt: u32, delay: Duration, error: &LoadError) {
        warn!(next_attempt, delay_ms = delay.as_millis() as u64, "Connection problem, reconnecting automatically: {}", error);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LoadEvent {
    Phase { attempt: u32, phase: LoadPhase },
    Hydrated { property_slug: String },
    RetryScheduled { next_attempt: u32, delay_ms: u64, error: String },
}

/// Keeps every callback for later inspection.
#[derive(Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<LoadEvent>>,
}

impl RecordingObserver {
    pub fn events(&self) -> Vec<LoadEvent> {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn push(&self, event: LoadEvent) {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).push(event);
    }
}

impl LoadObserver for RecordingObserver {
    fn phase_changed(&self, attempt: u32, phase: LoadPhase) {
        self.push(LoadEvent::Phase { attempt, phase });
    }

    fn hydrated(&self, detail: &PrefetchedDetail) {
        self.push(LoadEvent::Hydrated { property_slug: detail.property.property.slug.clone() });
    }

    fn retry_scheduled(&self, next_attempt: u32, delay: Duration, error: &LoadError) {
        self.push(LoadEvent::RetryScheduled {
            next_attempt,
            delay_ms: delay.as_millis() as u64,
            error: error.to_string(),
        });
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PropertyPage {
    pub property: PropertyDetail,
    pub broker: BrokerBranding,
    pub similar: Vec<Property>,
    pub social_links: Vec<SocialLink>,
    pub views_count: i64,
    pub attempts: u32,
    pub hydrated_from_cache: bool,
}

pub struct PropertyLoader {
    source: Arc<dyn ListingSource>,
    resolver: DomainResolver,
    cache: Arc<PrefetchCache>,
    views: ViewCounter,
    policy: RetryPolicy,
}

fn ensure_active(cancel: &CancellationToken) -> Result<(), LoadError> {
    if cancel.is_cancelled() { Err(LoadError::Cancelled) } else { Ok(()) }
}

impl PropertyLoader {
    pub fn new(
        source: Arc<dyn ListingSource>,
        resolver: DomainResolver,
        cache: Arc<PrefetchCache>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            views: ViewCounter::new(source.clone()),
            source,
            resolver,
            cache,
            policy,
        }
    }

    pub fn resolver(&self) -> &DomainResolver {
        &self.resolver
    }

    pub fn cache(&self) -> &Arc<PrefetchCache> {
        &self.cache
    }

    /// Runs the page pipeline, restarting from the probe after network-class failures
    /// up to `auto_retries` times.
    pub async fn load(
        &self,
        request: &LoadRequest,
        observer: &dyn LoadObserver,
        cancel: &CancellationToken,
    ) -> Result<PropertyPage, LoadError> {
        let mut attempt: u32 = 1;

        loop {
            match self.load_once(request, attempt, observer, cancel).await {
                Ok(page) => {
                    observer.phase_changed(attempt, LoadPhase::Succeeded);
                    return Ok(page);
                }
                Err(LoadError::Cancelled) => return Err(LoadError::Cancelled),
                Err(e) => {
                    observer.phase_changed(attempt, LoadPhase::Failed);

                    if !e.is_network() || attempt >= self.policy.total_attempts() {
                        return Err(e);
                    }

                    let delay = self.policy.auto_retry_delay;
                    observer.retry_scheduled(attempt + 1, delay, &e);
                    info!(attempt, "Auto-retrying after connection error in {}ms", delay.as_millis());

                    tokio::select! {
                        _ = cancel.cancelled() => return Err(LoadError::Cancelled),
                        _ = sleep(delay) => {}
                    }
                    attempt += 1;
                }
            }
        }
    }

    async fn load_once(
        &self,
        request: &LoadRequest,
        attempt: u32,
        observer: &dyn LoadObserver,
        cancel: &CancellationToken,
    ) -> Result<PropertyPage, LoadError> {
        ensure_active(cancel)?;
        observer.phase_changed(attempt, LoadPhase::Idle);
        observer.phase_changed(attempt, LoadPhase::Probing);
        self.probe(cancel).await?;

        let property_slug = request
            .property_slug
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(LoadError::MissingParameters)?;

        let site = self.resolver.resolve(request.host.as_deref(), request.broker_slug.as_deref()).await?;
        let broker_slug = site.broker_slug.as_str();

        observer.phase_changed(attempt, LoadPhase::Fetching);

        let mut hydrated_from_cache = false;
        if let Some(cached) = self.cache.get(broker_slug, property_slug) {
            ensure_active(cancel)?;
            observer.hydrated(&cached);
            hydrated_from_cache = true;
        }

        debug!(broker_slug, property_slug, "Fetching detail and branding");
        let (detail, branding) = tokio::join!(
            self.source.property_detail(broker_slug, property_slug),
            self.source.broker_branding(broker_slug),
        );

        let rows = match detail {
            Ok(rows) => rows,
            Err(e) => {
                error!("Property detail call failed, trying direct query: {}", e);
                self.fallback(broker_slug, property_slug).await?
            }
        };

        let branding = branding.map_err(|e| {
            error!("Broker branding call failed: {}", e);
            LoadError::BrokerLoad(e.to_string())
        })?;

        let mut property = rows.into_iter().next().ok_or(LoadError::NotFound)?;
        let broker = branding.into_iter().next().ok_or(LoadError::TenantNotFound)?;

        let (similar, social_links) = tokio::join!(
            self.source.similar_properties(
                &broker.id,
                &property.property.property_type,
                &property.property.transaction_type,
                &property.property.id,
                SIMILAR_LIMIT,
            ),
            self.source.social_links(&broker.id),
        );
        let similar = similar.unwrap_or_else(|e| {
            warn!("Similar properties error: {}", e);
            Vec::new()
        });
        let social_links = social_links.unwrap_or_else(|e| {
            warn!("Social links error: {}", e);
            Vec::new()
        });

        ensure_active(cancel)?;
        self.cache.set(
            broker_slug,
            property_slug,
            PrefetchedDetail { property: property.clone(), broker: broker.clone() },
        );

        ensure_active(cancel)?;
        let views_count = if request.skip_view_count {
            property.property.views_count
        } else {
            self.views.record(&property.property.id, property.property.views_count).0
        };
        property.property.views_count = views_count;

        info!(broker_slug, property_slug, attempt, "Property page loaded");

        Ok(PropertyPage {
            property,
            broker,
            similar,
            social_links,
            views_count,
            attempts: attempt,
            hydrated_from_cache,
        })
    }

    /// Sequential connectivity check. Only transport failures count against the budget.
    async fn probe(&self, cancel: &CancellationToken) -> Result<(), LoadError> {
        let mut failures: u32 = 0;

        loop {
            match self.source.probe().await {
                Ok(()) => return Ok(()),
                Err(e) if e.is_network() => {
                    failures += 1;
                    error!(failures, "Connection test failed: {}", e);
                    if failures >= self.policy.probe_attempts {
                        return Err(LoadError::Connectivity(
                            "No connection to the server. Check your internet and try again.".to_string(),
                        ));
                    }

                    let delay = self.policy.probe_backoff(failures);
                    info!("Retrying connection... ({}/{})", failures, self.policy.probe_attempts);
                    tokio::select! {
                        _ = cancel.cancelled() => return Err(LoadError::Cancelled),
                        _ = sleep(delay) => {}
                    }
                }
                Err(e) => {
                    warn!("Connectivity test warning: {}", e);
                    return Ok(());
                }
            }
        }
    }

    async fn fallback(&self, broker_slug: &str, property_slug: &str) -> Result<Vec<PropertyDetail>, LoadError> {
        self.source
            .property_by_slug_direct(broker_slug, property_slug)
            .await
            .map_err(|e| {
                error!("Fallback property query failed: {}", e);
                if e.is_network() {
                    LoadError::Connectivity(e.to_string())
                } else {
                    LoadError::ListingLoad(e.to_string())
                }
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::broker::{Broker, BrokerContact};
    use crate::domain::models::property::NewPropertyParams;
    use crate::error::AppError;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    fn broker() -> BrokerBranding {
        let mut b = Broker::new("Acme".into(), "acme".into(), "a@a.test".into());
        b.id = "broker-1".into();
        BrokerBranding::from(&b)
    }

    fn detail(views: i64) -> PropertyDetail {
        let mut p = Property::new(NewPropertyParams {
            broker_id: "broker-1".into(),
            title: "Casa".into(),
            slug: "casa".into(),
            price: 100.0,
            property_type: "house".into(),
            transaction_type: "sale".into(),
        });
        p.id = "prop-1".into();
        p.views_count = views;
        p.into()
    }

    fn net_err() -> AppError {
        AppError::Connectivity("Failed to fetch: connection refused".into())
    }

    /// Each call pops the next scripted result; an empty script means success.
    #[derive(Default)]
    struct Scripted {
        probe: Mutex<VecDeque<Result<(), AppError>>>,
        detail: Mutex<VecDeque<Result<Vec<PropertyDetail>, AppError>>>,
        fallback: Mutex<VecDeque<Result<Vec<PropertyDetail>, AppError>>>,
        branding: Mutex<VecDeque<Result<Vec<BrokerBranding>, AppError>>>,
        similar_fails: bool,
        views_fail: bool,
        probe_calls: AtomicUsize,
        detail_calls: AtomicUsize,
        fallback_calls: AtomicUsize,
        views_written: Mutex<Vec<i64>>,
        detail_gate: Option<Arc<Notify>>,
    }

    fn pop<T>(q: &Mutex<VecDeque<Result<T, AppError>>>, default: impl FnOnce() -> T) -> Result<T, AppError> {
        q.lock().unwrap().pop_front().unwrap_or_else(|| Ok(default()))
    }

    #[async_trait]
    impl ListingSource for Scripted {
        async fn probe(&self) -> Result<(), AppError> {
            self.probe_calls.fetch_add(1, Ordering::SeqCst);
            pop(&self.probe, || ())
        }
        async fn property_detail(&self, _: &str, _: &str) -> Result<Vec<PropertyDetail>, AppError> {
            self.detail_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.detail_gate {
                gate.notified().await;
            }
            pop(&self.detail, || vec![detail(10)])
        }
        async fn broker_branding(&self, _: &str) -> Result<Vec<BrokerBranding>, AppError> {
            pop(&self.branding, || vec![broker()])
        }
        async fn broker_contact(&self, _: &str) -> Result<Option<BrokerContact>, AppError> {
            Ok(None)
        }
        async fn resolve_broker(&self, _: Option<&str>, _: Option<&str>) -> Result<Option<BrokerBranding>, AppError> {
            Ok(Some(broker()))
        }
        async fn property_by_slug_direct(&self, _: &str, _: &str) -> Result<Vec<PropertyDetail>, AppError> {
            self.fallback_calls.fetch_add(1, Ordering::SeqCst);
            pop(&self.fallback, || vec![detail(3)])
        }
        async fn similar_properties(&self, _: &str, _: &str, _: &str, _: &str, _: i64) -> Result<Vec<Property>, AppError> {
            if self.similar_fails { Err(AppError::Upstream("similar down".into())) } else { Ok(vec![]) }
        }
        async fn social_links(&self, _: &str) -> Result<Vec<SocialLink>, AppError> {
            Ok(vec![])
        }
        async fn update_views_count(&self, _: &str, views: i64) -> Result<(), AppError> {
            self.views_written.lock().unwrap().push(views);
            if self.views_fail { Err(AppError::Upstream("write refused".into())) } else { Ok(()) }
        }
    }

    fn loader(source: Arc<Scripted>) -> PropertyLoader {
        let resolver = DomainResolver::new(source.clone(), "example.com".into(), vec!["www".into()]);
        let cache = Arc::new(PrefetchCache::new(Duration::from_secs(60), 10));
        PropertyLoader::new(source, resolver, cache, RetryPolicy::default())
    }

    fn request() -> LoadRequest {
        LoadRequest {
            host: Some("acme.example.com".into()),
            broker_slug: None,
            property_slug: Some("casa".into()),
            skip_view_count: false,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_happy_path_counts_a_view() {
        let source = Arc::new(Scripted::default());
        let loader = loader(source.clone());

        let page = loader.load(&request(), &NoopObserver, &CancellationToken::new()).await.unwrap();
        assert_eq!(page.views_count, 11);
        assert_eq!(page.property.property.views_count, 11);
        assert_eq!(page.attempts, 1);
        assert!(!page.hydrated_from_cache);
        assert!(loader.cache().get("acme", "casa").is_some(), "fresh pair is cached");
    }

    #[tokio::test(start_paused = true)]
    async fn test_phases_of_a_clean_load() {
        let source = Arc::new(Scripted::default());
        let observer = RecordingObserver::default();
        loader(source).load(&request(), &observer, &CancellationToken::new()).await.unwrap();

        let phases: Vec<_> = observer
            .events()
            .into_iter()
            .filter_map(|e| match e {
                LoadEvent::Phase { phase, .. } => Some(phase),
                _ => None,
            })
            .collect();
        assert_eq!(phases, vec![LoadPhase::Idle, LoadPhase::Probing, LoadPhase::Fetching, LoadPhase::Succeeded]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_skip_view_count_leaves_stored_count() {
        let source = Arc::new(Scripted::default());
        let req = LoadRequest { skip_view_count: true, ..request() };
        let page = loader(source.clone()).load(&req, &NoopObserver, &CancellationToken::new()).await.unwrap();
        assert_eq!(page.views_count, 10);

        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert!(source.views_written.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_view_count_ignores_failed_write() {
        let source = Arc::new(Scripted { views_fail: true, ..Default::default() });
        let page = loader(source.clone()).load(&request(), &NoopObserver, &CancellationToken::new()).await.unwrap();
        assert_eq!(page.views_count, 11);

        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert_eq!(*source.views_written.lock().unwrap(), vec![11]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_probe_failures_exhaust_and_retry_once() {
        let source = Arc::new(Scripted::default());
        {
            let mut probe = source.probe.lock().unwrap();
            for _ in 0..6 {
                probe.push_back(Err(net_err()));
            }
        }
        let observer = RecordingObserver::default();
        let started = tokio::time::Instant::now();

        let err = loader(source.clone()).load(&request(), &observer, &CancellationToken::new()).await.unwrap_err();

        assert!(matches!(err, LoadError::Connectivity(_)));
        assert_eq!(source.probe_calls.load(Ordering::SeqCst), 6, "3 probes per attempt, 2 attempts");
        assert_eq!(source.detail_calls.load(Ordering::SeqCst), 0, "main fetch never attempted");
        // (1s + 2s) backoff per attempt plus the 2s reconnect delay.
        assert_eq!(started.elapsed(), Duration::from_secs(8));

        let retries: Vec<_> = observer.events().into_iter().filter(|e| matches!(e, LoadEvent::RetryScheduled { .. })).collect();
        assert_eq!(retries.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_probe_recovers_within_budget() {
        let source = Arc::new(Scripted::default());
        source.probe.lock().unwrap().extend([Err(net_err()), Err(net_err())]);

        let page = loader(source.clone()).load(&request(), &NoopObserver, &CancellationToken::new()).await.unwrap();
        assert_eq!(page.attempts, 1);
        assert_eq!(source.probe_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_backend_probe_error_does_not_block() {
        let source = Arc::new(Scripted::default());
        source.probe.lock().unwrap().push_back(Err(AppError::Upstream("permission denied".into())));

        let page = loader(source.clone()).load(&request(), &NoopObserver, &CancellationToken::new()).await.unwrap();
        assert_eq!(source.probe_calls.load(Ordering::SeqCst), 1);
        assert_eq!(page.property.property.id, "prop-1");
    }

    #[tokio::test(start_paused = true)]
    async fn test_fallback_runs_once_and_reports_its_error() {
        let source = Arc::new(Scripted::default());
        source.detail.lock().unwrap().push_back(Err(AppError::Upstream("rpc missing".into())));
        source.fallback.lock().unwrap().push_back(Err(AppError::Upstream("row not found".into())));

        let err = loader(source.clone()).load(&request(), &NoopObserver, &CancellationToken::new()).await.unwrap_err();
        assert_eq!(source.fallback_calls.load(Ordering::SeqCst), 1);
        assert_eq!(err, LoadError::ListingLoad("Upstream error: row not found".into()));
        assert_eq!(source.detail_calls.load(Ordering::SeqCst), 1, "non-network errors never auto-retry");
    }

    #[tokio::test(start_paused = true)]
    async fn test_fallback_row_is_used() {
        let source = Arc::new(Scripted::default());
        source.detail.lock().unwrap().push_back(Err(AppError::Upstream("rpc missing".into())));

        let page = loader(source.clone()).load(&request(), &NoopObserver, &CancellationToken::new()).await.unwrap();
        assert_eq!(page.views_count, 4);
        assert_eq!(source.fallback_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_rows_map_to_not_found_kinds() {
        let source = Arc::new(Scripted::default());
        source.detail.lock().unwrap().push_back(Ok(vec![]));
        let err = loader(source).load(&request(), &NoopObserver, &CancellationToken::new()).await.unwrap_err();
        assert_eq!(err, LoadError::NotFound);

        let source = Arc::new(Scripted::default());
        source.branding.lock().unwrap().push_back(Ok(vec![]));
        let err = loader(source).load(&request(), &NoopObserver, &CancellationToken::new()).await.unwrap_err();
        assert_eq!(err, LoadError::TenantNotFound);

        let source = Arc::new(Scripted::default());
        source.branding.lock().unwrap().push_back(Err(AppError::Upstream("boom".into())));
        let err = loader(source).load(&request(), &NoopObserver, &CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, LoadError::BrokerLoad(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_network_error_retries_once_after_delay() {
        let source = Arc::new(Scripted::default());
        source.detail.lock().unwrap().push_back(Err(net_err()));
        source.fallback.lock().unwrap().push_back(Err(net_err()));
        let observer = RecordingObserver::default();
        let started = tokio::time::Instant::now();

        let page = loader(source.clone()).load(&request(), &observer, &CancellationToken::new()).await.unwrap();
        assert_eq!(page.attempts, 2);
        assert_eq!(started.elapsed(), Duration::from_secs(2));
        assert!(observer.events().contains(&LoadEvent::Phase { attempt: 1, phase: LoadPhase::Failed }));
        assert!(observer.events().contains(&LoadEvent::Phase { attempt: 2, phase: LoadPhase::Succeeded }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_side_channel_errors_are_swallowed() {
        let source = Arc::new(Scripted { similar_fails: true, ..Default::default() });
        let page = loader(source).load(&request(), &NoopObserver, &CancellationToken::new()).await.unwrap();
        assert!(page.similar.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cached_pair_is_painted_before_fetch_resolves() {
        let gate = Arc::new(Notify::new());
        let source = Arc::new(Scripted { detail_gate: Some(gate.clone()), ..Default::default() });
        let loader = Arc::new(loader(source.clone()));
        loader.cache().set("acme", "casa", PrefetchedDetail { property: detail(1), broker: broker() });

        let observer = Arc::new(RecordingObserver::default());
        let task = {
            let (loader, observer) = (loader.clone(), observer.clone());
            tokio::spawn(async move { loader.load(&request(), observer.as_ref(), &CancellationToken::new()).await })
        };

        while source.detail_calls.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }
        assert!(observer.events().contains(&LoadEvent::Hydrated { property_slug: "casa".into() }));

        gate.notify_one();
        let page = task.await.unwrap().unwrap();
        assert!(page.hydrated_from_cache);
        assert_eq!(page.views_count, 11, "network data replaces the cached copy");
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_stops_retry_wait() {
        let source = Arc::new(Scripted::default());
        source.probe.lock().unwrap().push_back(Err(net_err()));
        let cancel = CancellationToken::new();
        let loader = Arc::new(loader(source.clone()));

        let task = {
            let (loader, cancel) = (loader.clone(), cancel.clone());
            tokio::spawn(async move { loader.load(&request(), &NoopObserver, &cancel).await })
        };
        tokio::task::yield_now().await;
        cancel.cancel();

        assert_eq!(task.await.unwrap().unwrap_err(), LoadError::Cancelled);
        assert!(source.views_written.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_property_slug() {
        let source = Arc::new(Scripted::default());
        let req = LoadRequest { property_slug: None, ..request() };
        let err = loader(source).load(&req, &NoopObserver, &CancellationToken::new()).await.unwrap_err();
        assert_eq!(err, LoadError::MissingParameters);
    }
}
