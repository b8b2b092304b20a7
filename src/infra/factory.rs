use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use sqlx::{postgres::{PgPoolOptions, PgConnectOptions}, sqlite::{SqlitePoolOptions, SqliteJournalMode, SqliteConnectOptions}};
use sqlx::{PgPool, SqlitePool, ConnectOptions};
use tracing::info;
use tracing::log::LevelFilter;

use crate::config::Config;
use crate::state::AppState;
use crate::domain::ports::{
    BrokerRepository, LeadRepository, ListingSource, PreferenceRepository, PropertyRepository,
    RealtorRepository, SocialLinkRepository, UserRepository,
};
use crate::domain::services::{
    auth_service::AuthService,
    domain_resolver::DomainResolver,
    prefetch_cache::PrefetchCache,
    preferences::PreferenceService,
    property_loader::PropertyLoader,
    retry_policy::RetryPolicy,
};
use crate::infra::listing::{
    postgrest_listing_source::PostgrestListingSource, repo_listing_source::RepoListingSource,
};
use crate::infra::repositories::{
    postgres_broker_repo::PostgresBrokerRepo, postgres_lead_repo::PostgresLeadRepo,
    postgres_preference_repo::PostgresPreferenceRepo, postgres_property_repo::PostgresPropertyRepo,
    postgres_realtor_repo::PostgresRealtorRepo, postgres_social_link_repo::PostgresSocialLinkRepo,
    postgres_user_repo::PostgresUserRepo,
    sqlite_broker_repo::SqliteBrokerRepo, sqlite_lead_repo::SqliteLeadRepo,
    sqlite_preference_repo::SqlitePreferenceRepo, sqlite_property_repo::SqlitePropertyRepo,
    sqlite_realtor_repo::SqliteRealtorRepo, sqlite_social_link_repo::SqliteSocialLinkRepo,
    sqlite_user_repo::SqliteUserRepo,
};

/// Storage handles for one database backend.
pub struct Repositories {
    pub brokers: Arc<dyn BrokerRepository>,
    pub users: Arc<dyn UserRepository>,
    pub properties: Arc<dyn PropertyRepository>,
    pub leads: Arc<dyn LeadRepository>,
    pub realtors: Arc<dyn RealtorRepository>,
    pub social_links: Arc<dyn SocialLinkRepository>,
    pub preferences: Arc<dyn PreferenceRepository>,
}

impl Repositories {
    pub fn sqlite(pool: SqlitePool) -> Self {
        Self {
            brokers: Arc::new(SqliteBrokerRepo::new(pool.clone())),
            users: Arc::new(SqliteUserRepo::new(pool.clone())),
            properties: Arc::new(SqlitePropertyRepo::new(pool.clone())),
            leads: Arc::new(SqliteLeadRepo::new(pool.clone())),
            realtors: Arc::new(SqliteRealtorRepo::new(pool.clone())),
            social_links: Arc::new(SqliteSocialLinkRepo::new(pool.clone())),
            preferences: Arc::new(SqlitePreferenceRepo::new(pool)),
        }
    }

    pub fn postgres(pool: PgPool) -> Self {
        Self {
            brokers: Arc::new(PostgresBrokerRepo::new(pool.clone())),
            users: Arc::new(PostgresUserRepo::new(pool.clone())),
            properties: Arc::new(PostgresPropertyRepo::new(pool.clone())),
            leads: Arc::new(PostgresLeadRepo::new(pool.clone())),
            realtors: Arc::new(PostgresRealtorRepo::new(pool.clone())),
            social_links: Arc::new(PostgresSocialLinkRepo::new(pool.clone())),
            preferences: Arc::new(PostgresPreferenceRepo::new(pool)),
        }
    }
}

/// The hosted listing backend when configured, otherwise the local tables.
pub fn listing_source_for(config: &Config, repos: &Repositories) -> Arc<dyn ListingSource> {
    match (&config.listing_backend_url, &config.listing_backend_key) {
        (Some(url), Some(key)) => {
            info!("Public pages read from hosted listing backend at {}", url);
            Arc::new(PostgrestListingSource::new(url.clone(), key.clone()))
        }
        _ => Arc::new(RepoListingSource::new(
            repos.brokers.clone(),
            repos.properties.clone(),
            repos.social_links.clone(),
        )),
    }
}

pub fn assemble_state(config: &Config, repos: Repositories, listing_source: Arc<dyn ListingSource>) -> AppState {
    let cache = Arc::new(PrefetchCache::new(
        Duration::from_secs(config.prefetch_ttl_secs),
        config.prefetch_capacity,
    ));
    let resolver = DomainResolver::new(
        listing_source.clone(),
        config.base_domain.clone(),
        config.reserved_subdomains.clone(),
    );
    let loader = PropertyLoader::new(listing_source.clone(), resolver, cache, RetryPolicy::from(config));

    AppState {
        config: config.clone(),
        broker_repo: repos.brokers,
        user_repo: repos.users,
        property_repo: repos.properties,
        lead_repo: repos.leads,
        realtor_repo: repos.realtors,
        social_link_repo: repos.social_links,
        listing_source,
        auth_service: Arc::new(AuthService::new(config.clone())),
        loader: Arc::new(loader),
        preferences: Arc::new(PreferenceService::new(repos.preferences)),
    }
}

pub async fn bootstrap_state(config: &Config) -> AppState {
    let database_url = &config.database_url;

    let repos = if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        info!("Initializing PostgreSQL connection...");

        let mut opts: PgConnectOptions = database_url.parse().expect("Invalid Postgres URL");
        opts = opts.log_statements(LevelFilter::Debug)
            .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect_with(opts)
            .await
            .expect("Failed to connect to Postgres");

        run_postgres_migrations(&pool).await;
        Repositories::postgres(pool)
    } else {
        info!("Initializing SQLite connection with WAL Mode...");

        let opts = SqliteConnectOptions::from_str(database_url)
            .expect("Invalid SQLite connection string")
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5))
            .log_statements(LevelFilter::Debug)
            .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(opts)
            .await
            .expect("Failed to connect to SQLite");

        run_sqlite_migrations(&pool).await;
        Repositories::sqlite(pool)
    };

    let listing_source = listing_source_for(config, &repos);
    assemble_state(config, repos, listing_source)
}

async fn run_postgres_migrations(pool: &PgPool) {
    sqlx::migrate!("./migrations/postgres")
        .run(pool)
        .await
        .expect("Failed to run Postgres migrations");
}

pub async fn run_sqlite_migrations(pool: &SqlitePool) {
    sqlx::migrate!("./migrations/sqlite")
        .run(pool)
        .await
        .expect("Failed to run SQLite migrations");
}
