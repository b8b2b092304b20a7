use std::env;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub base_domain: String,
    pub public_site_url: String,
    pub reserved_subdomains: Vec<String>,
    pub listing_backend_url: Option<String>,
    pub listing_backend_key: Option<String>,
    pub prefetch_ttl_secs: u64,
    pub prefetch_capacity: usize,
    pub probe_attempts: u32,
    pub probe_backoff_ms: u64,
    pub auto_retries: u32,
    pub auto_retry_delay_ms: u64,
    pub enable_debug_routes: bool,
    pub jwt_secret_key: String, // Private key (PEM)
    pub jwt_public_key: String, // Public key (PEM)
    pub auth_issuer: String,
    pub dns_a_record: String,
}

pub const DEFAULT_RESERVED_SUBDOMAINS: [&str; 5] = ["admin", "www", "api", "app", "mail"];

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            port: env::var("PORT").unwrap_or_else(|_| "3000".to_string()).parse().expect("PORT must be a number"),
            base_domain: env::var("BASE_DOMAIN").unwrap_or_else(|_| "localhost".to_string()).to_lowercase(),
            public_site_url: env::var("PUBLIC_SITE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string()),
            reserved_subdomains: env::var("RESERVED_SUBDOMAINS")
                .map(|v| parse_list(&v))
                .unwrap_or_else(|_| DEFAULT_RESERVED_SUBDOMAINS.iter().map(|s| s.to_string()).collect()),
            listing_backend_url: env::var("LISTING_BACKEND_URL").ok().filter(|v| !v.is_empty()),
            listing_backend_key: env::var("LISTING_BACKEND_KEY").ok().filter(|v| !v.is_empty()),
            prefetch_ttl_secs: parse_or("PREFETCH_TTL_SECS", 60),
            prefetch_capacity: parse_or("PREFETCH_CAPACITY", 500),
            probe_attempts: parse_or("PROBE_ATTEMPTS", 3),
            probe_backoff_ms: parse_or("PROBE_BACKOFF_MS", 1000),
            auto_retries: parse_or("AUTO_RETRIES", 1),
            auto_retry_delay_ms: parse_or("AUTO_RETRY_DELAY_MS", 2000),
            enable_debug_routes: env::var("ENABLE_DEBUG_ROUTES").map(|v| v == "true" || v == "1").unwrap_or(false),
            jwt_secret_key: env::var("JWT_SECRET_KEY").expect("JWT_SECRET_KEY must be set (Ed25519 Private Key)"),
            jwt_public_key: env::var("JWT_PUBLIC_KEY").expect("JWT_PUBLIC_KEY must be set (Ed25519 Public Key)"),
            auth_issuer: env::var("AUTH_ISSUER").unwrap_or_else(|_| "https://api.listings.local".to_string()),
            dns_a_record: env::var("DNS_A_RECORD").unwrap_or_else(|_| "162.159.140.98".to_string()),
        }
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(v) => v.parse().unwrap_or_else(|_| panic!("{} must be a number", key)),
        Err(_) => default,
    }
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}
