pub mod auth_service;
pub mod domain_resolver;
pub mod preferences;
pub mod prefetch_cache;
pub mod property_loader;
pub mod retry_policy;
pub mod seo;
pub mod share;
pub mod slug;
pub mod view_counter;
