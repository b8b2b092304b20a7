pub mod postgrest_listing_source;
pub mod repo_listing_source;
