pub mod auth;
pub mod broker;
pub mod lead;
pub mod preferences;
pub mod property;
pub mod realtor;
pub mod social_link;
pub mod user;
