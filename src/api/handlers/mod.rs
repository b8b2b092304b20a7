pub mod auth;
pub mod broker;
pub mod debug;
pub mod health;
pub mod lead;
pub mod preferences;
pub mod property;
pub mod realtor;
pub mod site;
pub mod site_host;
pub mod site_path;
pub mod social_link;
