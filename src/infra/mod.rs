pub mod factory;
pub mod listing;
pub mod repositories;
