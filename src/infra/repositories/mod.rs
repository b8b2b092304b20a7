pub mod sqlite_broker_repo;
pub mod sqlite_user_repo;
pub mod sqlite_property_repo;
pub mod sqlite_lead_repo;
pub mod sqlite_realtor_repo;
pub mod sqlite_social_link_repo;
pub mod sqlite_preference_repo;

pub mod postgres_broker_repo;
pub mod postgres_user_repo;
pub mod postgres_property_repo;
pub mod postgres_lead_repo;
pub mod postgres_realtor_repo;
pub mod postgres_social_link_repo;
pub mod postgres_preference_repo;
