use crate::domain::models::{
    broker::{Broker, BrokerBranding, BrokerContact},
    lead::{Lead, LeadFilter},
    property::{Property, PropertyDetail, PropertyFilter},
    realtor::Realtor,
    social_link::SocialLink,
    user::User,
};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[async_trait]
pub trait BrokerRepository: Send + Sync {
    async fn create(&self, broker: &Broker) -> Result<Broker, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Broker>, AppError>;
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Broker>, AppError>;
    async fn find_by_custom_domain(&self, domain: &str) -> Result<Option<Broker>, AppError>;
    async fn update(&self, broker: &Broker) -> Result<Broker, AppError>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: &User) -> Result<User, AppError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn find_by_id(&self, broker_id: &str, id: &str) -> Result<Option<User>, AppError>;
}

#[async_trait]
pub trait PropertyRepository: Send + Sync {
    async fn create(&self, property: &Property) -> Result<Property, AppError>;
    async fn find_by_id(&self, broker_id: &str, id: &str) -> Result<Option<Property>, AppError>;
    async fn find_by_slug(&self, broker_id: &str, slug: &str) -> Result<Option<Property>, AppError>;
    /// Returns one page plus the total match count.
    async fn list(&self, broker_id: &str, filter: &PropertyFilter, page: i64, limit: i64) -> Result<(Vec<Property>, i64), AppError>;
    async fn update(&self, property: &Property) -> Result<Property, AppError>;
    async fn delete(&self, broker_id: &str, id: &str) -> Result<(), AppError>;
    async fn find_similar(&self, broker_id: &str, property_type: &str, transaction_type: &str, exclude_id: &str, limit: i64) -> Result<Vec<Property>, AppError>;
    async fn set_views_count(&self, id: &str, views: i64) -> Result<(), AppError>;
    async fn probe(&self) -> Result<(), AppError>;
    async fn find_public_detail(&self, broker_slug: &str, property_slug: &str) -> Result<Vec<PropertyDetail>, AppError>;
    async fn find_by_broker_slug_direct(&self, broker_slug: &str, property_slug: &str) -> Result<Vec<Property>, AppError>;
}

#[async_trait]
pub trait LeadRepository: Send + Sync {
    async fn create(&self, lead: &Lead) -> Result<Lead, AppError>;
    async fn find_by_id(&self, broker_id: &str, id: &str) -> Result<Option<Lead>, AppError>;
    async fn list(&self, broker_id: &str, filter: &LeadFilter, page: i64, limit: i64) -> Result<(Vec<Lead>, i64), AppError>;
    async fn list_all(&self, broker_id: &str) -> Result<Vec<Lead>, AppError>;
    async fn update(&self, lead: &Lead) -> Result<Lead, AppError>;
    async fn delete(&self, broker_id: &str, id: &str) -> Result<(), AppError>;
    async fn find_recent_by_email(&self, broker_id: &str, email: &str, since: DateTime<Utc>) -> Result<Option<Lead>, AppError>;
}

#[async_trait]
pub trait RealtorRepository: Send + Sync {
    async fn create(&self, realtor: &Realtor) -> Result<Realtor, AppError>;
    async fn find_by_id(&self, broker_id: &str, id: &str) -> Result<Option<Realtor>, AppError>;
    async fn list(&self, broker_id: &str) -> Result<Vec<Realtor>, AppError>;
    async fn update(&self, realtor: &Realtor) -> Result<Realtor, AppError>;
    async fn delete(&self, broker_id: &str, id: &str) -> Result<(), AppError>;
}

#[async_trait]
pub trait SocialLinkRepository: Send + Sync {
    async fn create(&self, link: &SocialLink) -> Result<SocialLink, AppError>;
    async fn list(&self, broker_id: &str) -> Result<Vec<SocialLink>, AppError>;
    async fn list_active(&self, broker_id: &str) -> Result<Vec<SocialLink>, AppError>;
    async fn delete(&self, broker_id: &str, id: &str) -> Result<(), AppError>;
}

#[async_trait]
pub trait PreferenceRepository: Send + Sync {
    async fn get(&self, visitor_id: &str, key: &str) -> Result<Option<String>, AppError>;
    async fn set(&self, visitor_id: &str, key: &str, value: &str) -> Result<(), AppError>;
    async fn remove(&self, visitor_id: &str, key: &str) -> Result<(), AppError>;
}

/// Read side of the hosted listing backend used by the public microsites.
///
/// Row-returning calls mirror the RPC contract: an empty vector is a miss, not an error.
#[async_trait]
pub trait ListingSource: Send + Sync {
    /// Cheap `limit 1` read used as a connectivity check.
    async fn probe(&self) -> Result<(), AppError>;
    async fn property_detail(&self, broker_slug: &str, property_slug: &str) -> Result<Vec<PropertyDetail>, AppError>;
    async fn broker_branding(&self, broker_slug: &str) -> Result<Vec<BrokerBranding>, AppError>;
    async fn broker_contact(&self, broker_slug: &str) -> Result<Option<BrokerContact>, AppError>;
    async fn resolve_broker(&self, domain: Option<&str>, slug: Option<&str>) -> Result<Option<BrokerBranding>, AppError>;
    async fn property_by_slug_direct(&self, broker_slug: &str, property_slug: &str) -> Result<Vec<PropertyDetail>, AppError>;
    async fn similar_properties(
        &self,
        broker_id: &str,
        property_type: &str,
        transaction_type: &str,
        exclude_id: &str,
        limit: i64,
    ) -> Result<Vec<Property>, AppError>;
    async fn social_links(&self, broker_id: &str) -> Result<Vec<SocialLink>, AppError>;
    async fn update_views_count(&self, property_id: &str, views: i64) -> Result<(), AppError>;
}
