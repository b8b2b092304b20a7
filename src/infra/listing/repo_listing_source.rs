use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::models::{
    broker::{BrokerBranding, BrokerContact},
    property::{Property, PropertyDetail},
    social_link::SocialLink,
};
use crate::domain::ports::{BrokerRepository, ListingSource, PropertyRepository, SocialLinkRepository};
use crate::error::AppError;

/// Serves the public read model straight from the local database.
pub struct RepoListingSource {
    brokers: Arc<dyn BrokerRepository>,
    properties: Arc<dyn PropertyRepository>,
    social_links: Arc<dyn SocialLinkRepository>,
}

impl RepoListingSource {
    pub fn new(
        brokers: Arc<dyn BrokerRepository>,
        properties: Arc<dyn PropertyRepository>,
        social_links: Arc<dyn SocialLinkRepository>,
    ) -> Self {
        Self { brokers, properties, social_links }
    }
}

/// Pool and IO failures surface as connectivity errors so the loader can retry them.
fn classify(e: AppError) -> AppError {
    if e.is_network() && !matches!(e, AppError::Connectivity(_)) {
        AppError::Connectivity(format!("Failed to fetch: {}", e))
    } else {
        e
    }
}

#[async_trait]
impl ListingSource for RepoListingSource {
    async fn probe(&self) -> Result<(), AppError> {
        self.properties.probe().await.map_err(classify)
    }

    async fn property_detail(&self, broker_slug: &str, property_slug: &str) -> Result<Vec<PropertyDetail>, AppError> {
        self.properties.find_public_detail(broker_slug, property_slug).await.map_err(classify)
    }

    async fn broker_branding(&self, broker_slug: &str) -> Result<Vec<BrokerBranding>, AppError> {
        let broker = self.brokers.find_by_slug(broker_slug).await.map_err(classify)?;
        Ok(broker.filter(|b| b.is_active).map(|b| BrokerBranding::from(&b)).into_iter().collect())
    }

    async fn broker_contact(&self, broker_slug: &str) -> Result<Option<BrokerContact>, AppError> {
        let broker = self.brokers.find_by_slug(broker_slug).await.map_err(classify)?;
        Ok(broker.filter(|b| b.is_active).map(|b| BrokerContact::from(&b)))
    }

    async fn resolve_broker(&self, domain: Option<&str>, slug: Option<&str>) -> Result<Option<BrokerBranding>, AppError> {
        let broker = match (domain, slug) {
            (Some(domain), _) => self.brokers.find_by_custom_domain(domain).await,
            (None, Some(slug)) => self.brokers.find_by_slug(slug).await,
            (None, None) => return Ok(None),
        }
        .map_err(classify)?;
        Ok(broker.filter(|b| b.is_active).map(|b| BrokerBranding::from(&b)))
    }

    async fn property_by_slug_direct(&self, broker_slug: &str, property_slug: &str) -> Result<Vec<PropertyDetail>, AppError> {
        let rows = self.properties.find_by_broker_slug_direct(broker_slug, property_slug).await.map_err(classify)?;
        Ok(rows.into_iter().map(PropertyDetail::from).collect())
    }

    async fn similar_properties(
        &self,
        broker_id: &str,
        property_type: &str,
        transaction_type: &str,
        exclude_id: &str,
        limit: i64,
    ) -> Result<Vec<Property>, AppError> {
        self.properties
            .find_similar(broker_id, property_type, transaction_type, exclude_id, limit)
            .await
            .map_err(classify)
    }

    async fn social_links(&self, broker_id: &str) -> Result<Vec<SocialLink>, AppError> {
        self.social_links.list_active(broker_id).await.map_err(classify)
    }

    async fn update_views_count(&self, property_id: &str, views: i64) -> Result<(), AppError> {
        self.properties.set_views_count(property_id, views).await.map_err(classify)
    }
}
