use std::sync::Arc;
use crate::domain::ports::{
    BrokerRepository, LeadRepository, ListingSource, PropertyRepository, RealtorRepository,
    SocialLinkRepository, UserRepository,
};
use crate::domain::services::{
    auth_service::AuthService, preferences::PreferenceService, property_loader::PropertyLoader,
};
use crate::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub broker_repo: Arc<dyn BrokerRepository>,
    pub user_repo: Arc<dyn UserRepository>,
    pub property_repo: Arc<dyn PropertyRepository>,
    pub lead_repo: Arc<dyn LeadRepository>,
    pub realtor_repo: Arc<dyn RealtorRepository>,
    pub social_link_repo: Arc<dyn SocialLinkRepository>,
    pub listing_source: Arc<dyn ListingSource>,
    pub auth_service: Arc<AuthService>,
    pub loader: Arc<PropertyLoader>,
    pub preferences: Arc<PreferenceService>,
}
