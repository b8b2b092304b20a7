use serde::Serialize;

use crate::domain::models::{
    broker::{Broker, BrokerBranding, BrokerContact},
    property::{Property, PropertyDetail},
    social_link::SocialLink,
};
use crate::domain::services::{seo::SeoMeta, share::ShareInfo};

#[derive(Serialize)]
pub struct Paginated<T: Serialize> {
    pub data: Vec<T>,
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub has_more: bool,
}

impl<T: Serialize> Paginated<T> {
    pub fn new(data: Vec<T>, page: i64, limit: i64, total: i64) -> Self {
        Self { has_more: page * limit < total, data, page, limit, total }
    }
}

#[derive(Serialize)]
pub struct BrokerCreatedResponse {
    pub broker: Broker,
    pub admin_email: String,
    /// Present only when the password was generated server-side.
    pub admin_secret: Option<String>,
}

#[derive(Serialize)]
pub struct SiteResponse {
    pub broker: BrokerBranding,
    pub contact: Option<BrokerContact>,
    pub social_links: Vec<SocialLink>,
}

#[derive(Serialize)]
pub struct PropertyPageResponse {
    pub property: PropertyDetail,
    pub broker: BrokerBranding,
    pub similar: Vec<Property>,
    pub social_links: Vec<SocialLink>,
    pub views_count: i64,
    pub seo: SeoMeta,
    pub share: ShareInfo,
    pub attempts: u32,
    pub hydrated_from_cache: bool,
}

#[derive(Serialize)]
pub struct FavoriteAddedResponse {
    pub status: &'static str,
    pub total: usize,
}
