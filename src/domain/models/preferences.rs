use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

use super::broker::BrokerBranding;
use super::property::Property;

/// Snapshot of a listing saved by a visitor, rendered without refetching.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct FavoriteProperty {
    pub id: String,
    pub slug: String,
    pub title: String,
    pub price: f64,
    pub main_image_url: Option<String>,
    pub property_type: String,
    pub transaction_type: String,
    pub bedrooms: Option<i32>,
    pub bathrooms: Option<i32>,
    pub area_m2: Option<f64>,
    pub city: Option<String>,
    pub neighborhood: Option<String>,
    pub broker_slug: String,
    pub favorited_at: DateTime<Utc>,
}

impl FavoriteProperty {
    pub fn snapshot(property: &Property, broker: &BrokerBranding) -> Self {
        Self {
            id: property.id.clone(),
            slug: property.slug.clone(),
            title: property.title.clone(),
            price: property.price,
            main_image_url: property.main_image_url.clone(),
            property_type: property.property_type.clone(),
            transaction_type: property.transaction_type.clone(),
            bedrooms: property.bedrooms,
            bathrooms: property.bathrooms,
            area_m2: property.area_m2,
            city: property.city.clone(),
            neighborhood: property.neighborhood.clone(),
            broker_slug: broker.website_slug.clone(),
            favorited_at: Utc::now(),
        }
    }
}

#[derive(Debug, Serialize, Clone, Default, PartialEq)]
pub struct VisitorPreferences {
    pub dark_mode: bool,
    pub favorites: Vec<FavoriteProperty>,
}
