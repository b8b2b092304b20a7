use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use sqlx::types::Json;

#[derive(Debug, Serialize, Deserialize, FromRow, Clone, PartialEq)]
pub struct Property {
    pub id: String,
    pub broker_id: String,
    pub realtor_id: Option<String>,
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    pub price: f64,
    pub property_type: String,
    pub transaction_type: String,
    pub status: String,
    pub address: Option<String>,
    pub neighborhood: Option<String>,
    pub city: Option<String>,
    pub uf: Option<String>,
    pub bedrooms: Option<i32>,
    pub bathrooms: Option<i32>,
    pub parking_spaces: Option<i32>,
    pub area_m2: Option<f64>,
    pub hoa_fee: Option<f64>,
    pub hoa_periodicity: Option<String>,
    pub iptu_value: Option<f64>,
    pub iptu_periodicity: Option<String>,
    pub property_code: Option<String>,
    pub main_image_url: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub images: Json<Vec<String>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub features: Json<Vec<String>>,
    pub is_active: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_featured: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub views_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Hosted rows may carry explicit nulls for counters and collections.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

pub struct NewPropertyParams {
    pub broker_id: String,
    pub title: String,
    pub slug: String,
    pub price: f64,
    pub property_type: String,
    pub transaction_type: String,
}

impl Property {
    pub fn new(params: NewPropertyParams) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            broker_id: params.broker_id,
            realtor_id: None,
            title: params.title,
            slug: params.slug,
            description: None,
            price: params.price,
            property_type: params.property_type,
            transaction_type: params.transaction_type,
            status: "active".to_string(),
            address: None,
            neighborhood: None,
            city: None,
            uf: None,
            bedrooms: None,
            bathrooms: None,
            parking_spaces: None,
            area_m2: None,
            hoa_fee: None,
            hoa_periodicity: None,
            iptu_value: None,
            iptu_periodicity: None,
            property_code: None,
            main_image_url: None,
            images: Json(Vec::new()),
            features: Json(Vec::new()),
            is_active: true,
            is_featured: false,
            views_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Short reference shown to visitors: the broker's code or the id tail.
    pub fn reference_code(&self) -> String {
        match self.property_code.as_deref().map(str::trim) {
            Some(code) if !code.is_empty() => code.to_string(),
            _ => {
                let chars: Vec<char> = self.id.chars().collect();
                chars[chars.len().saturating_sub(8)..].iter().collect()
            }
        }
    }
}

/// Listing row joined with the assigned realtor, as served on the detail page.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone, PartialEq)]
pub struct PropertyDetail {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub property: Property,
    pub realtor_name: Option<String>,
    pub realtor_avatar_url: Option<String>,
    pub realtor_creci: Option<String>,
    pub realtor_whatsapp_button_text: Option<String>,
}

impl From<Property> for PropertyDetail {
    fn from(property: Property) -> Self {
        Self {
            property,
            realtor_name: None,
            realtor_avatar_url: None,
            realtor_creci: None,
            realtor_whatsapp_button_text: None,
        }
    }
}

#[derive(Debug, Default, Deserialize, Clone)]
pub struct PropertyFilter {
    pub status: Option<String>,
    pub property_type: Option<String>,
    pub transaction_type: Option<String>,
    pub city: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub bedrooms: Option<i32>,
    #[serde(default)]
    pub active_only: bool,
}
