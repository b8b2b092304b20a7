use serde::Deserialize;

/// Page is at least 1 and limit within `1..=100`.
pub fn page_window(page: Option<i64>, limit: Option<i64>, default_limit: i64) -> (i64, i64) {
    (page.unwrap_or(1).max(1), limit.unwrap_or(default_limit).clamp(1, 100))
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct CreateBrokerRequest {
    pub business_name: String,
    pub email: String,
    pub website_slug: Option<String>,
    pub password: Option<String>,
}

/// `custom_domain: ""` clears the domain; absent fields are left untouched.
#[derive(Deserialize, Default)]
pub struct UpdateBrokerRequest {
    pub business_name: Option<String>,
    pub display_name: Option<String>,
    pub website_slug: Option<String>,
    pub custom_domain: Option<String>,
    pub contact_email: Option<String>,
    pub whatsapp_number: Option<String>,
    pub creci: Option<String>,
    pub primary_color: Option<String>,
    pub secondary_color: Option<String>,
    pub logo_url: Option<String>,
    pub site_title: Option<String>,
    pub site_description: Option<String>,
    pub property_title_template: Option<String>,
    pub property_description_template: Option<String>,
    pub canonical_prefer_custom_domain: Option<bool>,
}

#[derive(Deserialize, Default)]
pub struct PropertyRequest {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub property_type: Option<String>,
    pub transaction_type: Option<String>,
    pub status: Option<String>,
    pub realtor_id: Option<String>,
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
    pub images: Option<Vec<String>>,
    pub features: Option<Vec<String>>,
    pub is_active: Option<bool>,
    pub is_featured: Option<bool>,
}

#[derive(Deserialize)]
pub struct CreateLeadRequest {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub message: Option<String>,
    pub property_id: Option<String>,
    pub source: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateLeadStatusRequest {
    pub status: String,
}

#[derive(Deserialize)]
pub struct UpdateLeadDealRequest {
    pub deal_value: Option<f64>,
    pub commission_value: Option<f64>,
}

#[derive(Deserialize)]
pub struct AssignRealtorRequest {
    pub realtor_id: Option<String>,
}

#[derive(Deserialize, Default)]
pub struct RealtorRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub creci: Option<String>,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub whatsapp_button_text: Option<String>,
    pub commission_percentage: Option<f64>,
    pub is_active: Option<bool>,
}

#[derive(Deserialize)]
pub struct CreateSocialLinkRequest {
    pub platform: String,
    pub url: String,
    pub display_order: Option<i32>,
}

#[derive(Deserialize)]
pub struct DarkModeRequest {
    pub enabled: bool,
}
