use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Broker {
    pub id: String,
    pub business_name: String,
    pub display_name: Option<String>,
    pub website_slug: String,
    pub custom_domain: Option<String>,
    pub email: String,
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
    pub canonical_prefer_custom_domain: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Broker {
    pub fn new(business_name: String, website_slug: String, email: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            business_name,
            display_name: None,
            website_slug,
            custom_domain: None,
            email,
            contact_email: None,
            whatsapp_number: None,
            creci: None,
            primary_color: None,
            secondary_color: None,
            logo_url: None,
            site_title: None,
            site_description: None,
            property_title_template: None,
            property_description_template: None,
            canonical_prefer_custom_domain: true,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Public branding row served to microsite visitors.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone, PartialEq)]
pub struct BrokerBranding {
    pub id: String,
    pub business_name: String,
    pub display_name: Option<String>,
    pub website_slug: String,
    pub custom_domain: Option<String>,
    pub primary_color: Option<String>,
    pub secondary_color: Option<String>,
    pub logo_url: Option<String>,
    pub site_title: Option<String>,
    pub site_description: Option<String>,
    pub property_title_template: Option<String>,
    pub property_description_template: Option<String>,
    #[serde(default = "default_true")]
    pub canonical_prefer_custom_domain: bool,
}

fn default_true() -> bool {
    true
}

impl BrokerBranding {
    pub fn name(&self) -> &str {
        self.display_name.as_deref().filter(|n| !n.trim().is_empty()).unwrap_or(&self.business_name)
    }

    /// Origin used for canonical links. `public_site_url` is the shared platform origin.
    pub fn canonical_property_url(&self, public_site_url: &str, property_slug: &str) -> String {
        match (&self.custom_domain, self.canonical_prefer_custom_domain) {
            (Some(domain), true) if !domain.is_empty() => format!("https://{}/{}", domain, property_slug),
            _ => format!("{}/{}/{}", public_site_url.trim_end_matches('/'), self.website_slug, property_slug),
        }
    }
}

impl From<&Broker> for BrokerBranding {
    fn from(b: &Broker) -> Self {
        Self {
            id: b.id.clone(),
            business_name: b.business_name.clone(),
            display_name: b.display_name.clone(),
            website_slug: b.website_slug.clone(),
            custom_domain: b.custom_domain.clone(),
            primary_color: b.primary_color.clone(),
            secondary_color: b.secondary_color.clone(),
            logo_url: b.logo_url.clone(),
            site_title: b.site_title.clone(),
            site_description: b.site_description.clone(),
            property_title_template: b.property_title_template.clone(),
            property_description_template: b.property_description_template.clone(),
            canonical_prefer_custom_domain: b.canonical_prefer_custom_domain,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct BrokerContact {
    pub whatsapp_number: Option<String>,
    pub contact_email: Option<String>,
    pub creci: Option<String>,
}

impl From<&Broker> for BrokerContact {
    fn from(b: &Broker) -> Self {
        Self {
            whatsapp_number: b.whatsapp_number.clone(),
            contact_email: b.contact_email.clone().or_else(|| Some(b.email.clone())),
            creci: b.creci.clone(),
        }
    }
}
