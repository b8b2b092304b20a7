use serde::Serialize;

use crate::domain::models::{broker::BrokerBranding, property::Property};
use crate::domain::services::share::format_brl;

const FALLBACK_BUSINESS_NAME: &str = "Imobiliária";

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct SeoMeta {
    pub title: String,
    pub description: String,
    pub canonical_url: String,
    pub og_title: String,
    pub og_description: String,
    pub og_image: Option<String>,
}

fn non_empty(template: Option<&str>) -> Option<&str> {
    template.map(str::trim).filter(|t| !t.is_empty())
}

fn opt_num<T: ToString>(v: Option<T>) -> String {
    v.map(|n| n.to_string()).unwrap_or_default()
}

fn business_name(broker: &BrokerBranding) -> &str {
    let name = broker.business_name.trim();
    if name.is_empty() { FALLBACK_BUSINESS_NAME } else { name }
}

pub fn render_title(property: &Property, broker: &BrokerBranding) -> String {
    let business = business_name(broker);
    match non_empty(broker.property_title_template.as_deref()) {
        Some(tpl) => tpl
            .replace("{title}", &property.title)
            .replace("{business_name}", business),
        None => format!("{} - {}", property.title, business),
    }
}

pub fn render_description(property: &Property, broker: &BrokerBranding) -> String {
    let price = format_brl(property.price);
    let neighborhood = property.neighborhood.clone().unwrap_or_default();
    let uf = property.uf.clone().unwrap_or_default();

    match non_empty(broker.property_description_template.as_deref()) {
        Some(tpl) => tpl
            .replace("{price}", &price)
            .replace("{bedrooms}", &opt_num(property.bedrooms))
            .replace("{bathrooms}", &opt_num(property.bathrooms))
            .replace("{area_m2}", &opt_num(property.area_m2))
            .replace("{neighborhood}", &neighborhood)
            .replace("{uf}", &uf),
        None => {
            let summary: String = property.description.as_deref().unwrap_or_default().chars().take(160).collect();
            format!("{} - {} em {}, {}", summary, price, neighborhood, uf)
        }
    }
}

pub fn build(property: &Property, broker: &BrokerBranding, public_site_url: &str) -> SeoMeta {
    let og_description = format!(
        "{} • {} quartos • {} banheiros • {}m² em {}, {}",
        format_brl(property.price),
        opt_num(property.bedrooms),
        opt_num(property.bathrooms),
        opt_num(property.area_m2),
        property.neighborhood.as_deref().unwrap_or_default(),
        property.uf.as_deref().unwrap_or_default(),
    );

    SeoMeta {
        title: render_title(property, broker),
        description: render_description(property, broker),
        canonical_url: broker.canonical_property_url(public_site_url, &property.slug),
        og_title: format!("{} - {}", property.title, business_name(broker)),
        og_description,
        og_image: property.main_image_url.clone().or_else(|| broker.logo_url.clone()),
    }
}
