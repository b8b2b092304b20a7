use reqwest::Url;
use serde::Serialize;

use crate::domain::models::property::Property;

const MOBILE_MARKERS: [&str; 8] = ["android", "webos", "iphone", "ipad", "ipod", "blackberry", "iemobile", "opera mini"];

pub fn is_mobile_user_agent(user_agent: &str) -> bool {
    let ua = user_agent.to_lowercase();
    MOBILE_MARKERS.iter().any(|m| ua.contains(m))
}

pub fn phone_digits(phone: &str) -> String {
    phone.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Brazilian currency: `R$ 1.234.567` or `R$ 1.234,5` (at most two decimals, no padding).
pub fn format_brl(value: f64) -> String {
    let negative = value < 0.0;
    let cents = (value.abs() * 100.0).round() as u64;
    let (int_part, frac) = (cents / 100, cents % 100);

    let digits = int_part.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }

    let mut out = format!("{}R$ {}", if negative { "-" } else { "" }, grouped);
    if frac > 0 {
        let decimals = format!("{:02}", frac);
        out.push(',');
        out.push_str(decimals.trim_end_matches('0'));
    }
    out
}

pub fn inquiry_message(property: &Property, listing_url: &str) -> String {
    format!(
        "Olá! Tenho interesse no imóvel \"{}\" - Código: {}. Valor: {}. Gostaria de mais informações. Link: {}",
        property.title,
        property.reference_code(),
        format_brl(property.price),
        listing_url
    )
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct WhatsAppLinks {
    /// Link to open for this visitor.
    pub primary: String,
    /// Web link, valid on every device.
    pub web: String,
}

pub fn whatsapp_links(phone: &str, message: &str, mobile: bool) -> Option<WhatsAppLinks> {
    let digits = phone_digits(phone);
    if digits.is_empty() {
        return None;
    }

    let web = Url::parse_with_params(&format!("https://wa.me/{}", digits), &[("text", message)]).ok()?;
    let primary = if mobile {
        Url::parse_with_params("whatsapp://send", &[("phone", digits.as_str()), ("text", message)]).ok()?
    } else {
        web.clone()
    };

    Some(WhatsAppLinks { primary: primary.to_string(), web: web.to_string() })
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ShareInfo {
    pub title: String,
    pub text: String,
    pub url: String,
    pub whatsapp: Option<WhatsAppLinks>,
}

pub fn share_info(property: &Property, broker_name: &str, listing_url: &str, whatsapp_number: Option<&str>, mobile: bool) -> ShareInfo {
    let message = inquiry_message(property, listing_url);
    ShareInfo {
        title: format!("{} - {}", property.title, broker_name),
        text: format!("{} por {}", property.title, format_brl(property.price)),
        url: listing_url.to_string(),
        whatsapp: whatsapp_number.and_then(|n| whatsapp_links(n, &message, mobile)),
    }
}
