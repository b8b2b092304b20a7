use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::domain::models::broker::BrokerBranding;
use crate::domain::ports::ListingSource;
use crate::error::LoadError;

/// How a request addresses a broker microsite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum SiteAddress {
    PathSlug(String),
    Subdomain(String),
    CustomDomain(String),
    Reserved(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedSite {
    pub broker_slug: String,
    pub address: SiteAddress,
    /// Present when resolution already required a remote lookup.
    pub broker: Option<BrokerBranding>,
}

/// Lowercase, drop the port and any trailing dot.
pub fn normalize_host(raw: &str) -> String {
    let host = raw.trim().to_lowercase();
    let host = match host.rsplit_once(':') {
        Some((name, port)) if port.chars().all(|c| c.is_ascii_digit()) => name.to_string(),
        _ => host,
    };
    host.trim_end_matches('.').to_string()
}

pub fn classify(host: &str, path_slug: Option<&str>, base_domain: &str, reserved: &[String]) -> SiteAddress {
    if let Some(slug) = path_slug.map(str::trim).filter(|s| !s.is_empty()) {
        return SiteAddress::PathSlug(slug.to_lowercase());
    }

    let host = normalize_host(host);
    let base = normalize_host(base_domain);
    let suffix = format!(".{}", base);

    if let Some(prefix) = host.strip_suffix(&suffix)
        && !prefix.is_empty()
    {
        let label = prefix.split('.').next().unwrap_or(prefix).to_string();
        if reserved.iter().any(|r| r == &label) {
            return SiteAddress::Reserved(label);
        }
        return SiteAddress::Subdomain(label);
    }

    SiteAddress::CustomDomain(host)
}

/// Strip scheme, `www.` and trailing slash from a domain typed into broker settings.
pub fn clean_domain(domain: &str) -> String {
    let d = domain.trim().to_lowercase();
    let d = d.strip_prefix("https://").or_else(|| d.strip_prefix("http://")).unwrap_or(&d);
    let d = d.strip_prefix("www.").unwrap_or(d);
    d.trim_end_matches('/').trim().to_string()
}

pub fn is_valid_domain(domain: &str) -> bool {
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return false;
    }
    labels.iter().all(|label| {
        let bytes = label.as_bytes();
        !bytes.is_empty()
            && bytes.len() <= 63
            && bytes.iter().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || *b == b'-')
            && bytes[0] != b'-'
            && bytes[bytes.len() - 1] != b'-'
    }) && labels.last().is_some_and(|tld| tld.len() >= 2)
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct DnsRecord {
    #[serde(rename = "type")]
    pub record_type: &'static str,
    pub name: &'static str,
    pub value: String,
    pub ttl: &'static str,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct DnsInstructions {
    pub domain: String,
    pub message: &'static str,
    pub dns_records: Vec<DnsRecord>,
    pub note: &'static str,
}

pub fn dns_instructions(domain: &str, base_domain: &str, a_record: &str) -> DnsInstructions {
    DnsInstructions {
        domain: domain.to_string(),
        message: "Configure the following DNS records at your domain provider:",
        dns_records: vec![
            DnsRecord { record_type: "CNAME", name: "www", value: base_domain.to_string(), ttl: "1 hour" },
            DnsRecord { record_type: "A", name: "@", value: a_record.to_string(), ttl: "1 hour" },
        ],
        note: "DNS propagation may take 24-48 hours.",
    }
}

pub struct DomainResolver {
    source: Arc<dyn ListingSource>,
    base_domain: String,
    reserved: Vec<String>,
}

impl DomainResolver {
    pub fn new(source: Arc<dyn ListingSource>, base_domain: String, reserved: Vec<String>) -> Self {
        Self { source, base_domain, reserved }
    }

    pub fn classify(&self, host: &str, path_slug: Option<&str>) -> SiteAddress {
        classify(host, path_slug, &self.base_domain, &self.reserved)
    }

    /// Platform addresses resolve locally. A custom domain costs one remote lookup.
    pub async fn resolve(&self, host: Option<&str>, path_slug: Option<&str>) -> Result<ResolvedSite, LoadError> {
        let host = host.map(normalize_host).filter(|h| !h.is_empty());
        let has_slug = path_slug.is_some_and(|s| !s.trim().is_empty());
        if host.is_none() && !has_slug {
            return Err(LoadError::MissingParameters);
        }

        let address = self.classify(host.as_deref().unwrap_or_default(), path_slug);
        debug!(?address, "Classified site address");

        match &address {
            SiteAddress::PathSlug(slug) | SiteAddress::Subdomain(slug) => Ok(ResolvedSite {
                broker_slug: slug.clone(),
                address: address.clone(),
                broker: None,
            }),
            SiteAddress::Reserved(label) => {
                info!("Reserved subdomain requested: {}", label);
                Err(LoadError::TenantNotFound)
            }
            SiteAddress::CustomDomain(domain) => {
                // Saved domains never carry `www.`; the www CNAME lands here too.
                let lookup = domain.strip_prefix("www.").unwrap_or(domain);
                let broker = self.source.resolve_broker(Some(lookup), None).await?
                    .ok_or(LoadError::TenantNotFound)?;
                info!("Custom domain {} resolved to broker {}", domain, broker.website_slug);
                Ok(ResolvedSite {
                    broker_slug: broker.website_slug.clone(),
                    address,
                    broker: Some(broker),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::broker::{Broker, BrokerContact};
    use crate::domain::models::property::{Property, PropertyDetail};
    use crate::domain::models::social_link::SocialLink;
    use crate::error::AppError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    fn reserved() -> Vec<String> {
        crate::config::DEFAULT_RESERVED_SUBDOMAINS.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_normalize_host() {
        assert_eq!(normalize_host(" ACME.Example.com:8080 "), "acme.example.com");
        assert_eq!(normalize_host("acme.com.br."), "acme.com.br");
        assert_eq!(normalize_host("localhost"), "localhost");
    }

    #[test]
    fn test_classify_subdomain() {
        assert_eq!(classify("acme.example.com", None, "example.com", &reserved()), SiteAddress::Subdomain("acme".into()));
        assert_eq!(classify("deep.acme.example.com", None, "example.com", &reserved()), SiteAddress::Subdomain("deep".into()));
        assert_eq!(classify("www.example.com", None, "example.com", &reserved()), SiteAddress::Reserved("www".into()));
    }

    #[test]
    fn test_classify_custom_domain_and_base() {
        assert_eq!(classify("example.com", None, "example.com", &reserved()), SiteAddress::CustomDomain("example.com".into()));
        assert_eq!(classify("acme.com.br", None, "example.com", &reserved()), SiteAddress::CustomDomain("acme.com.br".into()));
        assert_eq!(classify("notexample.com", None, "example.com", &reserved()), SiteAddress::CustomDomain("notexample.com".into()));
    }

    #[test]
    fn test_path_slug_wins() {
        assert_eq!(classify("acme.com.br", Some("Other"), "example.com", &reserved()), SiteAddress::PathSlug("other".into()));
    }

    #[test]
    fn test_clean_and_validate_domain() {
        assert_eq!(clean_domain("https://www.Acme.com.br/"), "acme.com.br");
        assert_eq!(clean_domain("HTTP://EXAMPLE.COM"), "example.com");
        assert!(is_valid_domain("acme.com.br"));
        assert!(is_valid_domain("sub.example.com"));
        assert!(!is_valid_domain("invalid domain"));
        assert!(!is_valid_domain("localhost"));
        assert!(!is_valid_domain("-bad.com"));
    }

    #[test]
    fn test_dns_instructions() {
        let dns = dns_instructions("acme.com.br", "example.com", "1.2.3.4");
        assert_eq!(dns.dns_records[0].record_type, "CNAME");
        assert_eq!(dns.dns_records[0].value, "example.com");
        assert_eq!(dns.dns_records[1].name, "@");
        assert_eq!(dns.dns_records[1].value, "1.2.3.4");
    }

    #[derive(Default)]
    struct LookupSource {
        lookups: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ListingSource for LookupSource {
        async fn probe(&self) -> Result<(), AppError> { Ok(()) }
        async fn property_detail(&self, _: &str, _: &str) -> Result<Vec<PropertyDetail>, AppError> { Ok(vec![]) }
        async fn broker_branding(&self, _: &str) -> Result<Vec<BrokerBranding>, AppError> { Ok(vec![]) }
        async fn broker_contact(&self, _: &str) -> Result<Option<BrokerContact>, AppError> { Ok(None) }
        async fn resolve_broker(&self, domain: Option<&str>, _: Option<&str>) -> Result<Option<BrokerBranding>, AppError> {
            let domain = domain.unwrap_or_default().to_string();
            self.lookups.lock().unwrap().push(domain.clone());
            if domain == "acme.com.br" {
                Ok(Some(BrokerBranding::from(&Broker::new("Acme".into(), "acme".into(), "a@a.test".into()))))
            } else {
                Ok(None)
            }
        }
        async fn property_by_slug_direct(&self, _: &str, _: &str) -> Result<Vec<PropertyDetail>, AppError> { Ok(vec![]) }
        async fn similar_properties(&self, _: &str, _: &str, _: &str, _: &str, _: i64) -> Result<Vec<Property>, AppError> { Ok(vec![]) }
        async fn social_links(&self, _: &str) -> Result<Vec<SocialLink>, AppError> { Ok(vec![]) }
        async fn update_views_count(&self, _: &str, _: i64) -> Result<(), AppError> { Ok(()) }
    }

    fn resolver(source: Arc<LookupSource>) -> DomainResolver {
        DomainResolver::new(source, "example.com".into(), reserved())
    }

    #[tokio::test]
    async fn test_subdomain_resolves_without_io() {
        let source = Arc::new(LookupSource::default());
        let site = resolver(source.clone()).resolve(Some("acme.example.com"), None).await.unwrap();
        assert_eq!(site.broker_slug, "acme");
        assert!(source.lookups.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_custom_domain_costs_exactly_one_lookup() {
        let source = Arc::new(LookupSource::default());
        let site = resolver(source.clone()).resolve(Some("acme.com.br:443"), None).await.unwrap();
        assert_eq!(site.broker_slug, "acme");
        assert!(site.broker.is_some());
        assert_eq!(*source.lookups.lock().unwrap(), vec!["acme.com.br".to_string()]);
    }

    #[tokio::test]
    async fn test_www_custom_domain_looks_up_the_saved_form() {
        let source = Arc::new(LookupSource::default());
        let site = resolver(source.clone()).resolve(Some("WWW.acme.com.br"), None).await.unwrap();
        assert_eq!(site.broker_slug, "acme");
        assert_eq!(site.address, SiteAddress::CustomDomain("www.acme.com.br".into()));
        assert_eq!(*source.lookups.lock().unwrap(), vec!["acme.com.br".to_string()]);
    }

    #[tokio::test]
    async fn test_base_domain_is_looked_up_remotely() {
        let source = Arc::new(LookupSource::default());
        let err = resolver(source.clone()).resolve(Some("example.com"), None).await.unwrap_err();
        assert_eq!(err, LoadError::TenantNotFound);
        assert_eq!(source.lookups.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_host_and_slug() {
        let source = Arc::new(LookupSource::default());
        let err = resolver(source).resolve(None, Some("  ")).await.unwrap_err();
        assert_eq!(err, LoadError::MissingParameters);
    }

    #[tokio::test]
    async fn test_reserved_subdomain_is_not_a_tenant() {
        let source = Arc::new(LookupSource::default());
        let err = resolver(source.clone()).resolve(Some("admin.example.com"), None).await.unwrap_err();
        assert_eq!(err, LoadError::TenantNotFound);
        assert!(source.lookups.lock().unwrap().is_empty());
    }
}
