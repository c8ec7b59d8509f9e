//! Instance registry
//!
//! Loads the credential roster: an XML document with one `<instance>` element per
//! tenant, each carrying `<subdomain>`, `<email>` and `<token>`.
//!
//! ```xml
//! <instances>
//!   <instance>
//!     <subdomain>acme</subdomain>
//!     <email>admin@acme.com</email>
//!     <token>abc123</token>
//!   </instance>
//! </instances>
//! ```

use crate::error::{ConfigError, ConfigResult};
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::Path;

/// One tenant account of the helpdesk platform
#[derive(Clone, PartialEq, Eq)]
pub struct TenantInstance {
    domain: String,
    principal: String,
    secret: String,
}

impl TenantInstance {
    pub fn new(
        domain: impl Into<String>,
        principal: impl Into<String>,
        secret: impl Into<String>,
    ) -> Self {
        Self {
            domain: domain.into(),
            principal: principal.into(),
            secret: secret.into(),
        }
    }

    /// Subdomain addressing the tenant
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Agent identity the API token belongs to
    pub fn principal(&self) -> &str {
        &self.principal
    }

    /// API token
    pub fn secret(&self) -> &str {
        &self.secret
    }
}

impl fmt::Debug for TenantInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TenantInstance")
            .field("domain", &self.domain)
            .field("principal", &self.principal)
            .field("secret", &"****")
            .finish()
    }
}

#[derive(Debug, Default, Deserialize)]
struct RosterDocument {
    #[serde(rename = "instance", default)]
    instances: Vec<RosterEntry>,
}

#[derive(Debug, Default, Deserialize)]
struct RosterEntry {
    #[serde(alias = "domain")]
    subdomain: Option<String>,
    #[serde(alias = "principal")]
    email: Option<String>,
    #[serde(alias = "secret")]
    token: Option<String>,
}

/// Ordered, read-only tenant roster
#[derive(Debug, Clone, Default)]
pub struct Registry {
    tenants: Vec<TenantInstance>,
}

impl Registry {
    /// Load the roster file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
        Self::from_xml(&content)
    }

    /// Parse roster XML, failing on the first entry with a missing field
    pub fn from_xml(xml: &str) -> ConfigResult<Self> {
        let document: RosterDocument = quick_xml::de::from_str(xml)?;

        let tenants = document
            .instances
            .into_iter()
            .enumerate()
            .map(|(i, entry)| {
                let entry_no = i + 1;
                Ok(TenantInstance {
                    domain: subdomain(entry.subdomain, entry_no)?,
                    principal: required(entry.email, entry_no, "email")?,
                    secret: required(entry.token, entry_no, "token")?,
                })
            })
            .collect::<ConfigResult<Vec<_>>>()?;

        tracing::debug!(tenants = tenants.len(), "Loaded tenant roster");
        Ok(Self { tenants })
    }

    /// Build from already-validated tenants
    pub fn from_tenants(tenants: Vec<TenantInstance>) -> Self {
        Self { tenants }
    }

    pub fn iter(&self) -> impl Iterator<Item = &TenantInstance> {
        self.tenants.iter()
    }

    pub fn tenants(&self) -> &[TenantInstance] {
        &self.tenants
    }

    pub fn len(&self) -> usize {
        self.tenants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tenants.is_empty()
    }
}

/// Single DNS label: ASCII letters, digits and inner hyphens, at most 63 bytes
pub fn is_valid_domain(domain: &str) -> bool {
    !domain.is_empty()
        && domain.len() <= 63
        && !domain.starts_with('-')
        && !domain.ends_with('-')
        && domain.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
}

/// The domain is pasted into the API host name, so anything but a label is refused
fn subdomain(value: Option<String>, entry: usize) -> ConfigResult<String> {
    let domain = required(value, entry, "subdomain")?;
    if !is_valid_domain(&domain) {
        return Err(ConfigError::MalformedRoster {
            entry,
            field: "subdomain",
        });
    }
    Ok(domain)
}

fn required(value: Option<String>, entry: usize, field: &'static str) -> ConfigResult<String> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ConfigError::MalformedRoster { entry, field }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_preserves_order() {
        let registry = Registry::from_xml(
            r#"<?xml version="1.0"?>
            <instances>
              <instance>
                <subdomain>acme</subdomain>
                <email>admin@acme.com</email>
                <token>t1</token>
              </instance>
              <instance>
                <subdomain>globex</subdomain>
                <email>ops@globex.com</email>
                <token>t2</token>
              </instance>
            </instances>"#,
        )
        .unwrap();

        let domains: Vec<_> = registry.iter().map(|t| t.domain()).collect();
        assert_eq!(domains, vec!["acme", "globex"]);
        assert_eq!(registry.tenants()[1].principal(), "ops@globex.com");
        assert_eq!(registry.tenants()[1].secret(), "t2");
    }

    #[test]
    fn test_aliases() {
        let registry = Registry::from_xml(
            "<roster><instance><domain>acme</domain><principal>a@acme.com</principal>\
             <secret>s</secret></instance></roster>",
        )
        .unwrap();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.tenants()[0].domain(), "acme");
    }

    #[test]
    fn test_missing_field_is_malformed() {
        let err = Registry::from_xml(
            "<instances>\
               <instance><subdomain>a</subdomain><email>e</email><token>t</token></instance>\
               <instance><subdomain>b</subdomain><token>t</token></instance>\
             </instances>",
        )
        .unwrap_err();

        assert!(matches!(
            err,
            ConfigError::MalformedRoster { entry: 2, field: "email" }
        ));
    }

    #[test]
    fn test_blank_field_is_malformed() {
        let err = Registry::from_xml(
            "<instances><instance><subdomain>a</subdomain><email>e</email><token>  </token>\
             </instance></instances>",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::MalformedRoster { entry: 1, field: "token" }));
    }

    #[test]
    fn test_domain_must_be_a_label() {
        for bad in ["collector.example?x=", "evil.com", "127.0.0.1:8080", "-acme", "acme-", "a b"] {
            let xml = format!(
                "<instances><instance><subdomain>{}</subdomain><email>e</email>\
                 <token>t</token></instance></instances>",
                bad
            );
            let err = Registry::from_xml(&xml).unwrap_err();
            assert!(
                matches!(err, ConfigError::MalformedRoster { entry: 1, field: "subdomain" }),
                "{} was accepted",
                bad
            );
        }

        let long = "a".repeat(64);
        assert!(!is_valid_domain(&long));
        assert!(is_valid_domain(&long[..63]));
        assert!(is_valid_domain("acme-eu2"));
    }

    #[test]
    fn test_empty_roster() {
        let registry = Registry::from_xml("<instances></instances>").unwrap();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let tenant = TenantInstance::new("acme", "a@acme.com", "supersecret");
        let debug = format!("{:?}", tenant);
        assert!(!debug.contains("supersecret"));
        assert!(debug.contains("acme"));
    }
}
