//! Remote content client
//!
//! [`ContentStore`] is the seam between the replication/sweep loops and the
//! helpdesk API. [`HelpdeskClient`] talks to the real API over HTTPS;
//! [`InMemoryContentStore`] backs dry runs and tests.
//!
//! Every call is made on behalf of one tenant and returns a classified
//! [`RemoteError`] on failure. Nothing is retried here.

use crate::config::{Config, DOMAIN_PLACEHOLDER};
use crate::error::{ConfigError, ConfigResult, RemoteError};
use crate::registry::{self, TenantInstance};
use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::{header, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use url::Url;

/// Result type for remote calls
pub type RemoteResult<T> = Result<T, RemoteError>;

const ITEMS_PATH: &str = "/dynamic_content/items";
const TICKET_FIELDS_PATH: &str = "/ticket_fields";

/// Content item was created
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Created {
    /// Server-assigned id, when the response carried one
    pub id: Option<u64>,
}

/// Content item was deleted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deleted;

/// Existing dynamic content item as listed by the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteItem {
    pub id: u64,
    /// Content name (the canonical key for items this tool created)
    pub name: String,
}

/// Ticket field definition
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TicketField {
    pub id: u64,
    #[serde(rename = "type")]
    pub field_type: String,
    pub title: String,
}

/// Option of a dropdown or tagger field
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FieldOption {
    pub id: u64,
    pub name: String,
}

/// Dynamic content operations against one tenant at a time
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Create an item named `key` with a single default-locale variant
    async fn create(&self, tenant: &TenantInstance, key: &str, body: &str) -> RemoteResult<Created>;

    /// Every item of the tenant, across all pages
    async fn list(&self, tenant: &TenantInstance) -> RemoteResult<Vec<RemoteItem>>;

    /// Delete by server-assigned id
    async fn delete(&self, tenant: &TenantInstance, id: u64) -> RemoteResult<Deleted>;
}

/// Ticket field metadata, used to produce extracts
#[async_trait]
pub trait FieldCatalog: Send + Sync {
    async fn ticket_fields(&self, tenant: &TenantInstance) -> RemoteResult<Vec<TicketField>>;

    async fn field_options(
        &self,
        tenant: &TenantInstance,
        field_id: u64,
    ) -> RemoteResult<Vec<FieldOption>>;
}

/// HTTP client for the helpdesk API
#[derive(Debug, Clone)]
pub struct HelpdeskClient {
    http: reqwest::Client,
    base_url: String,
    locale_id: u64,
}

impl HelpdeskClient {
    /// Build from configuration; the timeout applies to every request
    pub fn new(config: &Config) -> ConfigResult<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout())
            .build()
            .map_err(|e| ConfigError::InvalidSetting {
                key: "http_client",
                reason: e.to_string(),
            })?;

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            locale_id: config.default_locale_id,
        })
    }

    /// Absolute URL of `path` on the tenant's API
    fn endpoint(&self, tenant: &TenantInstance, path: &str) -> RemoteResult<Url> {
        if !registry::is_valid_domain(tenant.domain()) {
            return Err(RemoteError::Unknown(format!(
                "invalid tenant domain `{}`",
                tenant.domain()
            )));
        }
        let base = self.base_url.replace(DOMAIN_PLACEHOLDER, tenant.domain());
        Url::parse(&format!("{}{}", base.trim_end_matches('/'), path))
            .map_err(|e| RemoteError::Unknown(format!("invalid URL for {}: {}", tenant.domain(), e)))
    }

    /// Authenticated request; the only place credentials are attached
    fn request(&self, method: Method, tenant: &TenantInstance, url: Url) -> RequestBuilder {
        self.http
            .request(method, url)
            .basic_auth(format!("{}/token", tenant.principal()), Some(tenant.secret()))
    }

    /// Send and turn non-2xx responses into classified errors
    async fn send(&self, tenant: &TenantInstance, request: RequestBuilder) -> RemoteResult<Response> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let url = response.url().to_string();
        let body = response.text().await.unwrap_or_default();
        tracing::debug!(
            tenant = tenant.domain(),
            url = %url,
            status = status.as_u16(),
            body = %body,
            "Request failed"
        );
        Err(RemoteError::from_status(status.as_u16(), &body))
    }

    /// GET `first` and every `next_page` after it, concatenating `collection`
    async fn collect_pages<T: DeserializeOwned>(
        &self,
        tenant: &TenantInstance,
        first: Url,
        collection: &str,
    ) -> RemoteResult<Vec<T>> {
        let mut items = Vec::new();
        let mut seen = HashSet::new();
        let mut next = Some(first.clone());

        while let Some(url) = next.take() {
            if !seen.insert(url.to_string()) {
                return Err(RemoteError::Unknown(format!("pagination loop at {}", url)));
            }

            let response = self
                .send(tenant, self.request(Method::GET, tenant, url.clone()))
                .await?;
            let page: serde_json::Value = response.json().await?;

            let batch = page
                .get(collection)
                .cloned()
                .ok_or_else(|| RemoteError::Unknown(format!("page without `{}`", collection)))
                .and_then(|values| {
                    serde_json::from_value::<Vec<T>>(values).map_err(|e| {
                        RemoteError::Unknown(format!("invalid `{}` page: {}", collection, e))
                    })
                })?;
            tracing::debug!(
                tenant = tenant.domain(),
                page = seen.len(),
                count = batch.len(),
                "Fetched {}",
                collection
            );
            items.extend(batch);

            if let Some(link) = page.get("next_page").and_then(|v| v.as_str()) {
                let link = url
                    .join(link)
                    .map_err(|e| RemoteError::Unknown(format!("invalid next_page: {}", e)))?;
                if link.scheme() != first.scheme()
                    || link.host_str() != first.host_str()
                    || link.port_or_known_default() != first.port_or_known_default()
                {
                    return Err(RemoteError::Unknown(format!(
                        "next_page leaves the tenant host: {}",
                        link
                    )));
                }
                next = Some(link);
            }
        }

        Ok(items)
    }
}

#[async_trait]
impl ContentStore for HelpdeskClient {
    async fn create(&self, tenant: &TenantInstance, key: &str, body: &str) -> RemoteResult<Created> {
        let url = self.endpoint(tenant, ITEMS_PATH)?;
        let payload = serde_json::json!({
            "item": {
                "name": key,
                "default_locale_id": self.locale_id,
                "variants": [{
                    "locale_id": self.locale_id,
                    "default": true,
                    "content": body,
                }],
            }
        });

        let response = self
            .send(tenant, self.request(Method::POST, tenant, url).json(&payload))
            .await?;
        let id = response
            .json::<serde_json::Value>()
            .await
            .ok()
            .and_then(|v| v["item"]["id"].as_u64());
        Ok(Created { id })
    }

    async fn list(&self, tenant: &TenantInstance) -> RemoteResult<Vec<RemoteItem>> {
        let url = self.endpoint(tenant, ITEMS_PATH)?;
        self.collect_pages(tenant, url, "items").await
    }

    async fn delete(&self, tenant: &TenantInstance, id: u64) -> RemoteResult<Deleted> {
        let url = self.endpoint(tenant, &format!("{}/{}", ITEMS_PATH, id))?;
        self.send(tenant, self.request(Method::DELETE, tenant, url))
            .await?;
        Ok(Deleted)
    }
}

#[async_trait]
impl FieldCatalog for HelpdeskClient {
    async fn ticket_fields(&self, tenant: &TenantInstance) -> RemoteResult<Vec<TicketField>> {
        let url = self.endpoint(tenant, TICKET_FIELDS_PATH)?;
        self.collect_pages(tenant, url, "ticket_fields").await
    }

    async fn field_options(
        &self,
        tenant: &TenantInstance,
        field_id: u64,
    ) -> RemoteResult<Vec<FieldOption>> {
        let url = self.endpoint(tenant, &format!("{}/{}/options", TICKET_FIELDS_PATH, field_id))?;
        self.collect_pages(tenant, url, "custom_field_options").await
    }
}

/// In-memory content store
///
/// Rejects duplicate names with `BadRequest` the way the platform does, and can
/// be told to fail a whole tenant or a single key.
#[derive(Default)]
pub struct InMemoryContentStore {
    state: RwLock<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    next_id: u64,
    items: HashMap<String, BTreeMap<u64, String>>,
    tenant_failures: HashMap<String, RemoteError>,
    key_failures: HashMap<String, RemoteError>,
    calls: usize,
}

impl InMemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call for `domain` fails with `error`
    pub fn fail_tenant(&self, domain: &str, error: RemoteError) {
        self.state
            .write()
            .tenant_failures
            .insert(domain.to_string(), error);
    }

    /// Creating `key` fails with `error` on every tenant
    pub fn fail_key(&self, key: &str, error: RemoteError) {
        self.state.write().key_failures.insert(key.to_string(), error);
    }

    /// Add an existing item directly
    pub fn seed(&self, domain: &str, name: &str) -> u64 {
        let mut state = self.state.write();
        state.next_id += 1;
        let id = state.next_id;
        state
            .items
            .entry(domain.to_string())
            .or_default()
            .insert(id, name.to_string());
        id
    }

    /// Names stored for `domain`, in creation order
    pub fn names(&self, domain: &str) -> Vec<String> {
        self.state
            .read()
            .items
            .get(domain)
            .map(|items| items.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of calls received, failed ones included
    pub fn calls(&self) -> usize {
        self.state.read().calls
    }

    fn check_tenant(state: &mut MemoryState, tenant: &TenantInstance) -> RemoteResult<()> {
        state.calls += 1;
        match state.tenant_failures.get(tenant.domain()) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ContentStore for InMemoryContentStore {
    async fn create(&self, tenant: &TenantInstance, key: &str, _body: &str) -> RemoteResult<Created> {
        let mut state = self.state.write();
        Self::check_tenant(&mut state, tenant)?;
        if let Some(error) = state.key_failures.get(key) {
            return Err(error.clone());
        }

        let taken = state
            .items
            .get(tenant.domain())
            .is_some_and(|items| items.values().any(|name| name == key));
        if taken {
            return Err(RemoteError::BadRequest(
                "RecordInvalid: Name has already been taken".into(),
            ));
        }

        state.next_id += 1;
        let id = state.next_id;
        state
            .items
            .entry(tenant.domain().to_string())
            .or_default()
            .insert(id, key.to_string());
        Ok(Created { id: Some(id) })
    }

    async fn list(&self, tenant: &TenantInstance) -> RemoteResult<Vec<RemoteItem>> {
        let mut state = self.state.write();
        Self::check_tenant(&mut state, tenant)?;
        Ok(state
            .items
            .get(tenant.domain())
            .map(|items| {
                items
                    .iter()
                    .map(|(id, name)| RemoteItem {
                        id: *id,
                        name: name.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn delete(&self, tenant: &TenantInstance, id: u64) -> RemoteResult<Deleted> {
        let mut state = self.state.write();
        Self::check_tenant(&mut state, tenant)?;
        state
            .items
            .get_mut(tenant.domain())
            .and_then(|items| items.remove(&id))
            .map(|_| Deleted)
            .ok_or(RemoteError::NotFound)
    }
}
