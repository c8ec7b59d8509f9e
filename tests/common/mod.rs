//! Shared helpers for HTTP integration tests

#![allow(dead_code)]

use dc_replicator::{Config, HelpdeskClient, TenantInstance};
use serde_json::{json, Value};
use wiremock::{MockServer, Request, Respond, ResponseTemplate};

/// Config routing every tenant to `server` under `/<domain>/api/v2`
pub fn config_for(server: &MockServer) -> Config {
    Config {
        base_url: format!("{}/{{domain}}/api/v2", server.uri()),
        timeout_secs: 1,
        ..Config::default()
    }
}

pub fn client_for(server: &MockServer) -> HelpdeskClient {
    HelpdeskClient::new(&config_for(server)).unwrap()
}

/// Client pointed at a port nothing listens on
pub fn unreachable_client() -> HelpdeskClient {
    let config = Config {
        base_url: "http://127.0.0.1:1/{domain}/api/v2".into(),
        timeout_secs: 5,
        ..Config::default()
    };
    HelpdeskClient::new(&config).unwrap()
}

pub fn tenant(domain: &str) -> TenantInstance {
    TenantInstance::new(domain, "admin@example.com", "s3cret")
}

/// Serves `pages` of `per_page` items, chained through `next_page` links
/// built from the `page` query parameter.
pub struct PagedItems {
    pub base: String,
    pub pages: u64,
    pub per_page: u64,
}

impl Respond for PagedItems {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let page: u64 = request
            .url
            .query_pairs()
            .find(|(k, _)| k == "page")
            .and_then(|(_, v)| v.parse().ok())
            .unwrap_or(1);

        let first_id = (page - 1) * self.per_page + 1;
        let items: Vec<Value> = (first_id..first_id + self.per_page)
            .map(|id| json!({ "id": id, "name": format!("TF::Title-Field {}", id) }))
            .collect();
        let next_page = if page < self.pages {
            json!(format!("{}?page={}", self.base, page + 1))
        } else {
            Value::Null
        };

        ResponseTemplate::new(200).set_body_json(json!({
            "items": items,
            "next_page": next_page,
            "previous_page": null,
            "count": self.pages * self.per_page,
        }))
    }
}
