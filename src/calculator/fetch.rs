//! Remote document fetcher for the calculator data plane.
//!
//! One `RemoteClient` per process. Every document class is memoized here and
//! nowhere else: the catalog manifest lives in a single-assign slot (a failed
//! fetch leaves the slot empty so the next call retries), service definitions
//! are keyed by URL, pricing tables by `(mappingDefinitionName, regionName)`.
//! No TTL: the process lifetime is the cache lifetime.

use super::catalog::Manifest;
use super::definition::ServiceDefinition;
use super::error::{CalcError, Result};
use super::pricing::{PriceTable, project_region_table};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Resolved endpoint set. Defaults target the live calculator.aws data
/// plane; tests point these at a mock server.
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub manifest_url: String,
    pub definition_base: String,
    pub pricing_base: String,
    pub save_url: String,
    pub load_base: String,
    pub share_base: String,
    pub currency: String,
    pub locale: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            manifest_url: "https://d1qsjq9pzbk1k6.cloudfront.net/manifest/en_US.json".to_string(),
            definition_base: "https://d1qsjq9pzbk1k6.cloudfront.net/data".to_string(),
            pricing_base: "https://calculator.aws/pricing/2.0/meteredUnitMaps".to_string(),
            save_url: "https://dnd5zrqcec4or.cloudfront.net/Prod/v2/saveAs".to_string(),
            load_base: "https://d3knqfixx3sbls.cloudfront.net".to_string(),
            share_base: "https://calculator.aws/#/estimate".to_string(),
            currency: "USD".to_string(),
            locale: "en_US".to_string(),
        }
    }
}

impl Endpoints {
    /// URL of one service's definition document.
    pub fn definition_url(&self, service_code: &str) -> String {
        format!(
            "{}/{}/{}.json",
            self.definition_base, service_code, self.locale
        )
    }

    /// Default pricing-table URL shape, used when the definition does not
    /// carry a `mappingDefinitions` entry for the name.
    pub fn default_pricing_url(&self, mapping_name: &str) -> String {
        format!(
            "{}/{}/{}/current/{}.json",
            self.pricing_base, mapping_name, self.currency, mapping_name
        )
    }

    /// Stored-estimate URL for a saved key.
    pub fn load_url(&self, id: &str) -> String {
        format!("{}/{}", self.load_base, id)
    }

    /// Public shareable link for a saved key.
    pub fn share_link(&self, saved_key: &str) -> String {
        format!("{}?id={}", self.share_base, saved_key)
    }
}

/// HTTP client plus the process-wide document caches.
pub struct RemoteClient {
    http: reqwest::Client,
    endpoints: Endpoints,
    manifest_slot: RwLock<Option<Arc<Manifest>>>,
    definitions: RwLock<HashMap<String, Arc<ServiceDefinition>>>,
    price_tables: RwLock<HashMap<(String, String), Arc<PriceTable>>>,
}

impl RemoteClient {
    pub fn new(endpoints: Endpoints) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoints,
            manifest_slot: RwLock::new(None),
            definitions: RwLock::new(HashMap::new()),
            price_tables: RwLock::new(HashMap::new()),
        }
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// GET a URL and parse the body as JSON. Non-2xx is a typed failure
    /// carrying the URL and status.
    pub async fn get_json(&self, url: &str) -> Result<Value> {
        tracing::debug!("GET {}", url);
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| CalcError::transport(url, &e))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(CalcError::Fetch {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        let body = resp
            .text()
            .await
            .map_err(|e| CalcError::transport(url, &e))?;
        serde_json::from_str(&body).map_err(|e| CalcError::decode(url, &e))
    }

    /// GET a URL and return `(status, body)` without interpreting either.
    /// The load store answers success and error with different content
    /// types, so the caller discriminates.
    pub async fn get_text(&self, url: &str) -> Result<(u16, String)> {
        tracing::debug!("GET {}", url);
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| CalcError::transport(url, &e))?;
        let status = resp.status().as_u16();
        let body = resp
            .text()
            .await
            .map_err(|e| CalcError::transport(url, &e))?;
        Ok((status, body))
    }

    /// POST a JSON body and return `(status, body)`. The save flow owns the
    /// retry decision, so no status check happens here.
    pub async fn post_json(&self, url: &str, body: &Value) -> Result<(u16, String)> {
        tracing::debug!("POST {}", url);
        let resp = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| CalcError::transport(url, &e))?;
        let status = resp.status().as_u16();
        let text = resp
            .text()
            .await
            .map_err(|e| CalcError::transport(url, &e))?;
        Ok((status, text))
    }

    /// The catalog manifest. Single-assign slot: a success is kept for the
    /// process lifetime, a failure leaves the slot empty for retry.
    pub async fn manifest(&self) -> Result<Arc<Manifest>> {
        if let Some(manifest) = self.manifest_slot.read().await.as_ref() {
            return Ok(Arc::clone(manifest));
        }
        let doc = self.get_json(&self.endpoints.manifest_url).await?;
        let manifest: Manifest = serde_json::from_value(doc)
            .map_err(|e| CalcError::decode(&self.endpoints.manifest_url, &e))?;
        let manifest = Arc::new(manifest);
        let mut slot = self.manifest_slot.write().await;
        // A racing fetch may have landed first; either result is the same
        // document, keep whichever is present.
        Ok(Arc::clone(
            slot.get_or_insert_with(|| Arc::clone(&manifest)),
        ))
    }

    /// A service definition, memoized by URL.
    pub async fn definition(&self, service_code: &str) -> Result<Arc<ServiceDefinition>> {
        let url = self.endpoints.definition_url(service_code);
        if let Some(def) = self.definitions.read().await.get(&url) {
            return Ok(Arc::clone(def));
        }
        let doc = self.get_json(&url).await?;
        let def: ServiceDefinition =
            serde_json::from_value(doc).map_err(|e| CalcError::decode(&url, &e))?;
        let def = Arc::new(def);
        let mut cache = self.definitions.write().await;
        Ok(Arc::clone(
            cache.entry(url).or_insert_with(|| Arc::clone(&def)),
        ))
    }

    /// A pricing table for `(mapping_name, region_name)`, memoized. A fetch
    /// failure is not cached; it yields an empty table now and a retry on
    /// the next call.
    pub async fn price_table(
        &self,
        mapping_name: &str,
        region_name: &str,
        url: &str,
    ) -> Arc<PriceTable> {
        let key = (mapping_name.to_string(), region_name.to_string());
        if let Some(table) = self.price_tables.read().await.get(&key) {
            return Arc::clone(table);
        }
        let table = match self.get_json(url).await {
            Ok(doc) => Arc::new(project_region_table(&doc, region_name)),
            Err(err) => {
                tracing::warn!(
                    "pricing table '{}' unavailable for {}: {}",
                    mapping_name,
                    region_name,
                    err
                );
                return Arc::new(PriceTable::new());
            }
        };
        let mut cache = self.price_tables.write().await;
        Arc::clone(cache.entry(key).or_insert_with(|| Arc::clone(&table)))
    }
}
