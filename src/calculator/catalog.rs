//! Catalog index: the service manifest and keyword search over it.

use serde::Deserialize;
use serde_json::Value;

/// How many matches `search` returns at most.
const MAX_RESULTS: usize = 15;

/// The calculator's service manifest, fetched once per process.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Manifest {
    pub aws_services: Vec<CatalogService>,
}

/// One manifest entry.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CatalogService {
    pub name: String,
    pub service_code: String,
    pub slug: Option<String>,
    pub regions: Vec<String>,
    pub search_keywords: Vec<String>,
}

impl CatalogService {
    /// The haystack `search` matches against: name, code and keywords,
    /// lowercased.
    fn search_text(&self) -> String {
        let mut text = String::new();
        text.push_str(&self.name);
        text.push(' ');
        text.push_str(&self.service_code);
        for keyword in &self.search_keywords {
            text.push(' ');
            text.push_str(keyword);
        }
        text.to_lowercase()
    }
}

/// A search hit, projected for the tool surface.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    pub name: String,
    pub service_code: String,
    pub slug: Option<String>,
    pub region_count: usize,
}

impl SearchHit {
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Case-insensitive substring search over the manifest. Order is the
/// manifest's own; the first 15 matches are returned.
pub fn search(manifest: &Manifest, query: &str) -> Vec<SearchHit> {
    let needle = query.trim().to_lowercase();
    manifest
        .aws_services
        .iter()
        .filter(|service| needle.is_empty() || service.search_text().contains(&needle))
        .take(MAX_RESULTS)
        .map(|service| SearchHit {
            name: service.name.trim().to_string(),
            service_code: service.service_code.clone(),
            slug: service.slug.clone(),
            region_count: service.regions.len(),
        })
        .collect()
}
