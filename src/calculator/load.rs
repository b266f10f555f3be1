//! Loading stored estimates.
//!
//! The load store answers success with JSON and failure with an XML error
//! page, so the body's first non-whitespace character is the discriminator.

use super::error::{CalcError, Result};
use super::fetch::RemoteClient;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;

static EMBEDDED_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"id=([A-Za-z0-9-]+)").expect("embedded id regex"));
static BARE_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9-]+$").expect("bare id regex"));

/// Pull the saved key out of a bare token or a shareable link
/// (`…#/estimate?id=<key>`).
pub fn extract_estimate_id(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if let Some(captures) = EMBEDDED_ID.captures(trimmed) {
        return Some(captures[1].to_string());
    }
    if BARE_ID.is_match(trimmed) {
        return Some(trimmed.to_string());
    }
    None
}

/// Per-service row of the loaded summary.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRow {
    pub name: String,
    pub region: String,
    pub monthly_cost: f64,
    pub upfront_cost: f64,
    pub has_components: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_id: Option<String>,
    /// "editable", "missing templateId", or "no config data".
    pub status: String,
}

/// Reader-facing projection of a stored estimate.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimateSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub total_monthly: f64,
    pub total_upfront: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_on: Option<String>,
    pub services: Vec<ServiceRow>,
}

impl EstimateSummary {
    /// Multi-line human rendering for chat surfaces.
    pub fn human_text(&self) -> String {
        let mut out = format!(
            "Estimate \"{}\": ${:.2}/month, ${:.2} upfront",
            self.name.as_deref().unwrap_or("(unnamed)"),
            self.total_monthly,
            self.total_upfront
        );
        if let Some(created) = &self.created_on {
            out.push_str(&format!(" (created {created})"));
        }
        for service in &self.services {
            out.push_str(&format!(
                "\n- {} [{}]: ${:.2}/month, ${:.2} upfront ({})",
                service.name,
                service.region,
                service.monthly_cost,
                service.upfront_cost,
                service.status
            ));
        }
        out
    }
}

/// The summary plus the untouched stored document.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadedEstimate {
    pub summary: EstimateSummary,
    pub document: Value,
}

fn number_at(doc: &Value, path: &[&str]) -> f64 {
    let mut cursor = doc;
    for key in path {
        match cursor.get(key) {
            Some(next) => cursor = next,
            None => return 0.0,
        }
    }
    match cursor {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

fn project_summary(doc: &Value) -> EstimateSummary {
    let services = doc
        .get("services")
        .and_then(Value::as_object)
        .map(|services| {
            services
                .iter()
                .map(|(key, entry)| {
                    let has_components = entry
                        .get("calculationComponents")
                        .and_then(Value::as_object)
                        .is_some_and(|c| !c.is_empty());
                    let template_id = entry
                        .get("templateId")
                        .and_then(Value::as_str)
                        .map(str::to_string);
                    let status = match (has_components, template_id.is_some()) {
                        (true, true) => "editable",
                        (true, false) => "missing templateId",
                        _ => "no config data",
                    };
                    ServiceRow {
                        name: entry
                            .get("serviceName")
                            .and_then(Value::as_str)
                            .unwrap_or(key)
                            .to_string(),
                        region: entry
                            .get("regionName")
                            .or_else(|| entry.get("region"))
                            .and_then(Value::as_str)
                            .unwrap_or("")
                            .to_string(),
                        monthly_cost: number_at(entry, &["serviceCost", "monthly"]),
                        upfront_cost: number_at(entry, &["serviceCost", "upfront"]),
                        has_components,
                        template_id,
                        status: status.to_string(),
                    }
                })
                .collect()
        })
        .unwrap_or_default();

    EstimateSummary {
        name: doc.get("name").and_then(Value::as_str).map(str::to_string),
        total_monthly: number_at(doc, &["totalCost", "monthly"]),
        total_upfront: number_at(doc, &["totalCost", "upfront"]),
        created_on: doc
            .get("metaData")
            .and_then(|m| m.get("createdOn"))
            .and_then(Value::as_str)
            .map(str::to_string),
        services,
    }
}

/// Fetch a stored estimate by id or shareable link.
pub async fn load_estimate(client: &RemoteClient, id_or_url: &str) -> Result<LoadedEstimate> {
    let id = extract_estimate_id(id_or_url).ok_or_else(|| CalcError::InvalidEstimateId {
        input: id_or_url.to_string(),
    })?;
    let url = client.endpoints().load_url(&id);
    let (status, body) = client.get_text(&url).await?;

    if (400..500).contains(&status) || body.trim_start().starts_with('<') {
        return Err(CalcError::NotFound { id });
    }
    if !(200..300).contains(&status) {
        return Err(CalcError::Fetch {
            url,
            status,
        });
    }

    let document: Value =
        serde_json::from_str(&body).map_err(|e| CalcError::decode(&url, &e))?;
    Ok(LoadedEstimate {
        summary: project_summary(&document),
        document,
    })
}
