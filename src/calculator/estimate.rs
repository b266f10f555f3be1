//! Estimate assembly and the save protocol.
//!
//! `create_estimate` merges each requested service's inputs with its
//! definition defaults, materializes sub-service entries, auto-calculates
//! costs the caller left at zero, and POSTs the document to the save store.
//! A rejected save is retried once with every `calculationComponents`
//! stripped; a successful retry downgrades to success-with-warnings.

use super::definition::ServiceDefinition;
use super::error::{CalcError, Result};
use super::evaluator::{CostTotals, evaluate};
use super::fetch::RemoteClient;
use super::pricing::load_price_tables;
use super::regions::resolve_region_name;
use super::schema::extract_inputs;
use super::value::build_calc_components;
use crate::utils::truncate_str;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

fn default_region() -> String {
    "us-east-1".to_string()
}

/// One service as requested by the caller of `create_estimate`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceSpec {
    pub service_code: String,
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default)]
    pub region_name: Option<String>,
    #[serde(default)]
    pub service_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub monthly_cost: f64,
    #[serde(default)]
    pub upfront_cost: f64,
    #[serde(default)]
    pub config_summary: Option<String>,
    #[serde(default)]
    pub calculation_components: Option<Map<String, Value>>,
    #[serde(default)]
    pub template_id: Option<String>,
    #[serde(default)]
    pub group: Option<String>,
}

/// Monthly/upfront pair as persisted.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceCost {
    pub monthly: f64,
    pub upfront: f64,
}

impl From<CostTotals> for ServiceCost {
    fn from(totals: CostTotals) -> Self {
        Self {
            monthly: totals.monthly,
            upfront: totals.upfront,
        }
    }
}

/// One persisted service record. Sub-services are the same shape with
/// zeroed costs and no further nesting.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub service_code: String,
    pub estimate_for: String,
    pub region: String,
    pub region_name: String,
    pub description: Option<String>,
    pub calculation_components: Map<String, Value>,
    pub service_cost: ServiceCost,
    pub service_name: String,
    pub config_summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_services: Option<Vec<ServiceEntry>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupEntry {
    pub name: String,
    pub services: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimateMetaData {
    pub locale: String,
    pub currency: String,
    pub created_on: String,
    pub source: String,
}

/// The persisted estimate document, exactly as POSTed to the save store.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimateDocument {
    pub name: String,
    pub services: BTreeMap<String, ServiceEntry>,
    pub groups: BTreeMap<String, GroupEntry>,
    pub group_subtotal: ServiceCost,
    pub total_cost: ServiceCost,
    pub support: Value,
    pub meta_data: EstimateMetaData,
}

/// What `create_estimate` hands back to the tool surface.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOutcome {
    pub url: String,
    pub saved_key: String,
    pub total_cost: ServiceCost,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Evaluate a configured service, summing the parent with each of its
/// sub-service definitions (their own defaults, same region). Pricing
/// failures never surface; they read as zeros inside the evaluator.
pub async fn auto_cost(
    client: &RemoteClient,
    def: &ServiceDefinition,
    components: &Map<String, Value>,
    region_name: &str,
) -> CostTotals {
    let tables = load_price_tables(client, def, region_name).await;
    let mut totals = evaluate(def, components, &tables);

    for sub in &def.sub_services {
        let Some(sub_code) = sub.service_code.as_deref() else {
            continue;
        };
        let Ok(sub_def) = client.definition(sub_code).await else {
            continue;
        };
        let sub_fields = extract_inputs(&sub_def);
        let sub_components = build_calc_components(&sub_fields, &Map::new());
        let sub_tables = load_price_tables(client, &sub_def, region_name).await;
        totals.add(evaluate(&sub_def, &sub_components, &sub_tables));
    }
    totals
}

/// Materialize a sub-service entry from its definition defaults. Costs are
/// always zero; the parent carries the aggregate.
fn sub_service_entry(
    sub_code: &str,
    sub_def: Option<&ServiceDefinition>,
    region: &str,
    region_name: &str,
) -> ServiceEntry {
    let calculation_components = sub_def
        .map(|def| build_calc_components(&extract_inputs(def), &Map::new()))
        .unwrap_or_default();
    ServiceEntry {
        version: sub_def.and_then(|d| d.version.clone()),
        service_code: sub_code.to_string(),
        estimate_for: sub_def
            .and_then(|d| d.estimate_for.clone())
            .unwrap_or_else(|| sub_code.to_string()),
        region: region.to_string(),
        region_name: region_name.to_string(),
        description: None,
        calculation_components,
        service_cost: ServiceCost::default(),
        service_name: sub_def
            .and_then(|d| d.service_name.clone())
            .unwrap_or_else(|| sub_code.to_string()),
        config_summary: String::new(),
        template_id: sub_def.and_then(|d| d.templates.first().and_then(|t| t.id.clone())),
        sub_services: None,
    }
}

async fn build_entry(client: &RemoteClient, spec: &ServiceSpec) -> ServiceEntry {
    let def: Option<Arc<ServiceDefinition>> = match client.definition(&spec.service_code).await {
        Ok(def) => Some(def),
        Err(err) => {
            tracing::warn!(
                "definition for '{}' unavailable, assembling from inputs only: {}",
                spec.service_code,
                err
            );
            None
        }
    };

    let fields = def
        .as_deref()
        .map(extract_inputs)
        .unwrap_or_default();
    let user_inputs = spec.calculation_components.clone().unwrap_or_default();
    let calculation_components = build_calc_components(&fields, &user_inputs);
    let region_name = resolve_region_name(&spec.region, spec.region_name.as_deref());

    let sub_services = match def.as_deref() {
        Some(def) if !def.sub_services.is_empty() => {
            let mut entries = Vec::new();
            for sub in &def.sub_services {
                let Some(sub_code) = sub.service_code.as_deref() else {
                    continue;
                };
                let sub_def = client.definition(sub_code).await.ok();
                entries.push(sub_service_entry(
                    sub_code,
                    sub_def.as_deref(),
                    &spec.region,
                    &region_name,
                ));
            }
            Some(entries)
        }
        _ => None,
    };

    let service_cost = if spec.monthly_cost == 0.0 {
        match def.as_deref() {
            Some(def) => auto_cost(client, def, &calculation_components, &region_name)
                .await
                .into(),
            None => ServiceCost::default(),
        }
    } else {
        ServiceCost {
            monthly: spec.monthly_cost,
            upfront: spec.upfront_cost,
        }
    };

    ServiceEntry {
        version: def.as_deref().and_then(|d| d.version.clone()),
        service_code: spec.service_code.clone(),
        estimate_for: def
            .as_deref()
            .and_then(|d| d.estimate_for.clone())
            .unwrap_or_else(|| spec.service_code.clone()),
        region: spec.region.clone(),
        region_name,
        description: spec.description.clone(),
        calculation_components,
        service_cost,
        service_name: spec
            .service_name
            .clone()
            .or_else(|| def.as_deref().and_then(|d| d.service_name.clone()))
            .unwrap_or_else(|| spec.service_code.clone()),
        config_summary: spec.config_summary.clone().unwrap_or_default(),
        template_id: spec.template_id.clone().or_else(|| {
            def.as_deref()
                .and_then(|d| d.templates.first().and_then(|t| t.id.clone()))
        }),
        sub_services,
    }
}

/// Assemble the full document for a named estimate.
pub async fn build_document(
    client: &RemoteClient,
    name: &str,
    specs: &[ServiceSpec],
) -> EstimateDocument {
    let mut services = BTreeMap::new();
    let mut groups: BTreeMap<String, GroupEntry> = BTreeMap::new();
    let mut group_keys: Vec<(String, String)> = Vec::new();
    let mut total_cost = ServiceCost::default();

    for spec in specs {
        let entry = build_entry(client, spec).await;
        total_cost.monthly += entry.service_cost.monthly;
        total_cost.upfront += entry.service_cost.upfront;

        let service_key = format!("{}-{}", spec.service_code, Uuid::new_v4());
        if let Some(group_name) = spec.group.as_deref().filter(|g| !g.is_empty()) {
            let group_key = group_keys
                .iter()
                .find(|(existing, _)| existing == group_name)
                .map(|(_, key)| key.clone())
                .unwrap_or_else(|| {
                    let key = format!("group-{}", Uuid::new_v4());
                    group_keys.push((group_name.to_string(), key.clone()));
                    groups.insert(
                        key.clone(),
                        GroupEntry {
                            name: group_name.to_string(),
                            services: Vec::new(),
                        },
                    );
                    key
                });
            if let Some(group) = groups.get_mut(&group_key) {
                group.services.push(service_key.clone());
            }
        }
        services.insert(service_key, entry);
    }

    EstimateDocument {
        name: name.to_string(),
        services,
        groups,
        group_subtotal: total_cost,
        total_cost,
        support: serde_json::json!({}),
        meta_data: EstimateMetaData {
            locale: client.endpoints().locale.clone(),
            currency: client.endpoints().currency.clone(),
            created_on: chrono::Utc::now().to_rfc3339(),
            source: "calculator-platform".to_string(),
        },
    }
}

/// Strip `calculationComponents` from every entry, returning the names of
/// the entries that actually lost data.
fn strip_components(document: &mut EstimateDocument) -> Vec<String> {
    let mut stripped = Vec::new();
    for entry in document.services.values_mut() {
        if !entry.calculation_components.is_empty() {
            entry.calculation_components = Map::new();
            stripped.push(entry.service_name.clone());
        }
        if let Some(subs) = entry.sub_services.as_mut() {
            for sub in subs {
                if !sub.calculation_components.is_empty() {
                    sub.calculation_components = Map::new();
                    stripped.push(sub.service_name.clone());
                }
            }
        }
    }
    stripped
}

/// Pull `savedKey` out of the save store's `{statusCode, body}` envelope.
fn parse_save_response(text: &str) -> Result<String> {
    let envelope: Value = serde_json::from_str(text)
        .map_err(|e| CalcError::ResponseShape(format!("save response was not JSON: {e}")))?;
    let status_code = envelope
        .get("statusCode")
        .and_then(Value::as_i64)
        .ok_or_else(|| CalcError::ResponseShape("missing statusCode".to_string()))?;
    if status_code != 201 {
        return Err(CalcError::ResponseShape(format!(
            "statusCode {status_code}, expected 201"
        )));
    }
    let body = envelope
        .get("body")
        .and_then(Value::as_str)
        .ok_or_else(|| CalcError::ResponseShape("missing body".to_string()))?;
    let body: Value = serde_json::from_str(body)
        .map_err(|e| CalcError::ResponseShape(format!("body was not JSON: {e}")))?;
    body.get("savedKey")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| CalcError::ResponseShape("missing savedKey".to_string()))
}

/// POST the document; on rejection, retry once with all configuration
/// stripped. A successful retry returns warnings naming what was lost.
async fn save_document(
    client: &RemoteClient,
    mut document: EstimateDocument,
) -> Result<(String, Vec<String>)> {
    let save_url = client.endpoints().save_url.clone();
    let body = serde_json::to_value(&document)
        .map_err(|e| CalcError::ResponseShape(format!("document did not serialize: {e}")))?;
    let (status, text) = client.post_json(&save_url, &body).await?;
    if (200..300).contains(&status) {
        return Ok((parse_save_response(&text)?, Vec::new()));
    }

    tracing::warn!("save rejected ({}), retrying without configuration", status);
    let stripped = strip_components(&mut document);
    let retry_body = serde_json::to_value(&document)
        .map_err(|e| CalcError::ResponseShape(format!("document did not serialize: {e}")))?;
    let (retry_status, retry_text) = client.post_json(&save_url, &retry_body).await?;
    if !(200..300).contains(&retry_status) {
        return Err(CalcError::Save {
            first_status: status,
            first_body: text,
            retry_status,
            retry_body: retry_text,
        });
    }

    let mut warnings = vec![format!(
        "The save store rejected the full estimate (status {status}: {}); it was saved again \
         without configuration details.",
        truncate_str(&text, 200)
    )];
    for name in stripped {
        warnings.push(format!(
            "'{name}' was saved without its calculationComponents; re-fetch the service schema \
             and reconfigure to make it editable."
        ));
    }
    Ok((parse_save_response(&retry_text)?, warnings))
}

/// The full create flow: assemble, persist, return the shareable link.
pub async fn create_estimate(
    client: &RemoteClient,
    name: &str,
    specs: &[ServiceSpec],
) -> Result<CreateOutcome> {
    let document = build_document(client, name, specs).await;
    let total_cost = document.total_cost;
    let (saved_key, warnings) = save_document(client, document).await?;
    for warning in &warnings {
        tracing::warn!("{}", warning);
    }
    Ok(CreateOutcome {
        url: client.endpoints().share_link(&saved_key),
        saved_key,
        total_cost,
        warnings,
    })
}
