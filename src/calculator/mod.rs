//! The pricing engine.
//!
//! `Calculator` is the single seam the tool surface and CLI talk to: it owns
//! the remote client (and with it every document cache) and exposes the five
//! operations: search the catalog, fetch a schema, configure-and-price a
//! service, persist an estimate, load one back.

pub mod catalog;
pub mod definition;
pub mod error;
pub mod estimate;
pub mod evaluator;
pub mod fetch;
pub mod load;
pub mod pricing;
pub mod regions;
pub mod schema;
pub mod value;

use catalog::SearchHit;
use error::Result;
use estimate::{CreateOutcome, ServiceSpec, auto_cost};
use fetch::{Endpoints, RemoteClient};
use load::LoadedEstimate;
use regions::resolve_region_name;
use schema::{ServiceSchema, extract_inputs, project_schema};
use serde::Serialize;
use serde_json::{Map, Value};
use value::build_calc_components;

/// The result of configuring one service: its merged inputs and the cost
/// the official UI would show.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfiguredService {
    pub service_name: String,
    pub service_code: String,
    pub region: String,
    pub region_name: String,
    pub monthly_cost: f64,
    pub upfront_cost: f64,
    pub calculation_components: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_id: Option<String>,
}

pub struct Calculator {
    client: RemoteClient,
}

impl Calculator {
    pub fn new(endpoints: Endpoints) -> Self {
        Self {
            client: RemoteClient::new(endpoints),
        }
    }

    pub fn client(&self) -> &RemoteClient {
        &self.client
    }

    /// Keyword search over the service catalog.
    pub async fn search(&self, query: &str) -> Result<Vec<SearchHit>> {
        let manifest = self.client.manifest().await?;
        Ok(catalog::search(&manifest, query))
    }

    /// The configuration schema for one service, with best-effort
    /// sub-service schemas attached.
    pub async fn schema(&self, service_code: &str) -> Result<ServiceSchema> {
        let def = self.client.definition(service_code).await?;
        let mut schema = project_schema(&def, service_code);
        for sub in &def.sub_services {
            let Some(sub_code) = sub.service_code.as_deref() else {
                continue;
            };
            match self.client.definition(sub_code).await {
                Ok(sub_def) => schema.sub_services.push(project_schema(&sub_def, sub_code)),
                Err(err) => {
                    tracing::warn!("sub-service '{}' schema unavailable: {}", sub_code, err);
                    schema.sub_services.push(ServiceSchema::placeholder(
                        sub_code,
                        format!("definition could not be fetched: {err}"),
                    ));
                }
            }
        }
        Ok(schema)
    }

    /// Merge inputs with defaults and evaluate the service's cost for a
    /// region.
    pub async fn configure(
        &self,
        service_code: &str,
        region: &str,
        inputs: &Map<String, Value>,
    ) -> Result<ConfiguredService> {
        let def = self.client.definition(service_code).await?;
        let fields = extract_inputs(&def);
        let calculation_components = build_calc_components(&fields, inputs);
        let region_name = resolve_region_name(region, None);
        let totals = auto_cost(&self.client, &def, &calculation_components, &region_name).await;

        Ok(ConfiguredService {
            service_name: def
                .service_name
                .clone()
                .unwrap_or_else(|| service_code.to_string()),
            service_code: service_code.to_string(),
            region: region.to_string(),
            region_name,
            monthly_cost: totals.monthly,
            upfront_cost: totals.upfront,
            calculation_components,
            template_id: def.templates.first().and_then(|t| t.id.clone()),
        })
    }

    /// Assemble and persist a multi-service estimate; returns the shareable
    /// link (plus warnings when the save degraded).
    pub async fn create_estimate(
        &self,
        name: &str,
        services: &[ServiceSpec],
    ) -> Result<CreateOutcome> {
        estimate::create_estimate(&self.client, name, services).await
    }

    /// Load a stored estimate by id or shareable link.
    pub async fn load_estimate(&self, id_or_url: &str) -> Result<LoadedEstimate> {
        load::load_estimate(&self.client, id_or_url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn endpoints_for(server: &mockito::ServerGuard) -> Endpoints {
        let base = server.url();
        Endpoints {
            manifest_url: format!("{base}/manifest/en_US.json"),
            definition_base: format!("{base}/data"),
            pricing_base: format!("{base}/pricing"),
            save_url: format!("{base}/Prod/v2/saveAs"),
            load_base: base.clone(),
            ..Endpoints::default()
        }
    }

    #[tokio::test]
    async fn test_configure_merges_and_prices() {
        let mut server = mockito::Server::new_async().await;
        let _def = server
            .mock("GET", "/data/s3/en_US.json")
            .with_status(200)
            .with_body(
                json!({
                    "serviceName": "Amazon S3",
                    "templates": [{"id": "t1", "cards": [{
                        "inputSection": {"components": [
                            {"id": "storageGB", "type": "numericInput", "defaultValue": 10},
                            {"id": "unitPrice", "type": "singlePricePoint",
                             "mappingDefinitionName": "s3",
                             "meteredUnit": {"allRegions": "GB-Month"}}
                        ]},
                        "mathsSection": {"components": [
                            {"id": "cost", "type": "basicMaths", "operation": "multiplication",
                             "values": [{"variableId": "storageGB"}, {"variableId": "unitPrice"}]},
                            {"type": "priceDisplay", "subTotalRefer": "cost"}
                        ]}
                    }]}]
                })
                .to_string(),
            )
            .create_async()
            .await;
        let _pricing = server
            .mock("GET", "/pricing/s3/USD/current/s3.json")
            .with_status(200)
            .with_body(
                json!({"regions": {"US East (N. Virginia)": {"GB-Month": {"price": "0.023"}}}})
                    .to_string(),
            )
            .create_async()
            .await;

        let calc = Calculator::new(endpoints_for(&server));
        let mut inputs = Map::new();
        inputs.insert("storageGB".to_string(), json!(1000));
        let configured = calc
            .configure("s3", "us-east-1", &inputs)
            .await
            .expect("configure");

        assert_eq!(configured.service_name, "Amazon S3");
        assert_eq!(configured.region_name, "US East (N. Virginia)");
        assert!((configured.monthly_cost - 23.0).abs() < 1e-9);
        assert_eq!(configured.template_id.as_deref(), Some("t1"));
        assert_eq!(
            configured.calculation_components.get("storageGB"),
            Some(&json!({"value": 1000}))
        );
    }

    #[tokio::test]
    async fn test_schema_attaches_sub_service_placeholder_on_failure() {
        let mut server = mockito::Server::new_async().await;
        let _def = server
            .mock("GET", "/data/parent/en_US.json")
            .with_status(200)
            .with_body(
                json!({
                    "serviceName": "Parent",
                    "subServices": [{"serviceCode": "broken"}],
                    "templates": []
                })
                .to_string(),
            )
            .create_async()
            .await;
        let _sub = server
            .mock("GET", "/data/broken/en_US.json")
            .with_status(500)
            .create_async()
            .await;

        let calc = Calculator::new(endpoints_for(&server));
        let schema = calc.schema("parent").await.expect("schema");
        assert_eq!(schema.sub_services.len(), 1);
        assert_eq!(schema.sub_services[0].service_code, "broken");
        assert!(schema.sub_services[0].inputs.is_empty());
        assert!(!schema.sub_services[0].notes.is_empty());
    }

    #[tokio::test]
    async fn test_search_uses_cached_manifest() {
        let mut server = mockito::Server::new_async().await;
        let manifest = server
            .mock("GET", "/manifest/en_US.json")
            .with_status(200)
            .with_body(
                json!({"awsServices": [
                    {"name": "AWS Lambda", "serviceCode": "lambda",
                     "regions": ["us-east-1"], "searchKeywords": ["serverless"]}
                ]})
                .to_string(),
            )
            .expect(1)
            .create_async()
            .await;

        let calc = Calculator::new(endpoints_for(&server));
        assert_eq!(calc.search("lambda").await.expect("search").len(), 1);
        assert_eq!(calc.search("nothing-here").await.expect("search").len(), 0);
        manifest.assert_async().await;
    }
}
