//! Create Estimate Tool
//!
//! Persists a named multi-service estimate to the calculator's save store
//! and returns the public shareable link. Services with a zero monthlyCost
//! are auto-priced through the evaluator before saving.

use super::error::Result;
use super::r#trait::{Tool, ToolResult};
use crate::calculator::Calculator;
use crate::calculator::estimate::ServiceSpec;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

pub struct CreateEstimateTool {
    calculator: Arc<Calculator>,
}

impl CreateEstimateTool {
    pub fn new(calculator: Arc<Calculator>) -> Self {
        Self { calculator }
    }
}

#[async_trait]
impl Tool for CreateEstimateTool {
    fn name(&self) -> &str {
        "create_estimate"
    }

    fn description(&self) -> &str {
        "Save a named estimate containing one or more configured services and \
         get back a shareable calculator.aws link. Pass each service's \
         calculationComponents from configure_service (or raw inputs; labels \
         resolve and defaults fill in). Services may carry a 'group' name to be \
         bundled together. A zero monthlyCost is computed automatically."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "name": {
                    "type": "string",
                    "description": "Estimate name shown in the calculator UI"
                },
                "services": {
                    "type": "array",
                    "description": "Services to include",
                    "items": {
                        "type": "object",
                        "properties": {
                            "serviceCode": {"type": "string"},
                            "region": {"type": "string", "default": "us-east-1"},
                            "regionName": {"type": "string"},
                            "serviceName": {"type": "string"},
                            "description": {"type": "string"},
                            "monthlyCost": {"type": "number", "default": 0},
                            "upfrontCost": {"type": "number", "default": 0},
                            "configSummary": {"type": "string"},
                            "calculationComponents": {"type": "object"},
                            "templateId": {"type": "string"},
                            "group": {"type": "string"}
                        },
                        "required": ["serviceCode"]
                    }
                }
            },
            "required": ["name", "services"]
        })
    }

    async fn execute(&self, input: Value) -> Result<ToolResult> {
        let Some(name) = input.get("name").and_then(Value::as_str) else {
            return Ok(ToolResult::error("'name' is required".to_string()));
        };
        let Some(raw_services) = input.get("services").and_then(Value::as_array) else {
            return Ok(ToolResult::error(
                "'services' is required and must be an array".to_string(),
            ));
        };
        if raw_services.is_empty() {
            return Ok(ToolResult::error(
                "'services' must contain at least one service".to_string(),
            ));
        }

        let mut specs = Vec::with_capacity(raw_services.len());
        for (index, raw) in raw_services.iter().enumerate() {
            match serde_json::from_value::<ServiceSpec>(raw.clone()) {
                Ok(spec) if !spec.service_code.is_empty() => specs.push(spec),
                Ok(_) => {
                    return Ok(ToolResult::error(format!(
                        "services[{index}] is missing serviceCode"
                    )));
                }
                Err(err) => {
                    return Ok(ToolResult::error(format!(
                        "services[{index}] is malformed: {err}"
                    )));
                }
            }
        }

        let outcome = self.calculator.create_estimate(name, &specs).await?;
        let mut content = format!(
            "Estimate \"{}\" saved: {}\nTotal: ${:.2}/month, ${:.2} upfront",
            name, outcome.url, outcome.total_cost.monthly, outcome.total_cost.upfront
        );
        for warning in &outcome.warnings {
            content.push_str(&format!("\nWarning: {warning}"));
        }
        let data = serde_json::to_value(&outcome)
            .map_err(|e| super::error::ToolError::Execution(e.to_string()))?;
        Ok(ToolResult::with_data(content, data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculator::fetch::Endpoints;

    #[tokio::test]
    async fn test_validation_errors() {
        let tool = CreateEstimateTool::new(Arc::new(Calculator::new(Endpoints::default())));

        let result = tool
            .execute(serde_json::json!({"services": []}))
            .await
            .expect("execute");
        assert!(!result.success);

        let result = tool
            .execute(serde_json::json!({"name": "x", "services": []}))
            .await
            .expect("execute");
        assert!(!result.success);

        let result = tool
            .execute(serde_json::json!({"name": "x", "services": [{"region": "us-east-1"}]}))
            .await
            .expect("execute");
        assert!(!result.success);
        assert!(result.content.contains("serviceCode"));
    }

    #[tokio::test]
    async fn test_create_reports_link_and_warnings() {
        let mut server = mockito::Server::new_async().await;
        let _def = server
            .mock("GET", "/data/svc/en_US.json")
            .with_status(404)
            .create_async()
            .await;
        let _save = server
            .mock("POST", "/Prod/v2/saveAs")
            .with_status(200)
            .with_body(
                serde_json::json!({
                    "statusCode": 201,
                    "body": "{\"savedKey\": \"key-9\"}"
                })
                .to_string(),
            )
            .create_async()
            .await;

        let base = server.url();
        let endpoints = Endpoints {
            definition_base: format!("{base}/data"),
            save_url: format!("{base}/Prod/v2/saveAs"),
            ..Endpoints::default()
        };
        let tool = CreateEstimateTool::new(Arc::new(Calculator::new(endpoints)));
        let result = tool
            .execute(serde_json::json!({
                "name": "Test",
                "services": [{"serviceCode": "svc", "monthlyCost": 9.5}]
            }))
            .await
            .expect("execute");
        assert!(result.success);
        assert!(result.content.contains("id=key-9"));
        let data = result.data.expect("data");
        assert_eq!(data["savedKey"], "key-9");
    }
}
