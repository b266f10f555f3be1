//! Configure Service Tool
//!
//! Merges agent-supplied inputs with definition defaults and runs the
//! pricing evaluation for one service in one region, the same math the
//! official web UI performs.

use super::error::Result;
use super::r#trait::{Tool, ToolResult};
use crate::calculator::Calculator;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;

const DEFAULT_REGION: &str = "us-east-1";

pub struct ConfigureServiceTool {
    calculator: Arc<Calculator>,
}

impl ConfigureServiceTool {
    pub fn new(calculator: Arc<Calculator>) -> Self {
        Self { calculator }
    }
}

#[async_trait]
impl Tool for ConfigureServiceTool {
    fn name(&self) -> &str {
        "configure_service"
    }

    fn description(&self) -> &str {
        "Configure a service and compute its monthly and upfront cost. Inputs \
         are keyed by field id from get_service_schema; option labels are \
         accepted and resolved to canonical values; omitted fields use their \
         defaults. Returns the merged calculationComponents ready to pass to \
         create_estimate."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "serviceCode": {
                    "type": "string",
                    "description": "Service code from search_services"
                },
                "region": {
                    "type": "string",
                    "description": "AWS region code (default: us-east-1)",
                    "default": DEFAULT_REGION
                },
                "inputs": {
                    "type": "object",
                    "description": "Field id → value. Values may be scalars, \
                        option labels, or {value, unit} records for sized fields."
                }
            },
            "required": ["serviceCode"]
        })
    }

    async fn execute(&self, input: Value) -> Result<ToolResult> {
        let Some(service_code) = input.get("serviceCode").and_then(Value::as_str) else {
            return Ok(ToolResult::error("'serviceCode' is required".to_string()));
        };
        let region = input
            .get("region")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_REGION);
        let inputs: Map<String, Value> = match input.get("inputs") {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(map)) => map.clone(),
            Some(_) => {
                return Ok(ToolResult::error(
                    "'inputs' must be an object keyed by field id".to_string(),
                ));
            }
        };

        let configured = self
            .calculator
            .configure(service_code, region, &inputs)
            .await?;
        let content = format!(
            "{} in {}: ${:.2}/month, ${:.2} upfront",
            configured.service_name,
            configured.region_name,
            configured.monthly_cost,
            configured.upfront_cost
        );
        let data = serde_json::to_value(&configured)
            .map_err(|e| super::error::ToolError::Execution(e.to_string()))?;
        Ok(ToolResult::with_data(content, data))
    }
}
