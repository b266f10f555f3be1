//! Get Service Schema Tool
//!
//! Surfaces a service's configurable inputs (ids, types, defaults,
//! options, units) so the agent knows what `configure_service` and
//! `create_estimate` will accept.

use super::error::Result;
use super::r#trait::{Tool, ToolResult};
use crate::calculator::Calculator;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

pub struct ServiceSchemaTool {
    calculator: Arc<Calculator>,
}

impl ServiceSchemaTool {
    pub fn new(calculator: Arc<Calculator>) -> Self {
        Self { calculator }
    }
}

#[async_trait]
impl Tool for ServiceSchemaTool {
    fn name(&self) -> &str {
        "get_service_schema"
    }

    fn description(&self) -> &str {
        "Fetch the configuration schema for one service by serviceCode. Lists \
         every input field with its type, default, options, and units, plus \
         template ids and sub-service schemas. Use the field ids as keys in \
         configure_service inputs and create_estimate calculationComponents."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "serviceCode": {
                    "type": "string",
                    "description": "Service code from search_services, e.g. 'lambda'"
                }
            },
            "required": ["serviceCode"]
        })
    }

    async fn execute(&self, input: Value) -> Result<ToolResult> {
        let Some(service_code) = input.get("serviceCode").and_then(Value::as_str) else {
            return Ok(ToolResult::error("'serviceCode' is required".to_string()));
        };

        let schema = self.calculator.schema(service_code).await?;
        let mut content = format!(
            "{} ({}): {} input field(s)",
            schema.service_name.as_deref().unwrap_or(service_code),
            service_code,
            schema.inputs.len()
        );
        if !schema.sub_services.is_empty() {
            content.push_str(&format!(", {} sub-service(s)", schema.sub_services.len()));
        }
        for note in &schema.notes {
            content.push_str(&format!("\nNote: {note}"));
        }
        let data = serde_json::to_value(&schema)
            .map_err(|e| super::error::ToolError::Execution(e.to_string()))?;
        Ok(ToolResult::with_data(content, data))
    }
}
