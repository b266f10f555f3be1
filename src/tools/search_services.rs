//! Search Services Tool
//!
//! Keyword search over the AWS Pricing Calculator catalog. First stop for
//! an agent that only knows a service by its marketing name.

use super::error::Result;
use super::r#trait::{Tool, ToolResult};
use crate::calculator::Calculator;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

pub struct SearchServicesTool {
    calculator: Arc<Calculator>,
}

impl SearchServicesTool {
    pub fn new(calculator: Arc<Calculator>) -> Self {
        Self { calculator }
    }
}

#[async_trait]
impl Tool for SearchServicesTool {
    fn name(&self) -> &str {
        "search_services"
    }

    fn description(&self) -> &str {
        "Search the AWS Pricing Calculator catalog by keyword. Matches service \
         names, service codes, and search keywords (case-insensitive substring). \
         Returns up to 15 services with their serviceCode, the key every other \
         tool takes."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Keyword to search for, e.g. 'lambda' or 'object storage'"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, input: Value) -> Result<ToolResult> {
        let Some(query) = input.get("query").and_then(Value::as_str) else {
            return Ok(ToolResult::error("'query' is required".to_string()));
        };

        let hits = self.calculator.search(query).await?;
        if hits.is_empty() {
            return Ok(ToolResult::success(format!(
                "No services matched '{query}'."
            )));
        }

        let mut content = format!("{} service(s) matched '{query}':\n", hits.len());
        for hit in &hits {
            content.push_str(&format!(
                "- {} (serviceCode: {}, {} regions)\n",
                hit.name, hit.service_code, hit.region_count
            ));
        }
        let data = Value::Array(hits.iter().map(|h| h.to_json()).collect());
        Ok(ToolResult::with_data(content, data))
    }
}
