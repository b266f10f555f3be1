//! Load Estimate Tool
//!
//! Fetches a previously saved estimate by id or shareable link and projects
//! a per-service summary alongside the raw stored document.

use super::error::Result;
use super::r#trait::{Tool, ToolResult};
use crate::calculator::Calculator;
use crate::calculator::error::CalcError;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

pub struct LoadEstimateTool {
    calculator: Arc<Calculator>,
}

impl LoadEstimateTool {
    pub fn new(calculator: Arc<Calculator>) -> Self {
        Self { calculator }
    }
}

#[async_trait]
impl Tool for LoadEstimateTool {
    fn name(&self) -> &str {
        "load_estimate"
    }

    fn description(&self) -> &str {
        "Load a saved estimate by id or shareable link \
         (https://calculator.aws/#/estimate?id=...). Returns the estimate's \
         name, totals, and a per-service breakdown, plus the full stored \
         document."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "estimateId": {
                    "type": "string",
                    "description": "Saved estimate id, or a full shareable link containing id=..."
                }
            },
            "required": ["estimateId"]
        })
    }

    async fn execute(&self, input: Value) -> Result<ToolResult> {
        let Some(estimate_id) = input.get("estimateId").and_then(Value::as_str) else {
            return Ok(ToolResult::error("'estimateId' is required".to_string()));
        };

        match self.calculator.load_estimate(estimate_id).await {
            Ok(loaded) => {
                let content = loaded.summary.human_text();
                let data = serde_json::to_value(&loaded)
                    .map_err(|e| super::error::ToolError::Execution(e.to_string()))?;
                Ok(ToolResult::with_data(content, data))
            }
            Err(err @ (CalcError::NotFound { .. } | CalcError::InvalidEstimateId { .. })) => {
                Ok(ToolResult::error(err.to_string()))
            }
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculator::fetch::Endpoints;

    #[tokio::test]
    async fn test_invalid_id_is_error_result() {
        let tool = LoadEstimateTool::new(Arc::new(Calculator::new(Endpoints::default())));
        let result = tool
            .execute(serde_json::json!({"estimateId": "not a valid id!"}))
            .await
            .expect("execute");
        assert!(!result.success);
        assert!(result.content.contains("not a valid id!"));
    }

    #[tokio::test]
    async fn test_load_summarizes_document() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/my-key")
            .with_status(200)
            .with_body(
                serde_json::json!({
                    "name": "Prod stack",
                    "totalCost": {"monthly": 42.0, "upfront": 0.0},
                    "services": {}
                })
                .to_string(),
            )
            .create_async()
            .await;

        let endpoints = Endpoints {
            load_base: server.url(),
            ..Endpoints::default()
        };
        let tool = LoadEstimateTool::new(Arc::new(Calculator::new(endpoints)));
        let result = tool
            .execute(serde_json::json!({"estimateId": "my-key"}))
            .await
            .expect("execute");
        assert!(result.success);
        assert!(result.content.contains("Prod stack"));
        let data = result.data.expect("data");
        assert_eq!(data["document"]["name"], "Prod stack");
    }
}
