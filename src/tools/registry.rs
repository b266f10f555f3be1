//! Tool registry: name → tool lookup and transport-facing descriptors.

use super::configure_service::ConfigureServiceTool;
use super::create_estimate::CreateEstimateTool;
use super::load_estimate::LoadEstimateTool;
use super::search_services::SearchServicesTool;
use super::service_schema::ServiceSchemaTool;
use super::r#trait::Tool;
use crate::calculator::Calculator;
use serde_json::Value;
use std::sync::Arc;

pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// The full costcrab tool set over one shared calculator.
    pub fn with_calculator(calculator: Arc<Calculator>) -> Self {
        Self {
            tools: vec![
                Arc::new(SearchServicesTool::new(Arc::clone(&calculator))),
                Arc::new(ServiceSchemaTool::new(Arc::clone(&calculator))),
                Arc::new(ConfigureServiceTool::new(Arc::clone(&calculator))),
                Arc::new(CreateEstimateTool::new(Arc::clone(&calculator))),
                Arc::new(LoadEstimateTool::new(calculator)),
            ],
        }
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.iter().find(|tool| tool.name() == name)
    }

    pub fn tools(&self) -> &[Arc<dyn Tool>] {
        &self.tools
    }

    /// The `tools/list` payload: `{name, description, inputSchema}` per tool.
    pub fn descriptors(&self) -> Value {
        Value::Array(
            self.tools
                .iter()
                .map(|tool| {
                    serde_json::json!({
                        "name": tool.name(),
                        "description": tool.description(),
                        "inputSchema": tool.input_schema(),
                    })
                })
                .collect(),
        )
    }
}
