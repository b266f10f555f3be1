//! The agent-callable tool abstraction.
//!
//! Every tool advertises a JSON Schema for its arguments and returns a
//! `ToolResult`: human-readable text plus optional structured data. Failed
//! validation comes back as an error *result*, not an `Err`; protocol
//! errors are reserved for transport-level problems.

use super::error::Result;
use async_trait::async_trait;
use serde_json::Value;

#[async_trait]
pub trait Tool: Send + Sync {
    /// Stable tool name as exposed over the transport.
    fn name(&self) -> &str;

    /// What the tool does, written for the calling agent.
    fn description(&self) -> &str;

    /// JSON Schema for the `arguments` object.
    fn input_schema(&self) -> Value;

    /// Run the tool against already-parsed JSON arguments.
    async fn execute(&self, input: Value) -> Result<ToolResult>;
}

/// What a tool hands back: text for the agent, optional structured payload.
#[derive(Debug, Clone)]
pub struct ToolResult {
    pub success: bool,
    pub content: String,
    pub data: Option<Value>,
}

impl ToolResult {
    pub fn success(content: impl Into<String>) -> Self {
        Self {
            success: true,
            content: content.into(),
            data: None,
        }
    }

    pub fn with_data(content: impl Into<String>, data: Value) -> Self {
        Self {
            success: true,
            content: content.into(),
            data: Some(data),
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            success: false,
            content: content.into(),
            data: None,
        }
    }
}
