//! Agent-callable tools.
//!
//! Five tools over one shared `Calculator`: catalog search, schema fetch,
//! configure-and-price, estimate save, estimate load. The transport layer
//! (`rpc`) only ever sees the `Tool` trait and the registry.

pub mod error;
mod configure_service;
mod create_estimate;
mod load_estimate;
mod registry;
mod search_services;
mod service_schema;
mod r#trait;

pub use configure_service::ConfigureServiceTool;
pub use create_estimate::CreateEstimateTool;
pub use error::{Result, ToolError};
pub use load_estimate::LoadEstimateTool;
pub use registry::ToolRegistry;
pub use search_services::SearchServicesTool;
pub use service_schema::ServiceSchemaTool;
pub use r#trait::{Tool, ToolResult};
