//! JSON-RPC method dispatch for the tool transport.
//!
//! Methods:
//! - `initialize` → server identity and capabilities
//! - `ping`       → liveness
//! - `tools/list` → tool descriptors with input schemas
//! - `tools/call` → run one tool; tool failures come back as results with
//!   `isError`, protocol failures as JSON-RPC errors

use crate::rpc::types::*;
use crate::tools::{ToolError, ToolRegistry};
use serde_json::{Value, json};
use std::sync::Arc;

/// Wire protocol revision advertised by `initialize`.
pub const PROTOCOL_VERSION: &str = "2025-06-18";

/// Dispatch a JSON-RPC request to the appropriate handler.
pub async fn dispatch(req: JsonRpcRequest, registry: Arc<ToolRegistry>) -> JsonRpcResponse {
    match req.method.as_str() {
        "initialize" => JsonRpcResponse::success(
            req.id,
            json!({
                "protocolVersion": PROTOCOL_VERSION,
                "serverInfo": {
                    "name": "costcrab",
                    "version": crate::VERSION,
                },
                "capabilities": {"tools": {}},
            }),
        ),
        "ping" => JsonRpcResponse::success(req.id, json!({})),
        "tools/list" => {
            JsonRpcResponse::success(req.id, json!({"tools": registry.descriptors()}))
        }
        "tools/call" => handle_tool_call(req.id, req.params, registry).await,
        _ => JsonRpcResponse::error(
            req.id,
            error_codes::METHOD_NOT_FOUND,
            format!("Method not found: {}", req.method),
        ),
    }
}

async fn handle_tool_call(
    id: Value,
    params: Value,
    registry: Arc<ToolRegistry>,
) -> JsonRpcResponse {
    let Some(name) = params.get("name").and_then(Value::as_str) else {
        return JsonRpcResponse::error(
            id,
            error_codes::INVALID_PARAMS,
            "tools/call requires a 'name' parameter",
        );
    };
    let Some(tool) = registry.get(name) else {
        return JsonRpcResponse::error(
            id,
            error_codes::INVALID_PARAMS,
            format!("Unknown tool: {name}"),
        );
    };
    let arguments = params.get("arguments").cloned().unwrap_or(json!({}));

    tracing::info!("tools/call {}", name);
    match tool.execute(arguments).await {
        Ok(result) => {
            let mut payload = json!({
                "content": [{"type": "text", "text": result.content}],
                "isError": !result.success,
            });
            if let Some(data) = result.data {
                payload["structuredContent"] = data;
            }
            JsonRpcResponse::success(id, payload)
        }
        Err(ToolError::InvalidInput(message)) => {
            JsonRpcResponse::error(id, error_codes::INVALID_PARAMS, message)
        }
        Err(err) => {
            tracing::error!("tool '{}' failed: {}", name, err);
            JsonRpcResponse::success(
                id,
                json!({
                    "content": [{"type": "text", "text": err.to_string()}],
                    "isError": true,
                }),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculator::Calculator;
    use crate::calculator::fetch::Endpoints;

    fn registry() -> Arc<ToolRegistry> {
        Arc::new(ToolRegistry::with_calculator(Arc::new(Calculator::new(
            Endpoints::default(),
        ))))
    }

    fn request(method: &str, params: Value) -> JsonRpcRequest {
        JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            method: method.to_string(),
            params,
            id: json!(1),
        }
    }

    #[tokio::test]
    async fn test_initialize() {
        let resp = dispatch(request("initialize", json!({})), registry()).await;
        let result = resp.result.expect("result");
        assert_eq!(result["serverInfo"]["name"], "costcrab");
        assert_eq!(result["protocolVersion"], PROTOCOL_VERSION);
    }

    #[tokio::test]
    async fn test_tools_list() {
        let resp = dispatch(request("tools/list", json!({})), registry()).await;
        let tools = resp.result.expect("result")["tools"]
            .as_array()
            .expect("array")
            .len();
        assert_eq!(tools, 5);
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let resp = dispatch(request("unknown/method", json!({})), registry()).await;
        assert_eq!(resp.error.expect("error").code, -32601);
    }

    #[tokio::test]
    async fn test_tool_call_unknown_tool() {
        let resp = dispatch(
            request("tools/call", json!({"name": "no_such_tool"})),
            registry(),
        )
        .await;
        assert_eq!(resp.error.expect("error").code, -32602);
    }

    #[tokio::test]
    async fn test_tool_call_missing_name() {
        let resp = dispatch(request("tools/call", json!({})), registry()).await;
        assert_eq!(resp.error.expect("error").code, -32602);
    }

    #[tokio::test]
    async fn test_tool_call_validation_is_error_result() {
        // search_services without a query: the tool answers with isError,
        // not a protocol error.
        let resp = dispatch(
            request(
                "tools/call",
                json!({"name": "search_services", "arguments": {}}),
            ),
            registry(),
        )
        .await;
        let result = resp.result.expect("result");
        assert_eq!(result["isError"], true);
    }

    #[tokio::test]
    async fn test_ping() {
        let resp = dispatch(request("ping", json!({})), registry()).await;
        assert!(resp.error.is_none());
    }
}
