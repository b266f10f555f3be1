//! Transports for the tool surface.
//!
//! Primary: newline-delimited JSON-RPC 2.0 over stdin/stdout, the framing
//! agent runtimes speak. Logging goes to stderr in this mode; stdout carries
//! protocol frames only.
//!
//! Secondary: an axum HTTP gateway (off by default) serving the same
//! dispatch at `POST /rpc/v1`, with optional bearer-token auth and CORS.

use crate::config::GatewayConfig;
use crate::rpc::{handler, types::*};
use crate::tools::ToolRegistry;
use axum::{
    Router,
    extract::State,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Json},
    routing::{get, post},
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tower_http::cors::{AllowOrigin, CorsLayer};

/// Serve JSON-RPC over stdin/stdout until EOF.
pub async fn run_stdio(registry: Arc<ToolRegistry>) -> anyhow::Result<()> {
    let stdin = tokio::io::stdin();
    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(stdin).lines();

    tracing::info!("stdio transport ready ({} tools)", registry.tools().len());
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<JsonRpcRequest>(line) {
            Ok(req) if req.is_notification() => {
                tracing::debug!("notification: {}", req.method);
                continue;
            }
            Ok(req) => handler::dispatch(req, Arc::clone(&registry)).await,
            Err(err) => JsonRpcResponse::error(
                serde_json::Value::Null,
                error_codes::PARSE_ERROR,
                format!("Parse error: {err}"),
            ),
        };

        let mut frame = serde_json::to_string(&response)?;
        frame.push('\n');
        stdout.write_all(frame.as_bytes()).await?;
        stdout.flush().await?;
    }
    tracing::info!("stdin closed, shutting down");
    Ok(())
}

/// Shared state for the HTTP gateway.
#[derive(Clone)]
pub struct RpcState {
    pub registry: Arc<ToolRegistry>,
    pub api_key: Option<String>,
}

/// Bearer token auth middleware. Skipped when no api_key is configured.
async fn require_bearer(
    State(state): State<RpcState>,
    req: axum::http::Request<axum::body::Body>,
    next: middleware::Next,
) -> axum::response::Response {
    let Some(ref expected) = state.api_key else {
        return next.run(req).await;
    };

    let authorized = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .is_some_and(|token| token == expected);

    if authorized {
        next.run(req).await
    } else {
        let body = serde_json::json!({
            "jsonrpc": "2.0",
            "error": { "code": -32001, "message": "Unauthorized: invalid or missing Bearer token" },
            "id": null
        });
        (StatusCode::UNAUTHORIZED, Json(body)).into_response()
    }
}

/// Build the axum router for the HTTP gateway.
pub fn build_router(state: RpcState, allowed_origins: &[String]) -> Router {
    let cors = if allowed_origins.is_empty() {
        CorsLayer::new()
    } else {
        let origins: Vec<_> = allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new().allow_origin(AllowOrigin::list(origins))
    };

    let protected = Router::new()
        .route("/rpc/v1", post(handle_jsonrpc))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_bearer,
        ));

    Router::new()
        .route("/rpc/health", get(health_check))
        .merge(protected)
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP gateway and serve until the process exits.
pub async fn start_gateway(
    config: &GatewayConfig,
    registry: Arc<ToolRegistry>,
) -> anyhow::Result<()> {
    let state = RpcState {
        registry,
        api_key: config.api_key.clone(),
    };
    let app = build_router(state, &config.allowed_origins);
    let addr: SocketAddr = format!("{}:{}", config.bind, config.port)
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid gateway address: {}", e))?;

    tracing::info!("RPC gateway starting on http://{}", addr);
    tracing::info!("   JSON-RPC: http://{}/rpc/v1", addr);
    tracing::info!("   Health:   http://{}/rpc/health", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

/// POST /rpc/v1 -- JSON-RPC 2.0 endpoint.
async fn handle_jsonrpc(
    State(state): State<RpcState>,
    Json(req): Json<JsonRpcRequest>,
) -> axum::response::Response {
    if req.jsonrpc != "2.0" {
        return (
            StatusCode::OK,
            Json(JsonRpcResponse::error(
                req.id,
                error_codes::INVALID_REQUEST,
                "Invalid JSON-RPC version, expected 2.0",
            )),
        )
            .into_response();
    }
    let response = handler::dispatch(req, state.registry).await;
    (StatusCode::OK, Json(response)).into_response()
}

/// GET /rpc/health -- Health check.
async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": crate::VERSION,
        "protocol": "JSON-RPC",
        "tools": 5,
    }))
}
