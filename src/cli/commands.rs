//! One-shot command implementations.

use crate::calculator::Calculator;
use crate::calculator::estimate::ServiceSpec;
use crate::config::Config;
use crate::rpc::server;
use crate::tools::ToolRegistry;
use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::sync::Arc;

pub fn load_config(path: Option<&str>) -> Result<Config> {
    match path {
        Some(path) => Config::load_from_path(path),
        None => Config::load(),
    }
}

fn calculator(config: &Config) -> Arc<Calculator> {
    Arc::new(Calculator::new(config.endpoints()))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Serve JSON-RPC over stdio (the default command).
pub async fn cmd_serve(config: &Config) -> Result<()> {
    let registry = Arc::new(ToolRegistry::with_calculator(calculator(config)));
    server::run_stdio(registry).await
}

/// Serve JSON-RPC over HTTP.
pub async fn cmd_gateway(
    config: &Config,
    bind: Option<String>,
    port: Option<u16>,
) -> Result<()> {
    let mut gateway = config.gateway.clone();
    if let Some(bind) = bind {
        gateway.bind = bind;
    }
    if let Some(port) = port {
        gateway.port = port;
    }
    let registry = Arc::new(ToolRegistry::with_calculator(calculator(config)));
    server::start_gateway(&gateway, registry).await
}

pub async fn cmd_search(config: &Config, query: &str) -> Result<()> {
    let hits = calculator(config).search(query).await?;
    print_json(&hits)
}

pub async fn cmd_schema(config: &Config, service_code: &str) -> Result<()> {
    let schema = calculator(config).schema(service_code).await?;
    print_json(&schema)
}

/// Parse `key=value` pairs; values that parse as JSON stay typed, the rest
/// are strings.
fn parse_inputs(pairs: &[String]) -> Result<Map<String, Value>> {
    let mut inputs = Map::new();
    for pair in pairs {
        let (key, raw) = pair
            .split_once('=')
            .with_context(|| format!("input '{pair}' is not key=value"))?;
        let value = serde_json::from_str(raw).unwrap_or(Value::String(raw.to_string()));
        inputs.insert(key.to_string(), value);
    }
    Ok(inputs)
}

pub async fn cmd_configure(
    config: &Config,
    service_code: &str,
    region: Option<&str>,
    input_pairs: &[String],
) -> Result<()> {
    let inputs = parse_inputs(input_pairs)?;
    let region = region.unwrap_or(&config.defaults.region);
    let configured = calculator(config)
        .configure(service_code, region, &inputs)
        .await?;
    print_json(&configured)
}

pub async fn cmd_estimate(config: &Config, name: &str, services: &str) -> Result<()> {
    let raw = match services.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read services file: {path}"))?,
        None => services.to_string(),
    };
    let specs: Vec<ServiceSpec> =
        serde_json::from_str(&raw).context("services must be a JSON array of service specs")?;
    let outcome = calculator(config).create_estimate(name, &specs).await?;
    print_json(&outcome)
}

pub async fn cmd_load(config: &Config, estimate_id: &str) -> Result<()> {
    let loaded = calculator(config).load_estimate(estimate_id).await?;
    eprintln!("{}", loaded.summary.human_text());
    print_json(&loaded)
}

pub fn cmd_config(config: &Config) -> Result<()> {
    println!("{}", toml::to_string_pretty(config)?);
    Ok(())
}
