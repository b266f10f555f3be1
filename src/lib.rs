//! costcrab - AWS Pricing Calculator tools for AI agents
//!
//! Exposes the AWS Pricing Calculator's public data plane as five
//! agent-callable tools: search the service catalog, fetch a service's
//! configuration schema, configure a service and compute its cost, save a
//! multi-service estimate behind a shareable link, and load one back.
//!
//! ## Features
//!
//! - **Pricing engine:** the same schema extraction, value normalization,
//!   price-table lookup, and math evaluation the official web UI performs
//! - **Tool surface:** JSON-RPC 2.0 over stdio for agent runtimes, with an
//!   optional HTTP gateway
//! - **Process-lifetime caches:** manifest, definitions, and per-region
//!   price tables are fetched once
//! - **One-shot CLI:** every tool doubles as a shell command
//!
//! ## Quick Start
//!
//! ```bash
//! # Serve the stdio transport (what an agent runtime launches)
//! costcrab serve
//!
//! # One-shot: what would 10M Lambda requests cost?
//! costcrab configure lambda --input numberOfRequests=10000000
//!
//! # Save and share an estimate
//! costcrab estimate "My stack" --services @services.json
//! ```

pub mod calculator;
pub mod cli;
pub mod config;
pub mod logging;
pub mod rpc;
pub mod tools;
pub mod utils;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
