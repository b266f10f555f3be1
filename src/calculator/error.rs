//! Error taxonomy for the pricing engine.
//!
//! Remote failures are typed so callers can tell transport problems apart
//! from store-level outcomes (missing estimate, rejected save, malformed
//! save response). Pricing lookups never fail; a missing table or metered
//! unit reads as zero (see `pricing`).

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CalcError>;

#[derive(Debug, Error)]
pub enum CalcError {
    /// Non-2xx response from a GET against the calculator data plane.
    #[error("GET {url} returned status {status}")]
    Fetch { url: String, status: u16 },

    /// The request never produced a response (DNS, TLS, connect, timeout).
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    /// A 2xx response whose body was not the JSON we expected.
    #[error("invalid JSON from {url}: {message}")]
    Decode { url: String, message: String },

    /// The load store answered with an error page (XML body or 4xx):
    /// the estimate does not exist or is not public.
    #[error("estimate '{id}' was not found (the store returned an error page)")]
    NotFound { id: String },

    /// The supplied estimate identifier could not be parsed out of the input.
    #[error("'{input}' does not contain an estimate id")]
    InvalidEstimateId { input: String },

    /// Both the initial save POST and the stripped retry failed.
    #[error(
        "estimate save failed twice: first attempt {first_status}: {first_body}; retry {retry_status}: {retry_body}"
    )]
    Save {
        first_status: u16,
        first_body: String,
        retry_status: u16,
        retry_body: String,
    },

    /// The save store answered 2xx but the envelope was not
    /// `{statusCode: 201, body: "{\"savedKey\": …}"}`.
    #[error("unexpected save response: {0}")]
    ResponseShape(String),
}

impl CalcError {
    /// Wrap a reqwest error that occurred while talking to `url`.
    pub fn transport(url: impl Into<String>, err: &reqwest::Error) -> Self {
        Self::Transport {
            url: url.into(),
            message: err.to_string(),
        }
    }

    /// Wrap a JSON decoding failure for a body fetched from `url`.
    pub fn decode(url: impl Into<String>, err: &serde_json::Error) -> Self {
        Self::Decode {
            url: url.into(),
            message: err.to_string(),
        }
    }
}
