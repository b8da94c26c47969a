//! Downstream user API collaborator.
//!
//! Handlers only see [`ApiClient`]; [`HttpApiClient`] is the production
//! implementation and tests substitute their own.

pub mod client;

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

pub use client::HttpApiClient;

/// Failure of an upstream call.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Connection refused, DNS failure, TLS error and the like.
    #[error("{0}")]
    Transport(String),

    #[error("upstream request timed out after {0:?}")]
    Timeout(Duration),

    /// Non-2xx answer. `message` is the `error` field of the body, if any.
    #[error("{}", .message.as_deref().unwrap_or("upstream returned an error status"))]
    Status { status: u16, message: Option<String> },

    #[error("invalid upstream response: {0}")]
    Decode(String),
}

/// Asynchronous access to the user API.
#[async_trait]
pub trait ApiClient: Send + Sync {
    /// `GET {base}{path}`, returning the decoded JSON body.
    async fn get(&self, path: &str) -> Result<Value, ApiError>;

    /// `POST {base}{path}` with a JSON body, returning the decoded JSON body.
    async fn post(&self, path: &str, body: &Value) -> Result<Value, ApiError>;
}
