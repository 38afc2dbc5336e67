//! JSON-RPC probe of the active network's endpoint
//!
//! Confirms that a resolved config points where it claims to: the remote
//! chain id matches the configured one, and a fork block is not ahead of
//! the fork source's head.

use crate::config::Config;
use crate::network::{mask_url, NetworkKind};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum RpcError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("RPC error {code}: {message}")]
    Remote { code: i64, message: String },

    #[error("RPC response to {0} carried no result")]
    MissingResult(String),

    #[error("Invalid hex quantity: {0}")]
    InvalidQuantity(String),

    #[error("Cannot probe {0} over HTTP")]
    UnsupportedScheme(String),
}

#[derive(Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: &'a [Value],
}

#[derive(Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

#[derive(Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

impl RpcResponse {
    fn into_result(self, method: &str) -> Result<Value, RpcError> {
        if let Some(error) = self.error {
            return Err(RpcError::Remote {
                code: error.code,
                message: error.message,
            });
        }
        self.result
            .ok_or_else(|| RpcError::MissingResult(method.to_string()))
    }
}

/// Decode an Ethereum hex quantity such as `0x1`
pub fn parse_quantity(value: &str) -> Result<u64, RpcError> {
    let digits = value
        .strip_prefix("0x")
        .filter(|d| !d.is_empty())
        .ok_or_else(|| RpcError::InvalidQuantity(value.to_string()))?;
    u64::from_str_radix(digits, 16).map_err(|_| RpcError::InvalidQuantity(value.to_string()))
}

/// Minimal HTTP JSON-RPC client
pub struct RpcClient {
    http: reqwest::Client,
    url: String,
    next_id: AtomicU64,
}

impl RpcClient {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, RpcError> {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(RpcError::UnsupportedScheme(mask_url(url)));
        }
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(RpcClient {
            http,
            url: url.to_string(),
            next_id: AtomicU64::new(1),
        })
    }

    async fn call(&self, method: &str, params: &[Value]) -> Result<Value, RpcError> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };
        debug!(method, endpoint = %mask_url(&self.url), "sending RPC request");

        let response: RpcResponse = self
            .http
            .post(&self.url)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        response.into_result(method)
    }

    async fn quantity(&self, method: &str) -> Result<u64, RpcError> {
        match self.call(method, &[]).await? {
            Value::String(s) => parse_quantity(&s),
            other => Err(RpcError::InvalidQuantity(other.to_string())),
        }
    }

    pub async fn chain_id(&self) -> Result<u64, RpcError> {
        self.quantity("eth_chainId").await
    }

    pub async fn block_number(&self) -> Result<u64, RpcError> {
        self.quantity("eth_blockNumber").await
    }
}

/// Outcome of [`probe`]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeReport {
    pub network: String,
    /// Masked endpoint that was queried
    pub endpoint: String,
    pub remote_chain_id: u64,
    pub head_block: u64,
    /// Disagreements between the config and the endpoint
    pub problems: Vec<String>,
}

impl ProbeReport {
    pub fn is_ok(&self) -> bool {
        self.problems.is_empty()
    }
}

/// Compare what the endpoint reports with the config
pub fn check_consistency(config: &Config, remote_chain_id: u64, head_block: u64) -> Vec<String> {
    let mut problems = Vec::new();
    let network = &config.network;

    match network.kind {
        NetworkKind::Remote => {
            if let Some(expected) = network.chain_id {
                if expected != remote_chain_id {
                    problems.push(format!(
                        "network '{}' expects chain id {}, endpoint reports {}",
                        network.name, expected, remote_chain_id
                    ));
                }
            }
        }
        NetworkKind::Local => {
            if let Some(block) = network.fork.as_ref().and_then(|f| f.block_number) {
                if block > head_block {
                    problems.push(format!(
                        "fork block {} is ahead of the fork source head {}",
                        block, head_block
                    ));
                }
            }
        }
    }

    problems
}

/// Query the active network's endpoint.
///
/// Returns `None` when there is nothing to query: the local network
/// without a fork.
pub async fn probe(config: &Config) -> Result<Option<ProbeReport>, RpcError> {
    let Some(endpoint) = config.network.endpoint() else {
        info!(network = %config.network.name, "no endpoint to probe");
        return Ok(None);
    };

    let client = RpcClient::new(endpoint, config.network.timeout)?;
    let (remote_chain_id, head_block) = tokio::try_join!(client.chain_id(), client.block_number())?;

    let problems = check_consistency(config, remote_chain_id, head_block);
    info!(
        network = %config.network.name,
        remote_chain_id,
        head_block,
        problems = problems.len(),
        "probe finished"
    );

    Ok(Some(ProbeReport {
        network: config.network.name.clone(),
        endpoint: mask_url(endpoint),
        remote_chain_id,
        head_block,
        problems,
    }))
}
