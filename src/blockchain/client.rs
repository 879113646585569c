//! Ledger RPC client with timeout, retry and error handling.
//!
//! # Responsibilities
//! - GET/POST JSON against the RPC endpoint
//! - Retry idempotent reads with the configured backoff
//! - Submit signed transactions exactly once
//! - Map response bodies onto typed results (balance, status, tx hash)

use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method};
use serde::Serialize;
use serde_json::Value;

use crate::blockchain::types::{Balance, ClientError, ClientResult, TxStatus};
use crate::config::{RetryConfig, RpcConfig};
use crate::observability::metrics;
use crate::resilience::{run_with_retries, Attempt, RetryFailure, RetryPolicy};

/// Longest response excerpt kept in an error message.
const ERROR_BODY_EXCERPT: usize = 200;

/// Stateless JSON-RPC client. Cheap to clone and safe to share across wallets.
#[derive(Clone)]
pub struct RpcClient {
    http: Client,
    /// Endpoint without trailing slash.
    endpoint: String,
    policy: RetryPolicy,
    timeout: Duration,
}

impl RpcClient {
    /// Create a client from configuration.
    pub fn new(rpc: &RpcConfig, retries: &RetryConfig) -> ClientResult<Self> {
        Self::with_policy(
            &rpc.endpoint,
            Duration::from_secs(rpc.timeout_secs),
            RetryPolicy::from(retries),
        )
    }

    /// Create a client with an explicit timeout and retry policy.
    pub fn with_policy(endpoint: &str, timeout: Duration, policy: RetryPolicy) -> ClientResult<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Http(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            policy,
            timeout,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Full URL for an endpoint path (`/balance/...`).
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.endpoint, path.trim_start_matches('/'))
    }

    /// GET `path` and parse the body as JSON, retrying transient failures.
    pub async fn get(&self, path: &str) -> ClientResult<Value> {
        self.send(Method::GET, path, None, &self.policy).await
    }

    /// POST an idempotent request (e.g. a view call), retrying transient failures.
    pub async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> ClientResult<Value> {
        let body = self.encode_body(path, body)?;
        self.send(Method::POST, path, Some(body), &self.policy).await
    }

    /// POST a state-changing request exactly once.
    ///
    /// A failure here must be answered by rebuilding with a fresh nonce,
    /// never by resending the same body.
    pub async fn submit<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> ClientResult<Value> {
        let body = self.encode_body(path, body)?;
        self.send(Method::POST, path, Some(body), &RetryPolicy::single_attempt())
            .await
    }

    /// Query balance and nonce of `address`.
    pub async fn balance(&self, address: &str) -> ClientResult<Balance> {
        let (url, body) = self.account(address).await?;
        parse_balance(&url, address, &body)
    }

    /// Current nonce of `address` (the nonce of its last applied transaction).
    ///
    /// Only `nonce` is read; an odd `balance_raw` does not block a call.
    pub async fn nonce(&self, address: &str) -> ClientResult<u64> {
        let (url, body) = self.account(address).await?;
        parse_nonce(&url, address, &body)
    }

    async fn account(&self, address: &str) -> ClientResult<(String, Value)> {
        let path = format!("/balance/{}", address);
        match self.get(&path).await {
            Ok(body) => Ok((self.url(&path), body)),
            Err(e) if e.http_status() == Some(404) => Err(ClientError::WalletNotFound {
                address: address.to_string(),
            }),
            Err(e) => Err(e),
        }
    }

    /// Status of a submitted transaction.
    pub async fn tx_status(&self, tx_hash: &str) -> ClientResult<TxStatus> {
        let path = format!("/tx/{}", tx_hash);
        match self.get(&path).await {
            Ok(body) => match body.get("status").and_then(Value::as_str) {
                Some(marker) => Ok(TxStatus::from_marker(marker)),
                None => Err(ClientError::MalformedResponse {
                    url: self.url(&path),
                    reason: "missing 'status' field".to_string(),
                }),
            },
            Err(e) if e.http_status() == Some(404) => Ok(TxStatus::NotFound),
            Err(e) => Err(e),
        }
    }

    fn encode_body<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> ClientResult<Vec<u8>> {
        serde_json::to_vec(body).map_err(|e| ClientError::Http(format!(
            "Failed to encode request body for {}: {}",
            self.url(path),
            e
        )))
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
        policy: &RetryPolicy,
    ) -> ClientResult<Value> {
        let url = self.url(path);
        let method_label = if method == Method::GET { "GET" } else { "POST" };

        let result = run_with_retries(policy, &url, |attempt| {
            let mut request = self.http.request(method.clone(), &url);
            if let Some(bytes) = &body {
                request = request
                    .header(CONTENT_TYPE, "application/json")
                    .body(bytes.clone());
            }
            let url = url.as_str();

            async move {
                if attempt > 1 {
                    metrics::record_rpc_retry(method_label);
                }
                tracing::debug!(method = method_label, url, attempt, "RPC request");

                let response = match request.send().await {
                    Ok(response) => response,
                    Err(e) => {
                        metrics::record_rpc_attempt(method_label, "network_error");
                        let message = if e.is_timeout() {
                            format!("timed out: {}", e)
                        } else {
                            e.to_string()
                        };
                        return Err(Attempt::network(message));
                    }
                };

                let status = response.status();
                if !status.is_success() {
                    metrics::record_rpc_attempt(method_label, "http_error");
                    let text = response.text().await.unwrap_or_default();
                    return Err(Attempt::Retry {
                        status: Some(status.as_u16()),
                        message: format!("HTTP {}: {}", status, excerpt(&text)),
                    });
                }

                let bytes = match response.bytes().await {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        metrics::record_rpc_attempt(method_label, "network_error");
                        return Err(Attempt::network(format!("failed to read body: {}", e)));
                    }
                };

                match serde_json::from_slice::<Value>(&bytes) {
                    Ok(value) => {
                        metrics::record_rpc_attempt(method_label, "ok");
                        Ok(value)
                    }
                    Err(e) => {
                        metrics::record_rpc_attempt(method_label, "malformed");
                        Err(Attempt::Abort(ClientError::MalformedResponse {
                            url: url.to_string(),
                            reason: format!(
                                "invalid JSON ({}): {}",
                                e,
                                excerpt(&String::from_utf8_lossy(&bytes))
                            ),
                        }))
                    }
                }
            }
        })
        .await;

        result.map_err(|failure| match failure {
            RetryFailure::Aborted(e) => e,
            RetryFailure::Exhausted {
                attempts,
                last_status,
                last_error,
            } => ClientError::RpcUnavailable {
                url,
                attempts,
                status: last_status,
                last_error,
            },
        })
    }
}

impl std::fmt::Debug for RpcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcClient")
            .field("endpoint", &self.endpoint)
            .field("timeout", &self.timeout)
            .field("max_attempts", &self.policy.max_attempts)
            .finish()
    }
}

/// Read `nonce` from a `/balance/{address}` body.
fn parse_nonce(url: &str, address: &str, body: &Value) -> ClientResult<u64> {
    match body.get("nonce") {
        Some(value) => value.as_u64().ok_or_else(|| ClientError::MalformedResponse {
            url: url.to_string(),
            reason: format!("'nonce' is not a non-negative integer: {}", value),
        }),
        None if body.get("error").is_some() => Err(ClientError::WalletNotFound {
            address: address.to_string(),
        }),
        None => Err(ClientError::MalformedResponse {
            url: url.to_string(),
            reason: "missing 'nonce' field".to_string(),
        }),
    }
}

/// Interpret a `/balance/{address}` body.
///
/// `balance_raw` may be an integer, a float or a decimal string; fractional
/// raw units are rounded.
fn parse_balance(url: &str, address: &str, body: &Value) -> ClientResult<Balance> {
    let nonce = parse_nonce(url, address, body)?;

    let raw = match body.get("balance_raw") {
        None | Some(Value::Null) => Some(0),
        Some(Value::String(s)) => raw_units_from_str(s.trim()),
        Some(Value::Number(n)) => match n.as_u64() {
            Some(units) => Some(u128::from(units)),
            None => n.as_f64().and_then(raw_units_from_f64),
        },
        Some(_) => None,
    };

    match raw {
        Some(raw) => Ok(Balance { nonce, raw }),
        None => Err(ClientError::MalformedResponse {
            url: url.to_string(),
            reason: format!(
                "'balance_raw' is not a non-negative number: {}",
                body.get("balance_raw").unwrap_or(&Value::Null)
            ),
        }),
    }
}

fn raw_units_from_str(s: &str) -> Option<u128> {
    match s.parse::<u128>() {
        Ok(units) => Some(units),
        Err(_) => s.parse::<f64>().ok().and_then(raw_units_from_f64),
    }
}

fn raw_units_from_f64(value: f64) -> Option<u128> {
    // `as` saturates, so anything past u128::MAX is still rejected here.
    if value.is_finite() && value >= 0.0 && value < u128::MAX as f64 {
        Some(value.round() as u128)
    } else {
        None
    }
}

fn excerpt(text: &str) -> String {
    if text.len() <= ERROR_BODY_EXCERPT {
        return text.to_string();
    }
    let mut end = ERROR_BODY_EXCERPT;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}
