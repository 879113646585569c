//! Read-only contract calls.

use serde::Serialize;
use serde_json::Value;

use crate::blockchain::client::RpcClient;
use crate::blockchain::types::ClientResult;

/// Body of `POST /contract/call-view`.
#[derive(Debug, Clone, Serialize)]
pub struct ViewRequest<'a> {
    pub contract: &'a str,
    pub method: &'a str,
    pub params: &'a [String],
    pub caller: &'a str,
}

/// Invokes view methods. No signature is involved.
#[derive(Debug, Clone)]
pub struct ViewCaller {
    client: RpcClient,
}

impl ViewCaller {
    pub fn new(client: RpcClient) -> Self {
        Self { client }
    }

    /// Call a view method. `Ok(None)` when the ledger reports anything
    /// other than success.
    pub async fn call(
        &self,
        contract: &str,
        method: &str,
        params: &[String],
        caller: &str,
    ) -> ClientResult<Option<String>> {
        let request = ViewRequest {
            contract,
            method,
            params,
            caller,
        };
        let response = self.client.post("/contract/call-view", &request).await?;
        Ok(view_result(&response))
    }
}

/// Extract `result` from a view response whose `status` is `"success"`.
pub fn view_result(response: &Value) -> Option<String> {
    if response.get("status").and_then(Value::as_str) != Some("success") {
        return None;
    }
    match response.get("result")? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
