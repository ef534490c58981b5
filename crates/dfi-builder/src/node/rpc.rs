//! JSON-RPC request assembly and a [`NodeClient`] over any transport.
//!
//! Node methods take positional parameters, many of them optional. Typed
//! parameter structs list their fields in the node's order; absent
//! trailing fields are dropped, and an absent field followed by a present
//! one is sent as `null` so later values keep their position.

use serde::Serialize;
use serde_json::{json, Value};
use tracing::debug;

use dfi_transaction::FeeRate;

use super::{NodeClient, NodeError, UnspentOutput};

/// Methods whose parameters carry secrets and are never logged.
pub const SENSITIVE_METHODS: [&str; 2] = ["walletpassphrase", "signrawtransactionwithkey"];

/// A JSON-RPC 2.0 request.
#[derive(Debug, Clone, PartialEq)]
pub struct RpcRequest {
    method: String,
    params: Vec<Value>,
}

impl RpcRequest {
    pub fn new(method: impl Into<String>, params: Vec<Value>) -> Self {
        RpcRequest { method: method.into(), params }
    }

    /// A request whose params come from a typed parameter struct.
    pub fn with_params(method: impl Into<String>, params: &impl RpcParams) -> Self {
        Self::new(method, params.to_params())
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }

    pub fn is_sensitive(&self) -> bool {
        SENSITIVE_METHODS.contains(&self.method.as_str())
    }

    /// The request body.
    pub fn to_json(&self) -> Value {
        json!({ "method": self.method, "params": self.params, "jsonrpc": "2.0" })
    }

    /// The request body with secret params replaced by `***`.
    pub fn to_log_string(&self) -> String {
        if self.is_sensitive() {
            json!({ "method": self.method, "params": "***", "jsonrpc": "2.0" }).to_string()
        } else {
            self.to_json().to_string()
        }
    }
}

/// Sends a request and returns the `result` member of the response.
pub trait RpcTransport {
    fn call(&self, request: &RpcRequest) -> Result<Value, NodeError>;
}

/// Parameters that render to a positional JSON array.
pub trait RpcParams {
    fn to_params(&self) -> Vec<Value>;
}

/// Positional params from optional fields: interior gaps become `null`,
/// trailing gaps are dropped.
pub fn positional(fields: Vec<Option<Value>>) -> Vec<Value> {
    let len = fields.iter().rposition(Option::is_some).map_or(0, |i| i + 1);
    fields.into_iter().take(len).map(|f| f.unwrap_or(Value::Null)).collect()
}

fn to_value<T: Serialize>(value: &Option<T>) -> Option<Value> {
    value.as_ref().and_then(|v| serde_json::to_value(v).ok())
}

/// `queryOptions` for `listunspent`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListUnspentQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum_amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum_amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum_sum_amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_id: Option<String>,
}

/// `listunspent minconf maxconf addresses include_unsafe query_options`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListUnspentParams {
    pub minconf: Option<u32>,
    pub maxconf: Option<u32>,
    pub addresses: Option<Vec<String>>,
    pub include_unsafe: Option<bool>,
    pub query_options: Option<ListUnspentQuery>,
}

impl ListUnspentParams {
    /// Unspent DFI outputs of a single address.
    pub fn for_address(address: &str) -> Self {
        ListUnspentParams {
            addresses: Some(vec![address.to_string()]),
            query_options: Some(ListUnspentQuery {
                token_id: Some("0".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        }
    }
}

impl RpcParams for ListUnspentParams {
    fn to_params(&self) -> Vec<Value> {
        positional(vec![
            to_value(&self.minconf),
            to_value(&self.maxconf),
            to_value(&self.addresses),
            to_value(&self.include_unsafe),
            to_value(&self.query_options),
        ])
    }
}

/// `estimatesmartfee conf_target estimate_mode`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EstimateSmartFeeParams {
    pub conf_target: u32,
    pub estimate_mode: Option<String>,
}

impl RpcParams for EstimateSmartFeeParams {
    fn to_params(&self) -> Vec<Value> {
        positional(vec![Some(json!(self.conf_target)), to_value(&self.estimate_mode)])
    }
}

/// A [`NodeClient`] speaking JSON-RPC through `T`.
#[derive(Debug, Clone)]
pub struct RpcNode<T> {
    transport: T,
    conf_target: u32,
}

impl<T: RpcTransport> RpcNode<T> {
    pub fn new(transport: T) -> Self {
        RpcNode { transport, conf_target: 6 }
    }

    /// Confirmation target passed to `estimatesmartfee`.
    pub fn with_conf_target(mut self, conf_target: u32) -> Self {
        self.conf_target = conf_target;
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Send a request, logging it with secrets masked.
    pub fn call(&self, request: &RpcRequest) -> Result<Value, NodeError> {
        debug!(request = %request.to_log_string(), "rpc call");
        self.transport.call(request)
    }
}

impl<T: RpcTransport> NodeClient for RpcNode<T> {
    fn list_unspent(&self, address: &str) -> Result<Vec<UnspentOutput>, NodeError> {
        let request =
            RpcRequest::with_params("listunspent", &ListUnspentParams::for_address(address));
        let result = self.call(&request)?;
        serde_json::from_value(result).map_err(|e| NodeError::InvalidResponse(e.to_string()))
    }

    fn broadcast(&self, signed_hex: &str) -> Result<String, NodeError> {
        let request = RpcRequest::new("sendrawtransaction", vec![json!(signed_hex)]);
        match self.call(&request)? {
            Value::String(txid) => Ok(txid),
            other => Err(NodeError::InvalidResponse(format!("expected txid string, got {}", other))),
        }
    }

    fn estimate_fee_rate(&self) -> Result<Option<FeeRate>, NodeError> {
        let params = EstimateSmartFeeParams { conf_target: self.conf_target, estimate_mode: None };
        let result = self.call(&RpcRequest::with_params("estimatesmartfee", &params))?;
        // The node omits `feerate` when it has too little data.
        let Some(per_kb) = result.get("feerate").and_then(Value::as_f64) else {
            return Ok(None);
        };
        FeeRate::from_coin_per_kb(per_kb)
            .map(Some)
            .map_err(|e| NodeError::InvalidResponse(e.to_string()))
    }
}
