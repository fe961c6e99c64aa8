//! JSON-RPC 2.0 envelopes and session method names

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::codable::AnyCodable;
use crate::error::Error;

pub const JSONRPC_VERSION: &str = "2.0";

fn jsonrpc_version() -> String {
    JSONRPC_VERSION.to_string()
}

/// Methods exchanged between the two sides of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WcMethod {
    #[serde(rename = "wc_sessionPropose")]
    SessionPropose,
    #[serde(rename = "wc_sessionApprove")]
    SessionApprove,
    #[serde(rename = "wc_sessionReject")]
    SessionReject,
    #[serde(rename = "wc_sessionUpdate")]
    SessionUpdate,
    #[serde(rename = "wc_sessionUpgrade")]
    SessionUpgrade,
    #[serde(rename = "wc_sessionDelete")]
    SessionDelete,
    #[serde(rename = "wc_sessionPayload")]
    SessionPayload,
    #[serde(rename = "wc_sessionPing")]
    SessionPing,
    #[serde(rename = "wc_sessionNotification")]
    SessionNotification,
}

impl WcMethod {
    pub const ALL: [WcMethod; 9] = [
        Self::SessionPropose,
        Self::SessionApprove,
        Self::SessionReject,
        Self::SessionUpdate,
        Self::SessionUpgrade,
        Self::SessionDelete,
        Self::SessionPayload,
        Self::SessionPing,
        Self::SessionNotification,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SessionPropose => "wc_sessionPropose",
            Self::SessionApprove => "wc_sessionApprove",
            Self::SessionReject => "wc_sessionReject",
            Self::SessionUpdate => "wc_sessionUpdate",
            Self::SessionUpgrade => "wc_sessionUpgrade",
            Self::SessionDelete => "wc_sessionDelete",
            Self::SessionPayload => "wc_sessionPayload",
            Self::SessionPing => "wc_sessionPing",
            Self::SessionNotification => "wc_sessionNotification",
        }
    }
}

impl fmt::Display for WcMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WcMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|method| method.as_str() == s)
            .ok_or_else(|| Error::Decoding(format!("Unknown method: {}", s)))
    }
}

/// A JSON-RPC request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcRequest<T = AnyCodable> {
    pub id: i64,
    #[serde(default = "jsonrpc_version")]
    pub jsonrpc: String,
    pub method: String,
    pub params: T,
}

impl<T> JsonRpcRequest<T> {
    pub fn new(id: i64, method: impl Into<String>, params: T) -> Self {
        Self {
            id,
            jsonrpc: jsonrpc_version(),
            method: method.into(),
            params,
        }
    }
}

/// A successful JSON-RPC response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcResponse<T = AnyCodable> {
    pub id: i64,
    #[serde(default = "jsonrpc_version")]
    pub jsonrpc: String,
    pub result: T,
}

impl<T> JsonRpcResponse<T> {
    pub fn new(id: i64, result: T) -> Self {
        Self {
            id,
            jsonrpc: jsonrpc_version(),
            result,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonRpcErrorObject {
    pub code: i64,
    pub message: String,
}

/// A failed JSON-RPC response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonRpcErrorResponse {
    pub id: i64,
    #[serde(default = "jsonrpc_version")]
    pub jsonrpc: String,
    pub error: JsonRpcErrorObject,
}

impl JsonRpcErrorResponse {
    pub fn new(id: i64, code: i64, message: impl Into<String>) -> Self {
        Self {
            id,
            jsonrpc: jsonrpc_version(),
            error: JsonRpcErrorObject {
                code,
                message: message.into(),
            },
        }
    }
}

/// Either outcome of a request, as it appears on the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JsonRpcResult {
    Error(JsonRpcErrorResponse),
    Response(JsonRpcResponse),
}

impl JsonRpcResult {
    pub fn id(&self) -> i64 {
        match self {
            Self::Response(response) => response.id,
            Self::Error(error) => error.id,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

impl From<JsonRpcResponse> for JsonRpcResult {
    fn from(response: JsonRpcResponse) -> Self {
        Self::Response(response)
    }
}

impl From<JsonRpcErrorResponse> for JsonRpcResult {
    fn from(error: JsonRpcErrorResponse) -> Self {
        Self::Error(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_method_names() {
        assert_eq!(WcMethod::SessionPayload.to_string(), "wc_sessionPayload");
        assert_eq!("wc_sessionUpgrade".parse::<WcMethod>().unwrap(), WcMethod::SessionUpgrade);
        assert!("eth_sign".parse::<WcMethod>().is_err());
        for method in WcMethod::ALL {
            let encoded = serde_json::to_value(method).unwrap();
            assert_eq!(encoded, json!(method.as_str()));
        }
    }

    #[test]
    fn test_request_envelope() {
        let request = JsonRpcRequest::new(
            1,
            WcMethod::SessionPing.as_str(),
            AnyCodable::from(json!({})),
        );
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"id": 1, "jsonrpc": "2.0", "method": "wc_sessionPing", "params": {}})
        );
    }

    #[test]
    fn test_result_is_untagged() {
        let ok: JsonRpcResult =
            serde_json::from_value(json!({"id": 5, "jsonrpc": "2.0", "result": true})).unwrap();
        assert_eq!(ok.id(), 5);
        assert!(!ok.is_error());

        let err: JsonRpcResult = serde_json::from_value(json!({
            "id": 6,
            "jsonrpc": "2.0",
            "error": {"code": -32000, "message": "rejected"}
        }))
        .unwrap();
        assert_eq!(err.id(), 6);
        assert!(err.is_error());
    }
}
