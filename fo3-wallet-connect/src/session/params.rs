//! Wire payloads exchanged between the two sides of a session

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::types::{
    AppMetadata, BlockchainPermissions, JsonRpcPermissions, RelayProtocolOptions,
    SessionPermissions, SessionProposal, SessionState,
};
use crate::codable::AnyCodable;

/// `wc_sessionPropose` params
pub type ProposeParams = SessionProposal;

/// The answering side of an approval
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Responder {
    pub public_key: String,
    pub metadata: AppMetadata,
}

/// `wc_sessionApprove` params
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApproveParams {
    pub relay: RelayProtocolOptions,
    pub responder: Responder,
    /// Absolute expiry, unix seconds
    pub expiry: i64,
    pub state: SessionState,
}

/// Why a proposal was rejected or a session deleted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reason {
    pub code: i64,
    pub message: String,
}

impl Reason {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// `wc_sessionReject` params
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectParams {
    pub reason: Reason,
}

/// `wc_sessionDelete` params
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteParams {
    pub reason: Reason,
}

/// `wc_sessionUpdate` params
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateParams {
    pub state: SessionState,
}

impl UpdateParams {
    pub fn new(accounts: BTreeSet<String>) -> Self {
        Self {
            state: SessionState { accounts },
        }
    }
}

/// Scope carried by an upgrade: chains and methods only
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradePermissions {
    pub blockchain: BlockchainPermissions,
    pub jsonrpc: JsonRpcPermissions,
}

impl From<UpgradePermissions> for SessionPermissions {
    fn from(permissions: UpgradePermissions) -> Self {
        Self {
            blockchain: permissions.blockchain,
            jsonrpc: permissions.jsonrpc,
            notifications: None,
            controller: None,
        }
    }
}

/// `wc_sessionUpgrade` params
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradeParams {
    pub permissions: UpgradePermissions,
}

/// The wrapped call inside a session payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayloadRequest {
    pub method: String,
    pub params: AnyCodable,
}

/// `wc_sessionPayload` params: a generic RPC call on a settled session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayloadParams {
    pub request: PayloadRequest,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<String>,
}

impl PayloadParams {
    pub fn new(method: impl Into<String>, params: AnyCodable, chain_id: Option<String>) -> Self {
        Self {
            request: PayloadRequest {
                method: method.into(),
                params,
            },
            chain_id,
        }
    }
}

/// `wc_sessionNotification` params
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationParams {
    #[serde(rename = "type")]
    pub notification_type: String,
    pub data: AnyCodable,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_approve_wire_format() {
        let approve: ApproveParams = serde_json::from_value(json!({
            "relay": {"protocol": "waku"},
            "responder": {"publicKey": "ab12", "metadata": {"name": "FO3 Wallet"}},
            "expiry": 1700000000,
            "state": {"accounts": ["eip155:1:0xabc"]}
        }))
        .unwrap();

        assert_eq!(approve.responder.public_key, "ab12");
        assert_eq!(approve.responder.metadata.name.as_deref(), Some("FO3 Wallet"));
        assert!(approve.state.accounts.contains("eip155:1:0xabc"));
    }

    #[test]
    fn test_payload_wire_format() {
        let payload = PayloadParams::new(
            "eth_sign",
            AnyCodable::from(json!(["0xabc", "0xdeadbeef"])),
            Some("eip155:1".to_string()),
        );
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({
                "request": {"method": "eth_sign", "params": ["0xabc", "0xdeadbeef"]},
                "chainId": "eip155:1"
            })
        );

        let no_chain = PayloadParams::new("eth_accounts", AnyCodable::null(), None);
        assert!(serde_json::to_value(&no_chain).unwrap().get("chainId").is_none());
    }

    #[test]
    fn test_notification_and_delete_wire_format() {
        let notification: NotificationParams = serde_json::from_value(json!({
            "type": "chainChanged",
            "data": {"chainId": "eip155:10"}
        }))
        .unwrap();
        assert_eq!(notification.notification_type, "chainChanged");

        let delete = DeleteParams {
            reason: Reason::new(6000, "User disconnected"),
        };
        assert_eq!(
            serde_json::to_value(&delete).unwrap(),
            json!({"reason": {"code": 6000, "message": "User disconnected"}})
        );
    }

    #[test]
    fn test_upgrade_wire_format() {
        let upgrade: UpgradeParams = serde_json::from_value(json!({
            "permissions": {"blockchain": {"chains": ["eip155:137"]}, "jsonrpc": {"methods": []}}
        }))
        .unwrap();
        assert!(upgrade.permissions.blockchain.chains.contains("eip155:137"));
        assert!(upgrade.permissions.jsonrpc.methods.is_empty());
    }
}
